// ==========================================
// 运行编排器端到端测试
// ==========================================
// 测试目标: 状态机走全、任务隔离、优先级覆盖、
//           试运行与中止语义
// ==========================================


use std::sync::atomic::Ordering;
use std::sync::Arc;
use stock_sync::{
    logging, BaselineStore, JobKind, JobOrchestrator, JobStatus, RunOptions, RunState,
};
use tempfile::TempDir;
use test_helpers::{count_backups, mapping, platform, supplier, sync_config, write_baseline, MockTransport};

fn default_options() -> RunOptions {
    RunOptions::default()
}

#[tokio::test]
async fn test_full_run_applies_priority_override_end_to_end() {
    logging::init_test();

    // B 在前（低优先级）报 9,A 在后（高优先级）报 5 → 平台写 5
    let transport = Arc::new(
        MockTransport::new()
            .with_file("sup_b/stock.csv", b"ID,Stock\n123,9\n")
            .with_file("sup_a/stock.csv", b"SKU,Qty\n123,5\n"),
    );

    let dir = TempDir::new().unwrap();
    write_baseline(
        dir.path(),
        "PLATFORM_A",
        "products.csv",
        b"id,qty,name\n123,9,Widget\n999,2,Gadget\n",
    );

    let config = sync_config(
        vec![
            supplier("FOURNISSEUR_B", "sup_b/stock.csv", mapping("ID", &[], "Stock", &[])),
            supplier("FOURNISSEUR_A", "sup_a/stock.csv", mapping("SKU", &[], "Qty", &[])),
        ],
        vec![platform(
            "PLATFORM_A",
            "platform_a/products.csv",
            mapping("id", &[], "qty", &[]),
        )],
    );

    let baselines = Arc::new(BaselineStore::new(dir.path()));
    let orchestrator =
        JobOrchestrator::new(config, transport.clone(), baselines.clone(), default_options());

    let report = orchestrator.run().await;

    assert_eq!(report.state, RunState::Completed);
    assert!(report.success, "全部任务应成功: {:?}", report.jobs);
    assert_eq!(report.jobs.len(), 3);

    // 覆盖语义: 123 → 5（而非 14）;999 不在账本,保持原样
    let expected = b"id,qty,name\n123,5,Widget\n999,2,Gadget\n".to_vec();
    assert_eq!(transport.uploaded(), vec![("platform_a/products.csv".to_string(), expected.clone())]);
    assert_eq!(baselines.read("PLATFORM_A").unwrap(), expected);

    let platform_job = report.jobs.iter().find(|j| j.kind == JobKind::Platform).unwrap();
    assert_eq!(platform_job.counts.read, 2);
    assert_eq!(platform_job.counts.matched, 1);
    assert_eq!(platform_job.counts.updated, 1);
}

#[tokio::test]
async fn test_one_failed_supplier_does_not_abort_run() {
    logging::init_test();

    // 三个供应商之一不可达: 运行仍到 Completed,账本仅含其余两家
    let transport = Arc::new(
        MockTransport::new()
            .with_file("s1/stock.csv", b"SKU,Qty\nA,1\n")
            .with_fetch_failure("s2/stock.csv")
            .with_file("s3/stock.csv", b"SKU,Qty\nB,3\n"),
    );

    let dir = TempDir::new().unwrap();
    write_baseline(dir.path(), "P", "products.csv", b"id,qty\nA,0\nB,0\nC,7\n");

    let config = sync_config(
        vec![
            supplier("S1", "s1/stock.csv", mapping("SKU", &[], "Qty", &[])),
            supplier("S2", "s2/stock.csv", mapping("SKU", &[], "Qty", &[])),
            supplier("S3", "s3/stock.csv", mapping("SKU", &[], "Qty", &[])),
        ],
        vec![platform("P", "p/products.csv", mapping("id", &[], "qty", &[]))],
    );

    let baselines = Arc::new(BaselineStore::new(dir.path()));
    let orchestrator =
        JobOrchestrator::new(config, transport, baselines.clone(), default_options());

    let report = orchestrator.run().await;

    assert_eq!(report.state, RunState::Completed);
    assert!(!report.success);

    // 恰好一个失败的供应商任务
    let failed: Vec<_> = report.failed_jobs().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].job_id, "S2");
    assert_eq!(failed[0].kind, JobKind::Supplier);

    // 账本仅反映 S1/S3;C 不在账本,保持原值
    assert_eq!(
        baselines.read("P").unwrap(),
        b"id,qty\nA,1\nB,3\nC,7\n".to_vec()
    );
}

#[tokio::test(start_paused = true)]
async fn test_supplier_timeout_is_job_failure_not_run_fault() {
    logging::init_test();

    // S1 挂起超时,S2 正常: 运行到 Completed,仅 S1 任务失败
    let transport = Arc::new(
        MockTransport::new()
            .with_file("s1/stock.csv", b"SKU,Qty\nA,1\n")
            .with_slow_fetch("s1/stock.csv")
            .with_file("s2/stock.csv", b"SKU,Qty\nB,2\n"),
    );
    let dir = TempDir::new().unwrap();
    write_baseline(dir.path(), "P", "products.csv", b"id,qty\nA,0\nB,0\n");

    let config = sync_config(
        vec![
            supplier("S1", "s1/stock.csv", mapping("SKU", &[], "Qty", &[])),
            supplier("S2", "s2/stock.csv", mapping("SKU", &[], "Qty", &[])),
        ],
        vec![platform("P", "p/products.csv", mapping("id", &[], "qty", &[]))],
    );

    let baselines = Arc::new(BaselineStore::new(dir.path()));
    let orchestrator =
        JobOrchestrator::new(config, transport, baselines.clone(), default_options());

    let report = orchestrator.run().await;

    assert_eq!(report.state, RunState::Completed);
    let failed: Vec<_> = report.failed_jobs().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].job_id, "S1");
    assert!(failed[0].detail.contains("超时"), "实际: {}", failed[0].detail);

    // 账本仅含 S2,超时供应商的行保持原值
    assert_eq!(baselines.read("P").unwrap(), b"id,qty\nA,0\nB,2\n");
}

#[tokio::test]
async fn test_dry_run_reports_success_without_side_effects() {
    logging::init_test();

    let transport =
        Arc::new(MockTransport::new().with_file("s/stock.csv", b"SKU,Qty\n123,5\n"));
    let dir = TempDir::new().unwrap();
    write_baseline(dir.path(), "P", "products.csv", b"id,qty\n123,9\n");

    let config = sync_config(
        vec![supplier("S", "s/stock.csv", mapping("SKU", &[], "Qty", &[]))],
        vec![platform("P", "p/products.csv", mapping("id", &[], "qty", &[]))],
    );

    let baselines = Arc::new(BaselineStore::new(dir.path()));
    let options = RunOptions {
        dry_run: true,
        ..RunOptions::default()
    };
    let orchestrator = JobOrchestrator::new(config, transport.clone(), baselines.clone(), options);

    let report = orchestrator.run().await;

    assert!(report.success);
    assert!(report.dry_run);
    let platform_job = report.jobs.iter().find(|j| j.kind == JobKind::Platform).unwrap();
    assert_eq!(platform_job.status, JobStatus::Success);

    // 无上传、无备份、基线不变
    assert!(transport.uploaded().is_empty());
    assert_eq!(count_backups(dir.path(), "P"), 0);
    assert_eq!(baselines.read("P").unwrap(), b"id,qty\n123,9\n");
}

#[tokio::test]
async fn test_scope_filters_restrict_jobs() {
    logging::init_test();

    let transport = Arc::new(
        MockTransport::new()
            .with_file("s1/stock.csv", b"SKU,Qty\nA,1\n")
            .with_file("s2/stock.csv", b"SKU,Qty\nB,2\n"),
    );
    let dir = TempDir::new().unwrap();
    write_baseline(dir.path(), "P1", "products.csv", b"id,qty\nA,0\n");
    write_baseline(dir.path(), "P2", "products.csv", b"id,qty\nB,0\n");

    let config = sync_config(
        vec![
            supplier("S1", "s1/stock.csv", mapping("SKU", &[], "Qty", &[])),
            supplier("S2", "s2/stock.csv", mapping("SKU", &[], "Qty", &[])),
        ],
        vec![
            platform("P1", "p1/products.csv", mapping("id", &[], "qty", &[])),
            platform("P2", "p2/products.csv", mapping("id", &[], "qty", &[])),
        ],
    );

    let options = RunOptions {
        dry_run: false,
        supplier_scope: vec!["S1".to_string()],
        platform_scope: vec!["P1".to_string()],
    };
    let baselines = Arc::new(BaselineStore::new(dir.path()));
    let orchestrator = JobOrchestrator::new(config, transport, baselines.clone(), options);

    let report = orchestrator.run().await;

    // 范围外的任务完全不出现在报告中
    assert_eq!(report.jobs.len(), 2);
    assert!(report.jobs.iter().all(|j| j.job_id == "S1" || j.job_id == "P1"));

    // P2 基线未被触碰
    assert_eq!(baselines.read("P2").unwrap(), b"id,qty\nB,0\n");
}

#[tokio::test]
async fn test_platform_failure_is_isolated_from_siblings() {
    logging::init_test();

    let transport = Arc::new(
        MockTransport::new()
            .with_file("s/stock.csv", b"SKU,Qty\nA,4\n")
            .with_upload_failure("p1/products.csv"),
    );
    let dir = TempDir::new().unwrap();
    write_baseline(dir.path(), "P1", "products.csv", b"id,qty\nA,0\n");
    write_baseline(dir.path(), "P2", "products.csv", b"id,qty\nA,0\n");

    let config = sync_config(
        vec![supplier("S", "s/stock.csv", mapping("SKU", &[], "Qty", &[]))],
        vec![
            platform("P1", "p1/products.csv", mapping("id", &[], "qty", &[])),
            platform("P2", "p2/products.csv", mapping("id", &[], "qty", &[])),
        ],
    );

    let baselines = Arc::new(BaselineStore::new(dir.path()));
    let orchestrator =
        JobOrchestrator::new(config, transport, baselines.clone(), default_options());

    let report = orchestrator.run().await;

    // P1 失败被隔离: P2 正常推进
    let p1 = report.jobs.iter().find(|j| j.job_id == "P1").unwrap();
    let p2 = report.jobs.iter().find(|j| j.job_id == "P2").unwrap();
    assert_eq!(p1.status, JobStatus::Failure);
    assert_eq!(p2.status, JobStatus::Success);

    assert_eq!(baselines.read("P1").unwrap(), b"id,qty\nA,0\n", "失败平台基线不变");
    assert_eq!(baselines.read("P2").unwrap(), b"id,qty\nA,4\n", "同级平台正常推进");
}

#[tokio::test]
async fn test_abort_before_run_reports_all_jobs_unstarted() {
    logging::init_test();

    let transport =
        Arc::new(MockTransport::new().with_file("s/stock.csv", b"SKU,Qty\nA,1\n"));
    let dir = TempDir::new().unwrap();
    write_baseline(dir.path(), "P", "products.csv", b"id,qty\nA,0\n");

    let config = sync_config(
        vec![supplier("S", "s/stock.csv", mapping("SKU", &[], "Qty", &[]))],
        vec![platform("P", "p/products.csv", mapping("id", &[], "qty", &[]))],
    );

    let baselines = Arc::new(BaselineStore::new(dir.path()));
    let orchestrator =
        JobOrchestrator::new(config, transport.clone(), baselines.clone(), default_options());

    orchestrator.abort_handle().store(true, Ordering::SeqCst);
    let report = orchestrator.run().await;

    // 状态机仍走到 Completed,每个任务以"未启动"失败上报
    assert_eq!(report.state, RunState::Completed);
    assert!(!report.success);
    assert_eq!(report.jobs.len(), 2);
    assert!(report.jobs.iter().all(|j| j.status == JobStatus::Failure));
    assert!(transport.uploaded().is_empty());
    assert_eq!(baselines.read("P").unwrap(), b"id,qty\nA,0\n");
}

#[tokio::test]
async fn test_run_with_zero_successful_jobs_still_completes() {
    logging::init_test();

    let transport = Arc::new(MockTransport::new().with_fetch_failure("s/stock.csv"));
    let dir = TempDir::new().unwrap();

    let config = sync_config(
        vec![supplier("S", "s/stock.csv", mapping("SKU", &[], "Qty", &[]))],
        vec![platform("P", "p/products.csv", mapping("id", &[], "qty", &[]))],
    );

    // P 的基线目录不存在 → 平台任务也失败
    let baselines = Arc::new(BaselineStore::new(dir.path()));
    let orchestrator =
        JobOrchestrator::new(config, transport, baselines, default_options());

    let report = orchestrator.run().await;

    assert_eq!(report.state, RunState::Completed, "零成功任务仍是 Completed 运行");
    assert!(!report.success);
    assert_eq!(report.jobs.len(), 2);
    assert!(report.failed_jobs().count() == 2);
}
