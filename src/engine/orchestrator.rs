// ==========================================
// 库存同步系统 - 运行编排器
// ==========================================
// 状态机: Pending → IngestingSuppliers → Merging
//         → RenderingAndPublishing → Completed
// 红线: 不跳过任何状态;任务失败记入报告,不上抛;
//       唯一的运行级故障是发生在 Pending 之前的配置加载失败
// 并发: 有界工作池内并发执行,阶段间以 join_all 栅栏同步;
//       账本构建完成前渲染阶段绝不启动
// ==========================================

use crate::config::{PlatformTarget, RunOptions, SupplierSource, SyncConfig};
use crate::domain::{JobCounts, JobKind, JobResult, RunReport, RunState, SupplierBatch};
use crate::engine::ledger::StockLedger;
use crate::engine::renderer::PlatformRenderer;
use crate::ingest::SupplierIngestor;
use crate::publish::{BaselineStore, TransactionalUploader};
use crate::transport::Transport;
use chrono::Utc;
use futures::future::join_all;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};
use uuid::Uuid;

// ==========================================
// JobOrchestrator - 运行编排器
// ==========================================
pub struct JobOrchestrator<T: Transport> {
    config: Arc<SyncConfig>,
    transport: Arc<T>,
    baselines: Arc<BaselineStore>,
    options: RunOptions,
    abort: Arc<AtomicBool>,
}

impl<T: Transport> JobOrchestrator<T> {
    pub fn new(
        config: SyncConfig,
        transport: Arc<T>,
        baselines: Arc<BaselineStore>,
        options: RunOptions,
    ) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            baselines,
            options,
            abort: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 中止句柄: 置位后不再启动新任务,在途任务允许完成
    /// （保全发布阶段的全有或全无语义）
    pub fn abort_handle(&self) -> Arc<AtomicBool> {
        self.abort.clone()
    }

    fn aborted(&self) -> bool {
        self.abort.load(Ordering::SeqCst)
    }

    /// 执行一次完整同步运行
    ///
    /// # 返回
    /// RunReport: 按配置顺序枚举每个任务的结局;
    /// 即使全部任务失败,运行仍到达 Completed。
    #[instrument(skip(self), fields(run_id))]
    pub async fn run(&self) -> RunReport {
        let run_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("run_id", run_id.as_str());
        let started_at = Utc::now();

        info!(state = ?RunState::Pending, dry_run = self.options.dry_run, "运行开始");

        let suppliers: Vec<&SupplierSource> = self
            .config
            .suppliers
            .iter()
            .filter(|s| self.options.includes_supplier(&s.id))
            .collect();
        let platforms: Vec<&PlatformTarget> = self
            .config
            .platforms
            .iter()
            .filter(|p| self.options.includes_platform(&p.id))
            .collect();

        let pool = Arc::new(Semaphore::new(self.config.max_parallel_jobs));

        // === 阶段 1: 供应商导入（并发,栅栏等待全部终态） ===
        info!(
            state = ?RunState::IngestingSuppliers,
            suppliers = suppliers.len(),
            "进入供应商导入阶段"
        );
        let (mut jobs, batches) = self.ingest_phase(&suppliers, &pool).await;

        // === 阶段 2: 账本合并（单写入点,此后只读） ===
        info!(state = ?RunState::Merging, batches = batches.len(), "进入账本合并阶段");
        let ledger = Arc::new(StockLedger::merge(&batches));

        // === 阶段 3: 平台渲染与发布（并发,平台内串行） ===
        info!(
            state = ?RunState::RenderingAndPublishing,
            platforms = platforms.len(),
            "进入渲染与发布阶段"
        );
        jobs.extend(self.publish_phase(&platforms, ledger, &pool).await);

        // === 终态 ===
        let success = jobs.iter().all(|j| j.is_success());
        let finished_at = Utc::now();
        info!(
            state = ?RunState::Completed,
            jobs = jobs.len(),
            failed = jobs.iter().filter(|j| !j.is_success()).count(),
            success,
            "运行结束"
        );

        RunReport {
            run_id,
            state: RunState::Completed,
            dry_run: self.options.dry_run,
            started_at,
            finished_at,
            jobs,
            success,
        }
    }

    /// 供应商导入阶段: 每个供应商一个独立任务,互不影响
    async fn ingest_phase(
        &self,
        suppliers: &[&SupplierSource],
        pool: &Arc<Semaphore>,
    ) -> (Vec<JobResult>, Vec<SupplierBatch>) {
        let ingestor = SupplierIngestor::new(self.transport.clone(), self.config.transport_timeout());

        let futures = suppliers.iter().map(|source| {
            let pool = pool.clone();
            let ingestor = &ingestor;
            async move {
                let _permit = match pool.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            JobResult::failure(&source.id, JobKind::Supplier, "工作池已关闭"),
                            None,
                        )
                    }
                };

                // 中止信号: 不再启动新任务
                if self.aborted() {
                    warn!(supplier = %source.id, "收到中止信号,任务未启动");
                    return (
                        JobResult::failure(&source.id, JobKind::Supplier, "收到中止信号,任务未启动"),
                        None,
                    );
                }

                match ingestor.ingest(source).await {
                    Ok(batch) => {
                        let counts = JobCounts {
                            read: batch.rows_read,
                            matched: batch.records.len(),
                            updated: 0,
                        };
                        let detail = format!(
                            "记录 {} 条,跳过 {} 行,告警 {} 条",
                            batch.records.len(),
                            batch.rows_skipped,
                            batch.warnings.len()
                        );
                        (
                            JobResult::success(&source.id, JobKind::Supplier, detail, counts),
                            Some(batch),
                        )
                    }
                    Err(e) => {
                        // 单供应商失败仅移除其账本贡献,不中止运行
                        warn!(supplier = %source.id, error = %e, "供应商导入失败");
                        (
                            JobResult::failure(&source.id, JobKind::Supplier, e.to_string()),
                            None,
                        )
                    }
                }
            }
        });

        // 栅栏: 全部导入任务到达终态后才进入合并
        let outcomes = join_all(futures).await;

        let mut jobs = Vec::with_capacity(outcomes.len());
        let mut batches = Vec::new();
        for (job, batch) in outcomes {
            jobs.push(job);
            if let Some(batch) = batch {
                // join_all 保持输入顺序,批次顺序即配置内优先级顺序
                batches.push(batch);
            }
        }
        (jobs, batches)
    }

    /// 平台阶段: 渲染后发布,平台内严格串行,平台间并发
    async fn publish_phase(
        &self,
        platforms: &[&PlatformTarget],
        ledger: Arc<StockLedger>,
        pool: &Arc<Semaphore>,
    ) -> Vec<JobResult> {
        let uploader = TransactionalUploader::new(
            self.transport.clone(),
            self.baselines.clone(),
            self.config.transport_timeout(),
        );

        let futures = platforms.iter().map(|target| {
            let pool = pool.clone();
            let ledger = ledger.clone();
            let uploader = &uploader;
            async move {
                let _permit = match pool.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return JobResult::failure(&target.id, JobKind::Platform, "工作池已关闭")
                    }
                };

                if self.aborted() {
                    warn!(platform = %target.id, "收到中止信号,任务未启动");
                    return JobResult::failure(
                        &target.id,
                        JobKind::Platform,
                        "收到中止信号,任务未启动",
                    );
                }

                self.render_and_publish(target, &ledger, uploader).await
            }
        });

        join_all(futures).await
    }

    /// 单平台任务: 读基线 → 渲染 → 发布
    async fn render_and_publish(
        &self,
        target: &PlatformTarget,
        ledger: &StockLedger,
        uploader: &TransactionalUploader<T>,
    ) -> JobResult {
        let baseline = match self.baselines.read(&target.id) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(platform = %target.id, error = %e, "基线读取失败");
                return JobResult::failure(
                    &target.id,
                    JobKind::Platform,
                    format!("基线读取失败: {}", e),
                );
            }
        };

        let (rendered, counts) =
            match PlatformRenderer.render(&target.id, &baseline, ledger, &target.mapping) {
                Ok(result) => result,
                Err(e) => {
                    warn!(platform = %target.id, error = %e, "渲染失败");
                    return JobResult::failure(&target.id, JobKind::Platform, e.to_string());
                }
            };

        match uploader
            .publish(&target.id, &target.remote_path, &rendered, self.options.dry_run)
            .await
        {
            Ok(()) => {
                let detail = if self.options.dry_run {
                    "试运行: 渲染校验通过,未上传".to_string()
                } else {
                    "上传成功,基线已备份并推进".to_string()
                };
                JobResult::success(&target.id, JobKind::Platform, detail, counts)
            }
            Err(e) => {
                warn!(platform = %target.id, error = %e, "发布失败");
                JobResult::failure(&target.id, JobKind::Platform, e.to_string())
            }
        }
    }
}
