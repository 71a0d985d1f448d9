// ==========================================
// 供应商导入集成测试
// ==========================================
// 测试目标: 取件 → 解析 → 列解析 → 归一化 全链路
// ==========================================


use std::sync::Arc;
use std::time::Duration;
use stock_sync::{logging, IngestError, SupplierIngestor};
use test_helpers::{mapping, supplier, MockTransport};

const OP_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_ingest_csv_with_alias_headers() {
    logging::init_test();

    let transport = Arc::new(
        MockTransport::new().with_file("sup_a/stock.csv", b"EAN,Stock dispo\n123,5\n456,10\n"),
    );
    let source = supplier(
        "FOURNISSEUR_A",
        "sup_a/stock.csv",
        mapping("SKU", &["EAN"], "Qty", &["Stock dispo"]),
    );

    let batch = SupplierIngestor::new(transport, OP_TIMEOUT)
        .ingest(&source)
        .await
        .unwrap();

    assert_eq!(batch.rows_read, 2);
    assert_eq!(batch.records.len(), 2);
    assert_eq!(batch.records[0].item_id, "123");
    assert_eq!(batch.records[0].quantity, 5);
    assert_eq!(batch.records[0].source, "FOURNISSEUR_A");
    assert!(batch.warnings.is_empty());
}

#[tokio::test]
async fn test_ingest_tolerates_row_level_problems() {
    logging::init_test();

    // 第 2 行数量非数值、第 3 行缺标识、第 4 行数量为空
    let data = b"SKU,Qty\nA1,5\nA2,beaucoup\n,7\nA3,\n";
    let transport = Arc::new(MockTransport::new().with_file("sup/stock.csv", data));
    let source = supplier("S", "sup/stock.csv", mapping("SKU", &[], "Qty", &[]));

    let batch = SupplierIngestor::new(transport, OP_TIMEOUT)
        .ingest(&source)
        .await
        .unwrap();

    assert_eq!(batch.rows_read, 4);
    assert_eq!(batch.records.len(), 3, "缺标识的行被跳过,其余行保留");
    assert_eq!(batch.rows_skipped, 1);
    assert_eq!(batch.warnings.len(), 2, "非数值与空值各产生一条告警");

    // 行级问题收敛为 0,不使整个文件失败
    let a2 = batch.records.iter().find(|r| r.item_id == "A2").unwrap();
    assert_eq!(a2.quantity, 0);
}

#[tokio::test]
async fn test_ingest_unreachable_source_is_transport_error() {
    logging::init_test();

    let transport = Arc::new(MockTransport::new().with_fetch_failure("sup/stock.csv"));
    let source = supplier("S", "sup/stock.csv", mapping("SKU", &[], "Qty", &[]));

    let err = SupplierIngestor::new(transport, OP_TIMEOUT)
        .ingest(&source)
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Transport(_)));
}

#[tokio::test(start_paused = true)]
async fn test_ingest_fetch_timeout_is_transport_error() {
    logging::init_test();

    // 取件挂起超过操作超时: 以 Transport 错误终局,而非悬挂
    let transport = Arc::new(
        MockTransport::new()
            .with_file("sup/stock.csv", b"SKU,Qty\n123,5\n")
            .with_slow_fetch("sup/stock.csv"),
    );
    let source = supplier("S", "sup/stock.csv", mapping("SKU", &[], "Qty", &[]));

    let err = SupplierIngestor::new(transport, OP_TIMEOUT)
        .ingest(&source)
        .await
        .unwrap_err();
    match err {
        IngestError::Transport(msg) => assert!(msg.contains("超时"), "实际: {}", msg),
        other => panic!("应为 Transport 错误,实际: {:?}", other),
    }
}

#[tokio::test]
async fn test_ingest_unresolved_mapping_is_file_level_error() {
    logging::init_test();

    let transport =
        Arc::new(MockTransport::new().with_file("sup/stock.csv", b"Foo,Bar\n1,2\n"));
    let source = supplier("S", "sup/stock.csv", mapping("SKU", &["EAN"], "Qty", &[]));

    let err = SupplierIngestor::new(transport, OP_TIMEOUT)
        .ingest(&source)
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Mapping(_)));
}

#[tokio::test]
async fn test_ingest_semicolon_txt_feed() {
    logging::init_test();

    let transport =
        Arc::new(MockTransport::new().with_file("sup/export.txt", b"SKU;Qty\nX9;42\n"));
    let source = supplier("S", "sup/export.txt", mapping("SKU", &[], "Qty", &[]));

    let batch = SupplierIngestor::new(transport, OP_TIMEOUT)
        .ingest(&source)
        .await
        .unwrap();
    assert_eq!(batch.records.len(), 1);
    assert_eq!(batch.records[0].quantity, 42);
}
