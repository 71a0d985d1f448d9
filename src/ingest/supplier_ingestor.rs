// ==========================================
// 库存同步系统 - 供应商导入器实现
// ==========================================
// 职责: 整合单个供应商的导入流程
// 流程: 取件 → 解析 → 列解析 → 逐行归一化
// 红线: 单行数据问题绝不中止整个文件,
//       仅文件级问题（不可达/不可解析/映射失败）才报错
// ==========================================

use crate::config::SupplierSource;
use crate::domain::{CanonicalRecord, QuantityWarning, SupplierBatch};
use crate::ingest::error::IngestError;
use crate::ingest::file_parser::UniversalFileParser;
use crate::ingest::schema_mapper::SchemaMapper;
use crate::transport::Transport;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

// ==========================================
// 数量收敛
// ==========================================

/// 将原始单元格收敛为非负整数数量
///
/// # 规则
/// - 空白 / 非数值 → 0,记告警（单行问题不阻断文件）
/// - 负数 → 0,记告警
/// - 小数 → 向零截断,有尾数时记告警（"5.0" 不告警）
pub fn coerce_quantity(raw: &str) -> (u32, Option<&'static str>) {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return (0, Some("空值"));
    }

    if let Ok(value) = trimmed.parse::<i64>() {
        if value < 0 {
            return (0, Some("负数"));
        }
        return match u32::try_from(value) {
            Ok(v) => (v, None),
            Err(_) => (u32::MAX, Some("超出上限")),
        };
    }

    if let Ok(value) = trimmed.parse::<f64>() {
        // "NaN" 可被 f64 成功解析,须与普通非数值同样上报
        if value.is_nan() {
            return (0, Some("非数值"));
        }
        if value < 0.0 {
            return (0, Some("负数"));
        }
        let truncated = value.trunc();
        let warning = if (value - truncated).abs() > f64::EPSILON {
            Some("小数截断")
        } else {
            None
        };
        if truncated > u32::MAX as f64 {
            return (u32::MAX, Some("超出上限"));
        }
        return (truncated as u32, warning);
    }

    (0, Some("非数值"))
}

// ==========================================
// SupplierIngestor - 供应商导入器
// ==========================================
pub struct SupplierIngestor<T: Transport> {
    transport: Arc<T>,
    op_timeout: Duration,
}

impl<T: Transport> SupplierIngestor<T> {
    pub fn new(transport: Arc<T>, op_timeout: Duration) -> Self {
        Self {
            transport,
            op_timeout,
        }
    }

    /// 导入单个供应商的库存文件
    ///
    /// # 参数
    /// - source: 供应商数据源配置
    ///
    /// # 返回
    /// - Ok(SupplierBatch): 规范化记录 + 行级计数/告警
    /// - Err(IngestError): 文件级失败（Transport/Format/Mapping）
    pub async fn ingest(&self, source: &SupplierSource) -> Result<SupplierBatch, IngestError> {
        info!(supplier = %source.id, remote_path = %source.remote_path, "开始导入供应商文件");

        // === 步骤 1: 取件（单次操作超时） ===
        let bytes = tokio::time::timeout(self.op_timeout, self.transport.fetch(&source.remote_path))
            .await
            .map_err(|_| {
                IngestError::Transport(format!("取件超时: {}", source.remote_path))
            })?
            .map_err(|e| IngestError::Transport(e.to_string()))?;

        debug!(supplier = %source.id, bytes = bytes.len(), "取件完成");

        // === 步骤 2: 格式嗅探 + 解析 ===
        let table = UniversalFileParser.parse(&source.remote_path, &bytes)?;

        // === 步骤 3: 列解析 ===
        let columns = SchemaMapper.resolve(&table.headers, &source.mapping)?;

        // === 步骤 4: 逐行归一化 ===
        let mut batch = SupplierBatch::new(&source.id);
        batch.rows_read = table.rows.len();

        for (idx, row) in table.rows.iter().enumerate() {
            let row_number = idx + 1;

            let item_id = row
                .get(columns.item_id)
                .map(|v| v.trim())
                .unwrap_or_default();
            if item_id.is_empty() {
                // 缺少商品标识: 跳过并计数,不视为失败
                batch.rows_skipped += 1;
                continue;
            }

            let raw_quantity = row.get(columns.quantity).map(|v| v.as_str()).unwrap_or("");
            let (quantity, warning) = coerce_quantity(raw_quantity);
            if let Some(reason) = warning {
                warn!(
                    supplier = %source.id,
                    row = row_number,
                    raw = %raw_quantity,
                    reason = %reason,
                    "数量收敛告警"
                );
                batch.warnings.push(QuantityWarning {
                    row: row_number,
                    raw_value: raw_quantity.to_string(),
                    reason: reason.to_string(),
                });
            }

            batch.records.push(CanonicalRecord {
                item_id: item_id.to_string(),
                quantity,
                source: source.id.clone(),
            });
        }

        info!(
            supplier = %source.id,
            rows_read = batch.rows_read,
            records = batch.records.len(),
            skipped = batch.rows_skipped,
            warnings = batch.warnings.len(),
            "供应商文件导入完成"
        );

        Ok(batch)
    }
}
