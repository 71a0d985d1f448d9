// ==========================================
// 库存同步系统 - 规范化记录模型
// ==========================================
// 职责: 供应商行数据归一化后的标准形态
// 红线: 记录一经产出即不可变
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// CanonicalRecord - 规范化库存记录
// ==========================================
// 用途: 导入层写入,账本层合并
// 唯一性: item_id 仅在单个供应商批次内有意义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub item_id: String,  // 商品标识（SKU / EAN 等，按映射配置解析）
    pub quantity: u32,    // 库存数量（非负整数，已强制收敛）
    pub source: String,   // 来源供应商 ID
}

// ==========================================
// QuantityWarning - 数量收敛告警
// ==========================================
// 用途: 行级数据质量问题记录（不阻断文件导入）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantityWarning {
    pub row: usize,        // 数据行号（从 1 开始，不含表头）
    pub raw_value: String, // 原始单元格内容
    pub reason: String,    // 收敛原因（空值 / 非数值 / 负数 / 小数截断）
}

// ==========================================
// SupplierBatch - 单供应商导入批次
// ==========================================
// 用途: 一次供应商导入任务的完整产出
#[derive(Debug, Clone)]
pub struct SupplierBatch {
    pub source_id: String,              // 供应商 ID
    pub records: Vec<CanonicalRecord>,  // 规范化记录
    pub rows_read: usize,               // 读取的数据行数
    pub rows_skipped: usize,            // 因缺少商品标识被跳过的行数
    pub warnings: Vec<QuantityWarning>, // 数量收敛告警
}

impl SupplierBatch {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            records: Vec::new(),
            rows_read: 0,
            rows_skipped: 0,
            warnings: Vec::new(),
        }
    }
}
