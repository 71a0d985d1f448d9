// ==========================================
// 库存同步系统 - 列映射配置
// ==========================================
// 职责: 声明式描述"源表头 → 规范字段"的解析候选
// 红线: 映射是显式配置,不做列位置猜测
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// FieldSpec - 单个规范字段的表头候选
// ==========================================
// 解析顺序: 首选表头精确匹配 → 按声明顺序尝试别名
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub header: String,           // 首选表头
    #[serde(default)]
    pub aliases: Vec<String>,     // 别名表头（容忍供应商命名漂移）
}

impl FieldSpec {
    /// 按解析优先级枚举全部候选表头
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.header.as_str()).chain(self.aliases.iter().map(|s| s.as_str()))
    }
}

// ==========================================
// SourceMapping - 单个数据源的映射配置
// ==========================================
// 用途: 供应商文件导入与平台文件回写共用
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMapping {
    pub item_id: FieldSpec,   // 商品标识列
    pub quantity: FieldSpec,  // 库存数量列
}

/// 表头归一化（大小写 + 空白）
///
/// 规则: trim → 小写 → 连续内部空白压缩为单个空格
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
