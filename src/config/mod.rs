// ==========================================
// 库存同步系统 - 配置层
// ==========================================
// 职责: 运行前一次性加载供应商/平台/映射配置
// 红线: 配置加载失败必须在 Pending 之前中止运行
// ==========================================

pub mod config_manager;
pub mod source_mapping;

pub use config_manager::{
    ConfigError, ConfigManager, PlatformTarget, RunOptions, SupplierSource, SyncConfig,
};
pub use source_mapping::{normalize_header, FieldSpec, SourceMapping};
