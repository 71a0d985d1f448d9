// ==========================================
// 库存同步系统 - 核心库
// ==========================================
// 职责: 供应商库存导入 → 账本合并 → 平台文件渲染
//       → 事务化发布 的完整同步引擎
// 定位: 调度器按周期触发,一次调用产出一份 RunReport
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 值对象
pub mod domain;

// 配置层 - 同步配置与列映射
pub mod config;

// 传输层 - 取件/投放能力接口
pub mod transport;

// 导入层 - 供应商文件解析与归一化
pub mod ingest;

// 引擎层 - 账本合并、渲染、编排
pub mod engine;

// 发布层 - 上传与基线推进
pub mod publish;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    CanonicalRecord, JobCounts, JobKind, JobResult, JobStatus, QuantityWarning, RawTable,
    RunReport, RunState, SupplierBatch,
};

// 配置
pub use config::{
    ConfigError, ConfigManager, FieldSpec, PlatformTarget, RunOptions, SourceMapping,
    SupplierSource, SyncConfig,
};

// 传输
pub use transport::{LocalDirTransport, Transport, TransportError};

// 导入
pub use ingest::{IngestError, MappingError, SchemaMapper, SupplierIngestor, UniversalFileParser};

// 引擎
pub use engine::{JobOrchestrator, LedgerEntry, PlatformRenderer, RenderError, StockLedger};

// 发布
pub use publish::{BaselineStore, PublishError, TransactionalUploader};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "库存同步系统";
