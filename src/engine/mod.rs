// ==========================================
// 库存同步系统 - 引擎层
// ==========================================
// 职责: 账本合并、平台文件渲染、运行编排
// ==========================================

pub mod ledger;
pub mod orchestrator;
pub mod renderer;

pub use ledger::{LedgerEntry, StockLedger};
pub use orchestrator::JobOrchestrator;
pub use renderer::{PlatformRenderer, RenderError};
