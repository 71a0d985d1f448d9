// ==========================================
// 库存同步系统 - 领域层
// ==========================================
// 职责: 定义同步流程中的核心值对象
// 红线: 领域对象不持有 IO 能力
// ==========================================

pub mod record;
pub mod report;
pub mod table;

pub use record::{CanonicalRecord, QuantityWarning, SupplierBatch};
pub use report::{JobCounts, JobKind, JobResult, JobStatus, RunReport, RunState};
pub use table::RawTable;
