// ==========================================
// 库存同步系统 - 发布层
// ==========================================
// 职责: 平台文件上传与基线的备份/推进
// 红线: 仅在传输确认成功后才触碰基线
// ==========================================

pub mod baseline;
pub mod uploader;

pub use baseline::BaselineStore;
pub use uploader::{PublishError, TransactionalUploader};
