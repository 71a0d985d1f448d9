// ==========================================
// 库存同步系统 - 事务化上传器实现
// ==========================================
// 职责: 渲染产物的上传与基线推进
// 协议: 试运行短路 → 上传 → 确认成功后备份旧基线
//       → 原子推进新基线
// 红线: Transport 失败保证基线未被触碰;
//       Backup 失败必须与 Transport 失败区分上报,
//       因为远端可能已持有新数据而本地基线未推进
// ==========================================

use crate::publish::baseline::BaselineStore;
use crate::transport::Transport;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

// ==========================================
// PublishError - 发布错误（平台任务级）
// ==========================================
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("上传失败（基线未触碰）: {0}")]
    Transport(String),

    #[error("备份/推进失败（远端可能已持有新数据,本地基线未推进）: {0}")]
    Backup(String),
}

// ==========================================
// TransactionalUploader - 事务化上传器
// ==========================================
pub struct TransactionalUploader<T: Transport> {
    transport: Arc<T>,
    baselines: Arc<BaselineStore>,
    op_timeout: Duration,
}

impl<T: Transport> TransactionalUploader<T> {
    pub fn new(transport: Arc<T>, baselines: Arc<BaselineStore>, op_timeout: Duration) -> Self {
        Self {
            transport,
            baselines,
            op_timeout,
        }
    }

    /// 发布渲染产物到平台
    ///
    /// # 参数
    /// - platform_id: 平台 ID
    /// - remote_path: 传输层投放路径
    /// - bytes: 渲染后的文件内容
    /// - dry_run: 试运行（不触网、不推进基线,直接报成功）
    ///
    /// # 协议顺序
    /// 1. dry_run → 校验后直接成功
    /// 2. 上传至远端,确认成功
    /// 3. 备份当前基线 → 原子推进新基线
    pub async fn publish(
        &self,
        platform_id: &str,
        remote_path: &str,
        bytes: &[u8],
        dry_run: bool,
    ) -> Result<(), PublishError> {
        if dry_run {
            // 试运行仍校验基线可达,保证真实运行不会在此处意外失败
            self.baselines
                .baseline_path(platform_id)
                .map_err(|e| PublishError::Backup(e.to_string()))?;
            info!(
                platform = %platform_id,
                bytes = bytes.len(),
                "试运行: 跳过上传与基线推进"
            );
            return Ok(());
        }

        // === 步骤 1: 上传（单次操作超时） ===
        tokio::time::timeout(self.op_timeout, self.transport.upload(remote_path, bytes))
            .await
            .map_err(|_| PublishError::Transport(format!("投放超时: {}", remote_path)))?
            .map_err(|e| PublishError::Transport(e.to_string()))?;
        info!(platform = %platform_id, remote_path = %remote_path, "上传确认成功");

        // === 步骤 2: 备份旧基线 ===
        let timestamp = BaselineStore::backup_timestamp();
        self.baselines
            .backup(platform_id, &timestamp)
            .map_err(|e| {
                warn!(platform = %platform_id, error = %e, "备份失败,本地基线与远端出现分歧");
                PublishError::Backup(format!("备份失败: {}", e))
            })?;

        // === 步骤 3: 原子推进新基线 ===
        self.baselines.promote(platform_id, bytes).map_err(|e| {
            warn!(platform = %platform_id, error = %e, "基线推进失败,旧基线仍为唯一活动副本");
            PublishError::Backup(format!("基线推进失败: {}", e))
        })?;

        info!(platform = %platform_id, "发布完成: 远端与本地基线已同步推进");
        Ok(())
    }
}
