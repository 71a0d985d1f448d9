// ==========================================
// 库存同步系统 - 本地目录传输实现
// ==========================================
// 职责: 以本地目录模拟远端,供本地运行与测试使用
// 投放协议: 先写 .tmp 再重命名,避免半成品文件被读到
// ==========================================

use crate::transport::{Transport, TransportError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct LocalDirTransport {
    root: PathBuf,
}

impl LocalDirTransport {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn resolve(&self, remote_path: &str) -> PathBuf {
        self.root.join(remote_path)
    }
}

#[async_trait]
impl Transport for LocalDirTransport {
    async fn fetch(&self, remote_path: &str) -> Result<Vec<u8>, TransportError> {
        let path = self.resolve(remote_path);
        debug!(path = %path.display(), "本地传输: 取件");

        if !path.exists() {
            return Err(TransportError::NotFound(remote_path.to_string()));
        }

        tokio::fs::read(&path)
            .await
            .map_err(|e| TransportError::Io(format!("{}: {}", remote_path, e)))
    }

    async fn upload(&self, remote_path: &str, bytes: &[u8]) -> Result<(), TransportError> {
        let path = self.resolve(remote_path);
        let parent = path
            .parent()
            .ok_or_else(|| TransportError::Io(format!("无效投放路径: {}", remote_path)))?;

        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| TransportError::Io(e.to_string()))?;

        // 临时名写入 + 重命名,与远端 FTP 的 STOR .tmp → RENAME 协议对齐
        let tmp_path = path.with_extension("tmp");
        tokio::fs::write(&tmp_path, bytes)
            .await
            .map_err(|e| TransportError::Io(e.to_string()))?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| TransportError::Io(e.to_string()))?;

        info!(path = %path.display(), bytes = bytes.len(), "本地传输: 投放完成");
        Ok(())
    }
}
