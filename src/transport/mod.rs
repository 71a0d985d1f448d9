// ==========================================
// 库存同步系统 - 传输层接口
// ==========================================
// 职责: 定义取件/投放能力的抽象接口
// 红线: 核心不做重试,单次失败即本次运行内终局
// 说明: FTP/SFTP 等具体实现属外部协作方,核心仅消费该能力
// ==========================================

pub mod local_dir;

use async_trait::async_trait;
use thiserror::Error;

pub use local_dir::LocalDirTransport;

// ==========================================
// 传输错误
// ==========================================
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("远端不可达: {0}")]
    Unreachable(String),

    #[error("远端文件不存在: {0}")]
    NotFound(String),

    #[error("传输失败: {0}")]
    Io(String),
}

// ==========================================
// Transport Trait
// ==========================================
// 用途: 供应商取件与平台投放的统一通道
// 实现者: LocalDirTransport（内置）、FTP/SFTP 适配器（外部）
#[async_trait]
pub trait Transport: Send + Sync {
    /// 取回远端文件的完整字节
    ///
    /// # 参数
    /// - remote_path: 远端相对路径
    ///
    /// # 返回
    /// - Ok(Vec<u8>): 文件内容
    /// - Err(TransportError): 连接/路径/读取失败
    async fn fetch(&self, remote_path: &str) -> Result<Vec<u8>, TransportError>;

    /// 将字节投放到远端路径（确认写入完成后才返回 Ok）
    ///
    /// # 参数
    /// - remote_path: 远端相对路径
    /// - bytes: 待投放内容
    async fn upload(&self, remote_path: &str, bytes: &[u8]) -> Result<(), TransportError>;
}
