// ==========================================
// 库存同步系统 - 导入层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: IngestError 仅表达文件级失败,行级质量问题
//       以计数与告警形式携带,不作为错误传播
// ==========================================

use thiserror::Error;

// ==========================================
// MappingError - 列解析错误
// ==========================================
// 语义: 无候选可解析,或同一候选命中多列（歧义）
// 红线: 歧义是硬失败,绝不按列序静默选取
//       （静默选列曾导致错误数量写入线上平台文件）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("字段 {field} 无法解析: 候选均未命中,可用表头: {available_headers:?}")]
    Unresolved {
        field: String,
        available_headers: Vec<String>,
    },

    #[error("字段 {field} 解析歧义: 候选 '{candidate}' 命中多列,可用表头: {available_headers:?}")]
    Ambiguous {
        field: String,
        candidate: String,
        available_headers: Vec<String>,
    },
}

// ==========================================
// IngestError - 供应商导入错误（文件级）
// ==========================================
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("传输失败: {0}")]
    Transport(String),

    #[error("文件格式错误: {0}")]
    Format(String),

    #[error("列映射失败: {0}")]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<csv::Error>
impl From<csv::Error> for IngestError {
    fn from(err: csv::Error) -> Self {
        IngestError::Format(format!("CSV 解析失败: {}", err))
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        IngestError::Format(format!("文件读取失败: {}", err))
    }
}

/// Result 类型别名
pub type IngestResult<T> = Result<T, IngestError>;
