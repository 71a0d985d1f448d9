// ==========================================
// 库存同步系统 - 配置管理器
// ==========================================
// 职责: 同步配置的加载、校验与运行期只读访问
// 存储: JSON 配置文件（serde_json）
// 红线: 校验失败视为运行级故障,发生在 Pending 之前
// ==========================================

use crate::config::source_mapping::SourceMapping;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::info;

// ==========================================
// 配置错误
// ==========================================
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("配置解析失败: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("配置校验失败: {0}")]
    Invalid(String),
}

// ==========================================
// SupplierSource - 供应商数据源
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierSource {
    pub id: String,          // 供应商 ID（如 FOURNISSEUR_A）
    pub remote_path: String, // 传输层取件路径
    pub mapping: SourceMapping,
}

// ==========================================
// PlatformTarget - 平台目标
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformTarget {
    pub id: String,          // 平台 ID（如 PLATFORM_A）
    pub remote_path: String, // 传输层投放路径
    pub mapping: SourceMapping,
}

// ==========================================
// SyncConfig - 全量同步配置
// ==========================================
// suppliers 的声明顺序即合并优先级: 越靠后的供应商
// 对同一 item_id 的报数覆盖越靠前的（覆盖而非累加）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub suppliers: Vec<SupplierSource>,
    pub platforms: Vec<PlatformTarget>,

    /// 工作池并发上限（供应商阶段与平台阶段共用）
    #[serde(default = "default_max_parallel_jobs")]
    pub max_parallel_jobs: usize,

    /// 单次传输操作（取件/投放）超时秒数
    #[serde(default = "default_transport_timeout_secs")]
    pub transport_timeout_secs: u64,
}

fn default_max_parallel_jobs() -> usize {
    4
}

fn default_transport_timeout_secs() -> u64 {
    30
}

impl SyncConfig {
    pub fn transport_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.transport_timeout_secs)
    }
}

// ==========================================
// RunOptions - 单次运行参数
// ==========================================
// 试运行 + 范围过滤由调用方（入口/调度器）传入
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub dry_run: bool,                // true = 不触网、不推进基线
    pub supplier_scope: Vec<String>,  // 空 = 全部配置内供应商
    pub platform_scope: Vec<String>,  // 空 = 全部配置内平台
}

impl RunOptions {
    pub fn includes_supplier(&self, id: &str) -> bool {
        self.supplier_scope.is_empty() || self.supplier_scope.iter().any(|s| s == id)
    }

    pub fn includes_platform(&self, id: &str) -> bool {
        self.platform_scope.is_empty() || self.platform_scope.iter().any(|s| s == id)
    }
}

// ==========================================
// ConfigManager - 配置加载入口
// ==========================================
pub struct ConfigManager;

impl ConfigManager {
    /// 从 JSON 文件加载并校验同步配置
    ///
    /// # 参数
    /// - path: 配置文件路径
    ///
    /// # 返回
    /// - Ok(SyncConfig): 校验通过的配置
    /// - Err(ConfigError): 读取/解析/校验失败
    pub fn load<P: AsRef<Path>>(path: P) -> Result<SyncConfig, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&raw)?;
        info!(
            suppliers = config.suppliers.len(),
            platforms = config.platforms.len(),
            "同步配置加载完成"
        );
        Ok(config)
    }

    /// 从 JSON 字符串加载并校验（测试与嵌入场景）
    pub fn from_json(raw: &str) -> Result<SyncConfig, ConfigError> {
        let config: SyncConfig = serde_json::from_str(raw)?;
        Self::validate(&config)?;
        Ok(config)
    }

    fn validate(config: &SyncConfig) -> Result<(), ConfigError> {
        if config.max_parallel_jobs == 0 {
            return Err(ConfigError::Invalid(
                "max_parallel_jobs 必须大于 0".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for supplier in &config.suppliers {
            Self::validate_entity("供应商", &supplier.id, &supplier.mapping, &mut seen)?;
        }

        let mut seen = HashSet::new();
        for platform in &config.platforms {
            Self::validate_entity("平台", &platform.id, &platform.mapping, &mut seen)?;
        }

        Ok(())
    }

    fn validate_entity(
        kind: &str,
        id: &str,
        mapping: &SourceMapping,
        seen: &mut HashSet<String>,
    ) -> Result<(), ConfigError> {
        if id.trim().is_empty() {
            return Err(ConfigError::Invalid(format!("{} ID 不能为空", kind)));
        }
        if !seen.insert(id.to_string()) {
            return Err(ConfigError::Invalid(format!("{} ID 重复: {}", kind, id)));
        }
        if mapping.item_id.header.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "{} {} 的 item_id 首选表头不能为空",
                kind, id
            )));
        }
        if mapping.quantity.header.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "{} {} 的 quantity 首选表头不能为空",
                kind, id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> String {
        r#"{
            "suppliers": [
                {
                    "id": "FOURNISSEUR_A",
                    "remote_path": "fournisseur_a/stock.csv",
                    "mapping": {"item_id": {"header": "SKU"}, "quantity": {"header": "Qty"}}
                }
            ],
            "platforms": [
                {
                    "id": "PLATFORM_A",
                    "remote_path": "platform_a/products.csv",
                    "mapping": {"item_id": {"header": "id"}, "quantity": {"header": "qty"}}
                }
            ]
        }"#
        .to_string()
    }

    #[test]
    fn test_from_json_with_defaults() {
        let config = ConfigManager::from_json(&sample_json()).unwrap();
        assert_eq!(config.suppliers.len(), 1);
        assert_eq!(config.max_parallel_jobs, 4);
        assert_eq!(config.transport_timeout_secs, 30);
    }

    #[test]
    fn test_duplicate_supplier_id_rejected() {
        let json = r#"{
            "suppliers": [
                {"id": "A", "remote_path": "a.csv", "mapping": {"item_id": {"header": "SKU"}, "quantity": {"header": "Qty"}}},
                {"id": "A", "remote_path": "b.csv", "mapping": {"item_id": {"header": "SKU"}, "quantity": {"header": "Qty"}}}
            ],
            "platforms": []
        }"#;
        let err = ConfigManager::from_json(json).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_empty_quantity_header_rejected() {
        let json = r#"{
            "suppliers": [
                {"id": "A", "remote_path": "a.csv", "mapping": {"item_id": {"header": "SKU"}, "quantity": {"header": "  "}}}
            ],
            "platforms": []
        }"#;
        assert!(ConfigManager::from_json(json).is_err());
    }

    #[test]
    fn test_zero_parallel_jobs_rejected() {
        let json = r#"{"suppliers": [], "platforms": [], "max_parallel_jobs": 0}"#;
        assert!(ConfigManager::from_json(json).is_err());
    }

    #[test]
    fn test_run_options_scope_filters() {
        let all = RunOptions::default();
        assert!(all.includes_supplier("FOURNISSEUR_A"));
        assert!(all.includes_platform("PLATFORM_A"));

        let scoped = RunOptions {
            dry_run: false,
            supplier_scope: vec!["FOURNISSEUR_B".to_string()],
            platform_scope: vec!["PLATFORM_A".to_string()],
        };
        assert!(!scoped.includes_supplier("FOURNISSEUR_A"));
        assert!(scoped.includes_supplier("FOURNISSEUR_B"));
        assert!(scoped.includes_platform("PLATFORM_A"));
    }
}
