// ==========================================
// 库存同步系统 - 基线仓库实现
// ==========================================
// 职责: 每平台唯一活动基线文件 + 带时间戳的备份历史
// 目录: <root>/<platform>/<文件>          基线（唯一活动副本）
//       <root>/backups/<时间戳>/<platform>/<文件>   备份
// 推进协议: 同目录写临时文件 → rename 原子替换,
//           绝不原地截断
// ==========================================

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 支持的基线扩展名（查找顺序）
const SUPPORTED_EXTS: [&str; 4] = ["csv", "txt", "xlsx", "xls"];

/// 备份会话时间戳格式
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

pub struct BaselineStore {
    root: PathBuf,
}

impl BaselineStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn platform_dir(&self, platform_id: &str) -> PathBuf {
        self.root.join(platform_id)
    }

    fn backups_dir(&self) -> PathBuf {
        self.root.join("backups")
    }

    /// 查找平台当前活动基线文件
    ///
    /// # 返回
    /// - Ok(PathBuf): 平台子目录内第一个受支持扩展名的文件
    /// - Err: 子目录缺失或无受支持文件
    pub fn baseline_path(&self, platform_id: &str) -> io::Result<PathBuf> {
        let dir = self.platform_dir(platform_id);
        if !dir.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("平台基线目录不存在: {}", dir.display()),
            ));
        }

        let mut entries: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.is_file()
                    && p.extension()
                        .and_then(|x| x.to_str())
                        .map(|x| SUPPORTED_EXTS.contains(&x.to_lowercase().as_str()))
                        .unwrap_or(false)
            })
            .collect();
        entries.sort();

        entries.into_iter().next().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("平台 {} 无基线文件", platform_id),
            )
        })
    }

    /// 读取当前基线内容
    pub fn read(&self, platform_id: &str) -> io::Result<Vec<u8>> {
        let path = self.baseline_path(platform_id)?;
        debug!(platform = %platform_id, path = %path.display(), "读取基线");
        fs::read(path)
    }

    /// 将当前基线复制到带时间戳的备份位置
    ///
    /// # 参数
    /// - platform_id: 平台 ID
    /// - timestamp: 备份会话时间戳（同一次运行内各平台各自生成）
    ///
    /// # 返回
    /// - Ok(PathBuf): 备份文件路径
    pub fn backup(&self, platform_id: &str, timestamp: &str) -> io::Result<PathBuf> {
        let baseline = self.baseline_path(platform_id)?;
        let file_name = baseline
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "基线文件名无效"))?;

        let backup_dir = self.backups_dir().join(timestamp).join(platform_id);
        fs::create_dir_all(&backup_dir)?;

        let backup_path = backup_dir.join(file_name);
        fs::copy(&baseline, &backup_path)?;

        info!(
            platform = %platform_id,
            backup = %backup_path.display(),
            "基线备份完成"
        );
        Ok(backup_path)
    }

    /// 原子推进基线到新内容
    ///
    /// 同目录写入临时文件后 rename 替换,失败时旧基线保持
    /// 完整可读（rename 在同一文件系统内是原子替换）。
    pub fn promote(&self, platform_id: &str, bytes: &[u8]) -> io::Result<()> {
        let baseline = self.baseline_path(platform_id)?;
        let dir = baseline
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "基线路径无父目录"))?;

        let tmp_path = dir.join(".baseline.tmp");
        fs::write(&tmp_path, bytes)?;
        fs::rename(&tmp_path, &baseline)?;

        info!(
            platform = %platform_id,
            path = %baseline.display(),
            bytes = bytes.len(),
            "基线已推进"
        );
        Ok(())
    }

    /// 生成备份会话时间戳
    pub fn backup_timestamp() -> String {
        chrono::Local::now().format(BACKUP_TIMESTAMP_FORMAT).to_string()
    }

    /// 列出某平台的全部备份文件（测试与运维巡检用）
    pub fn list_backups(&self, platform_id: &str) -> io::Result<Vec<PathBuf>> {
        let backups_root = self.backups_dir();
        if !backups_root.is_dir() {
            return Ok(Vec::new());
        }

        let mut found = Vec::new();
        for session in fs::read_dir(&backups_root)? {
            let session_dir = session?.path().join(platform_id);
            if !session_dir.is_dir() {
                continue;
            }
            for entry in fs::read_dir(&session_dir)? {
                let path = entry?.path();
                if path.is_file() {
                    found.push(path);
                }
            }
        }
        found.sort();
        Ok(found)
    }
}
