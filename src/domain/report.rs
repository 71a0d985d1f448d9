// ==========================================
// 库存同步系统 - 运行报告模型
// ==========================================
// 职责: 任务结果与运行报告的值对象
// 红线: 报告必须枚举每个配置内任务的结局
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// JobKind / JobStatus - 任务类别与状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Supplier, // 供应商导入任务
    Platform, // 平台渲染+发布任务
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Success,
    Failure,
}

// ==========================================
// RunState - 运行状态机
// ==========================================
// 状态序列: Pending → IngestingSuppliers → Merging
//           → RenderingAndPublishing → Completed
// 红线: 不允许跳过任何状态；任务失败不阻止到达 Completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Pending,
    IngestingSuppliers,
    Merging,
    RenderingAndPublishing,
    Completed,
}

// ==========================================
// JobCounts - 任务计数
// ==========================================
// 供应商任务: read=读取行数, matched=产出记录数, updated=0
// 平台任务:   read=基线行数, matched=命中账本行数, updated=实际改写行数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCounts {
    pub read: usize,
    pub matched: usize,
    pub updated: usize,
}

// ==========================================
// JobResult - 单任务结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: String,    // 供应商或平台 ID
    pub kind: JobKind,
    pub status: JobStatus,
    pub detail: String,    // 成功摘要或失败原因
    pub counts: JobCounts,
}

impl JobResult {
    pub fn success(
        job_id: impl Into<String>,
        kind: JobKind,
        detail: impl Into<String>,
        counts: JobCounts,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            kind,
            status: JobStatus::Success,
            detail: detail.into(),
            counts,
        }
    }

    pub fn failure(job_id: impl Into<String>, kind: JobKind, detail: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            kind,
            status: JobStatus::Failure,
            detail: detail.into(),
            counts: JobCounts::default(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Success
    }
}

// ==========================================
// RunReport - 运行终态产物
// ==========================================
// 用途: 交付下游报告/通知系统（格式化与投递不在本系统内）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,                 // 本次运行唯一标识
    pub state: RunState,                // 终态（正常运行恒为 Completed）
    pub dry_run: bool,                  // 是否试运行
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub jobs: Vec<JobResult>,           // 按配置顺序: 先供应商后平台
    pub success: bool,                  // 全部任务成功才为 true
}

impl RunReport {
    pub fn failed_jobs(&self) -> impl Iterator<Item = &JobResult> {
        self.jobs.iter().filter(|j| !j.is_success())
    }
}
