mod client;
mod job;
mod scheduler;

use async_trait::async_trait;

use crate::{content::Language, error::Result};

pub use self::{
    client::HttpGenerator,
    job::{run_job, spawn_job},
    scheduler::{JOB_ID, JobInfo, Scheduler, SchedulerStatus},
};

/// 外部内容生成服务
///
/// 返回带 YAML Front Matter 的 Markdown 文档，解析见 [`crate::content::parse_generated`]。
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, language: Language) -> Result<String>;
}
