use std::{
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::run_job;
use crate::app::App;

pub const JOB_ID: &str = "ai_post_generation";

/// 定时生成任务
///
/// 未配置周期时不启动，`scheduler_running` 始终为 `false`。
#[derive(Debug, Default)]
pub struct Scheduler {
    interval: Option<Duration>,
    running: AtomicBool,
    next_run: Mutex<Option<DateTime<Utc>>>,
}

#[derive(Debug, Serialize)]
pub struct SchedulerStatus {
    pub scheduler_running: bool,
    pub auto_publish_enabled: bool,
    pub jobs: Vec<JobInfo>,
}

#[derive(Debug, Serialize)]
pub struct JobInfo {
    pub id: &'static str,
    pub name: String,
    pub next_run_time: Option<DateTime<Utc>>,
    pub trigger: String,
}

impl Scheduler {
    pub fn new(interval: Option<Duration>) -> Self {
        Self {
            interval: interval.filter(|d| !d.is_zero()),
            ..Default::default()
        }
    }

    /// 启动定时循环；重复调用无效
    pub fn start(app: App) {
        let scheduler = app.scheduler();
        let Some(interval) = scheduler.interval else {
            return;
        };
        if scheduler.running.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!(?interval, "ai post scheduler started");

        tokio::spawn(async move {
            loop {
                app.scheduler().set_next_run(interval);
                tokio::time::sleep(interval).await;

                match run_job(app.clone()).await {
                    Ok(post) => tracing::info!(slug = %post.slug, "scheduled generation finished"),
                    Err(e) => tracing::error!(%e, "scheduled generation failed"),
                }
            }
        });
    }

    fn set_next_run(&self, interval: Duration) {
        let next = chrono::Duration::from_std(interval)
            .ok()
            .and_then(|d| Utc::now().checked_add_signed(d));
        *self.next_run.lock().unwrap_or_else(|e| e.into_inner()) = next;
    }

    pub fn status(&self, auto_publish: bool) -> SchedulerStatus {
        let jobs = match self.interval {
            Some(interval) => vec![JobInfo {
                id: JOB_ID,
                name: format!("Generate AI blog post every {}", humanize(interval)),
                next_run_time: *self.next_run.lock().unwrap_or_else(|e| e.into_inner()),
                trigger: format!("interval[{}]", humanize(interval)),
            }],
            None => Vec::new(),
        };

        SchedulerStatus {
            scheduler_running: self.running.load(Ordering::SeqCst),
            auto_publish_enabled: auto_publish,
            jobs,
        }
    }
}

fn humanize(interval: Duration) -> String {
    let secs = interval.as_secs();
    if secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{secs}s")
    }
}
