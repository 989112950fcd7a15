use std::{env, time::Duration};

use serde::Deserialize;

use crate::{
    content::Language,
    error::{Error, Result},
};

/// 服务配置
///
/// 先读取 `PSYTECH_CONFIG` 指向的 TOML 文件（可选），再用环境变量覆盖。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind: String,
    pub admin_password: Option<String>,
    pub database_url: Option<String>,
    pub cors_origins: Vec<String>,
    pub webhook_url: Option<String>,
    pub generator_url: Option<String>,
    pub generator_key: Option<String>,
    pub generate_language: Language,
    pub generate_interval_hours: Option<u64>,
    pub auto_publish: bool,
    pub resend_api_key: Option<String>,
    pub sender_email: String,
    pub notification_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8001".to_string(),
            admin_password: None,
            database_url: None,
            cors_origins: vec!["*".to_string()],
            webhook_url: None,
            generator_url: None,
            generator_key: None,
            generate_language: Language::En,
            generate_interval_hours: None,
            auto_publish: false,
            resend_api_key: None,
            sender_email: "onboarding@resend.dev".to_string(),
            notification_email: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config = match env::var("PSYTECH_CONFIG") {
            Ok(path) => Self::from_toml(&std::fs::read_to_string(path)?)?,
            Err(_) => Self::default(),
        };
        config.with_overrides(|key| env::var(key).ok())
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 按变量名覆盖配置项，`lookup` 通常为 [`std::env::var`]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("PSYTECH_BIND") {
            self.bind = v;
        }
        if let Some(v) = var("ADMIN_PASSWORD") {
            self.admin_password = Some(v);
        }
        if let Some(v) = var("DATABASE_URL") {
            self.database_url = Some(v);
        }
        if let Some(v) = var("CORS_ORIGINS") {
            self.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Some(v) = var("PUBLISH_WEBHOOK_URL") {
            self.webhook_url = Some(v);
        }
        if let Some(v) = var("AI_GENERATOR_URL") {
            self.generator_url = Some(v);
        }
        if let Some(v) = var("AI_GENERATOR_KEY") {
            self.generator_key = Some(v);
        }
        if let Some(v) = var("AI_GENERATE_LANGUAGE") {
            self.generate_language = v.parse()?;
        }
        if let Some(v) = var("GENERATE_INTERVAL_HOURS") {
            let hours = v
                .trim()
                .parse::<u64>()
                .map_err(|_| Error::Config(format!("GENERATE_INTERVAL_HOURS: `{v}` is not a number")))?;
            self.generate_interval_hours = Some(hours);
        }
        if let Some(v) = var("AUTO_PUBLISH") {
            self.auto_publish = matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(v) = var("RESEND_API_KEY") {
            self.resend_api_key = Some(v);
        }
        if let Some(v) = var("SENDER_EMAIL") {
            self.sender_email = v;
        }
        if let Some(v) = var("NOTIFICATION_EMAIL") {
            self.notification_email = Some(v);
        }

        if self.admin_password.as_deref().is_none_or(str::is_empty) {
            return Err(Error::Config("ADMIN_PASSWORD not set".to_string()));
        }
        Ok(self)
    }

    pub fn admin_password(&self) -> &str {
        self.admin_password.as_deref().unwrap_or_default()
    }

    pub fn generate_interval(&self) -> Option<Duration> {
        self.generate_interval_hours
            .map(|h| Duration::from_secs(h.saturating_mul(3600)))
    }
}
