mod email;
mod webhook;

use async_trait::async_trait;

use crate::{
    content::{Contact, Post},
    error::Result,
};

pub use self::{email::ResendMailer, webhook::WebhookNotifier};

/// 文章发布通知
#[async_trait]
pub trait PublishHook: Send + Sync {
    async fn post_published(&self, post: &Post) -> Result<()>;
}

/// 联系请求通知
#[async_trait]
pub trait ContactNotifier: Send + Sync {
    async fn contact_submitted(&self, contact: &Contact) -> Result<()>;
}

fn http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .timeout(std::time::Duration::from_secs(10))
        .build()?)
}
