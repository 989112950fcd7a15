use async_trait::async_trait;
use serde::Serialize;

use super::{PublishHook, http_client};
use crate::{content::Post, error::Result};

/// 发布时向外部地址推送 `post.published` 事件
#[derive(Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

#[derive(Serialize)]
struct WebhookEvent<'a> {
    event: &'a str,
    post: &'a Post,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl PublishHook for WebhookNotifier {
    async fn post_published(&self, post: &Post) -> Result<()> {
        self.client
            .post(&self.url)
            .json(&WebhookEvent {
                event: "post.published",
                post,
            })
            .send()
            .await?
            .error_for_status()?;

        tracing::info!(slug = %post.slug, "publish webhook delivered");
        Ok(())
    }
}
