use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue};
use reqwest::header;
use serde::Serialize;

use super::Generator;
use crate::{
    content::Language,
    error::{Error, Result},
};

/// 通过 HTTP 调用生成服务
///
/// 请求体为 `{"language": "<code>"}`，响应体为 Markdown 文本。
#[derive(Clone)]
pub struct HttpGenerator {
    client: reqwest::Client,
    url: String,
}

#[derive(Serialize)]
struct RequestBody<'a> {
    language: &'a str,
}

impl HttpGenerator {
    /// 使用生成服务地址与可选的 Bearer Token 创建客户端
    ///
    /// ```ignore
    /// let generator = HttpGenerator::new("https://generator.internal/posts", Some("token"))?;
    /// ```
    pub fn new(url: impl Into<String>, token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/markdown"));
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| Error::Config("invalid generator key".to_string()))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .default_headers(headers)
            // 生成可能较慢
            .timeout(std::time::Duration::from_secs(300))
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn generate(&self, language: Language) -> Result<String> {
        let resp = self
            .client
            .post(&self.url)
            .json(&RequestBody {
                language: language.as_str(),
            })
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.text().await?)
    }
}
