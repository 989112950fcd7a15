use std::io;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use axum_extra::extract::QueryRejection;
use serde_json::json;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// 必填字段缺失或格式不正确
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// 请求体或查询参数无法解析，消息以出错字段开头
    #[error("{1}")]
    Rejected(StatusCode, String),

    #[error("Not Found")]
    NotFound,

    #[error("Invalid credentials")]
    Unauthorized,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    FrontMatter(&'static str),

    #[error("{0}")]
    Config(String),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Error::Validation {
            field,
            message: message.into(),
        }
    }
}

/// 去掉 axum 的通用前缀，保留 `<field>: <message>` 部分
fn rejection_message(body_text: String) -> String {
    match body_text.split_once(": ") {
        Some((_, rest)) if !rest.is_empty() => rest.to_string(),
        _ => body_text,
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        let status = match &rejection {
            JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => rejection.status(),
        };
        Error::Rejected(status, rejection_message(rejection.body_text()))
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::Rejected(
            StatusCode::BAD_REQUEST,
            rejection_message(rejection.body_text()),
        )
    }
}

fn detail(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (status, Json(json!({ "detail": message.into() }))).into_response()
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        match self {
            Error::Validation { .. } => detail(StatusCode::BAD_REQUEST, self.to_string()),
            Error::Rejected(status, msg) => detail(status, msg),
            Error::NotFound => detail(StatusCode::NOT_FOUND, "Not Found"),
            Error::Unauthorized => {
                let mut resp = detail(StatusCode::UNAUTHORIZED, "Invalid credentials");
                resp.headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Basic"));
                resp
            }
            Error::Conflict(msg) => detail(StatusCode::CONFLICT, msg),
            Error::Reqwest(e) => {
                tracing::error!(%e, "upstream request error");
                detail(StatusCode::BAD_GATEWAY, "Bad Gateway")
            }
            Error::FrontMatter(_) | Error::Yaml(_) => {
                tracing::error!(error = %self, "generated content rejected");
                detail(StatusCode::BAD_GATEWAY, "Bad Gateway")
            }
            Error::Sqlx(e) => {
                tracing::error!(%e, "sqlx error");
                detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
            Error::Io(e) => {
                tracing::error!(%e, "io error");
                detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
            Error::Config(_) | Error::Toml(_) => {
                tracing::error!(error = %self, "config error");
                detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }
}
