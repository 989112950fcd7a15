use axum::extract::{FromRequest, FromRequestParts};

use crate::error::Error;

/// JSON 请求体，反序列化失败时返回 `{"detail": ...}` 格式的错误
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct Json<T>(pub T);

/// 查询参数，解析失败同样返回 `{"detail": ...}`
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum_extra::extract::Query), rejection(Error))]
pub struct Query<T>(pub T);
