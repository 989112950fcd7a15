use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use base64::{Engine, prelude::BASE64_STANDARD};
use subtle::ConstantTimeEq;

use crate::{app::App, error::Error};

/// 管理员凭证
///
/// 从 `Authorization: Basic base64(user:password)` 中取出密码，与配置的共享密码比较。
/// 用户名不参与校验。放在处理函数的第一个参数，确保在解析请求体之前完成鉴权。
#[derive(Debug, Clone, Copy)]
pub struct Admin;

impl FromRequestParts<App> for Admin {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, app: &App) -> Result<Self, Self::Rejection> {
        let password = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(basic_password)
            .ok_or(Error::Unauthorized)?;

        if bool::from(password.as_bytes().ct_eq(app.admin_password().as_bytes())) {
            Ok(Admin)
        } else {
            tracing::warn!("admin authentication failed");
            Err(Error::Unauthorized)
        }
    }
}

fn basic_password(header: &str) -> Option<String> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = BASE64_STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let (_user, password) = credentials.split_once(':')?;
    Some(password.to_string())
}
