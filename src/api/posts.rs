use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use serde::Deserialize;

use super::extract::Query;
use crate::{
    app::App,
    content::{Language, Post},
    error::{Error, Result},
    storage::{PageRequest, PostFilter, PostPage, TagCount},
};

/// 公开文章路由
///
/// - `GET /posts`：已发布文章列表
/// - `GET /posts/tags/all`：标签统计
/// - `GET /posts/{slug}`：单篇已发布文章
pub fn setup_route() -> Router<App> {
    Router::new()
        .route("/posts", get(post_list))
        .route("/posts/tags/all", get(tag_list))
        .route("/posts/{slug}", get(post))
}

/// 列表查询参数
///
/// `lang` 没有匹配结果时不做回退，由客户端去掉 `lang` 重新请求。
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListParams {
    lang: Option<String>,
    tag: Option<String>,
    q: Option<String>,
    page: Option<u32>,
    per_page: Option<u32>,
}

async fn post_list(
    State(app): State<App>,
    Query(params): Query<ListParams>,
) -> Result<Json<PostPage>> {
    let language = match params.lang.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(code) => Some(code.parse::<Language>()?),
    };

    let filter = PostFilter::published()
        .tag(params.tag)
        .query(params.q)
        .language(language);
    let page = PageRequest::new(params.page, params.per_page);

    app.posts().list(&filter, page).await.map(Json)
}

/// 根据 slug 获取文章，草稿同样返回 [`Error::NotFound`]
async fn post(State(app): State<App>, Path(slug): Path<String>) -> Result<Json<Post>> {
    let post = app.posts().get_by_slug(&slug).await?;
    if !post.is_published() {
        return Err(Error::NotFound);
    }
    Ok(Json(post))
}

async fn tag_list(State(app): State<App>) -> Result<Json<Vec<TagCount>>> {
    app.posts().list_tags().await.map(Json)
}
