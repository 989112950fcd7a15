use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde_json::{Value, json};

use super::{Admin, extract};
use crate::{
    app::App,
    content::{Contact, NewPost, Post, PostPatch},
    error::Result,
    generate::{SchedulerStatus, spawn_job},
};

/// 管理路由，全部要求管理员凭证
///
/// - `GET|POST /posts`
/// - `GET|PUT|DELETE /posts/{id}`
/// - `POST /posts/{id}/publish`、`POST /posts/{id}/unpublish`
/// - `POST /posts/generate-ai`
/// - `GET /contacts`
/// - `GET /scheduler/status`
pub fn setup_route() -> Router<App> {
    Router::new()
        .route("/posts", get(list_all).post(create))
        .route("/posts/generate-ai", post(generate_ai))
        .route("/posts/{id}", get(one).put(update).delete(remove))
        .route("/posts/{id}/publish", post(publish))
        .route("/posts/{id}/unpublish", post(unpublish))
        .route("/contacts", get(contacts))
        .route("/scheduler/status", get(scheduler_status))
}

async fn list_all(_: Admin, State(app): State<App>) -> Result<Json<Vec<Post>>> {
    app.posts().list_all().await.map(Json)
}

async fn create(_: Admin, State(app): State<App>, extract::Json(new): extract::Json<NewPost>) -> Result<Json<Post>> {
    let post = app.posts().create(new).await?;
    tracing::info!(id = %post.id, slug = %post.slug, "post created");
    Ok(Json(post))
}

/// 按 id 获取文章，草稿同样可见
async fn one(_: Admin, State(app): State<App>, Path(id): Path<String>) -> Result<Json<Post>> {
    app.posts().get(&id).await.map(Json)
}

async fn update(
    _: Admin,
    State(app): State<App>,
    Path(id): Path<String>,
    extract::Json(patch): extract::Json<PostPatch>,
) -> Result<Json<Post>> {
    app.posts().update(&id, patch).await.map(Json)
}

async fn remove(_: Admin, State(app): State<App>, Path(id): Path<String>) -> Result<Json<Value>> {
    app.posts().delete(&id).await?;
    tracing::info!(%id, "post deleted");
    Ok(Json(json!({ "message": "Post deleted" })))
}

async fn publish(_: Admin, State(app): State<App>, Path(id): Path<String>) -> Result<Json<Post>> {
    app.publish(&id).await.map(Json)
}

async fn unpublish(_: Admin, State(app): State<App>, Path(id): Path<String>) -> Result<Json<Post>> {
    app.unpublish(&id).await.map(Json)
}

/// 后台触发生成，立即返回；调用方稍后通过文章列表查看结果
async fn generate_ai(_: Admin, State(app): State<App>) -> Json<Value> {
    spawn_job(app);
    Json(json!({ "message": "AI post generation started in background" }))
}

async fn contacts(_: Admin, State(app): State<App>) -> Result<Json<Vec<Contact>>> {
    app.contacts().contacts().await.map(Json)
}

async fn scheduler_status(_: Admin, State(app): State<App>) -> Json<SchedulerStatus> {
    Json(app.scheduler_status())
}
