mod admin;
mod auth;
mod contact;
mod extract;
mod posts;

use axum::{
    Json, Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use serde_json::{Value, json};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{app::App, config::Config, error::Result, generate::Scheduler};

pub use self::auth::Admin;

/// 组装全部路由，挂载在 `/api` 下
///
/// - 公开：`/posts`、`/posts/{slug}`、`/posts/tags/all`、`/contact`、`/health`
/// - 管理：`/admin/...`，需要管理员凭证
pub fn setup_route(app: App) -> Router {
    let api = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(posts::setup_route())
        .merge(contact::setup_route())
        .nest("/admin", admin::setup_route());

    let router = Router::new()
        .route("/api/", get(root))
        .nest("/api", api)
        .with_state(app);

    add_middlewares(router)
}

/// 启动 HTTP 服务，同时启动定时生成任务
pub async fn run_server(app: App, config: &Config) -> Result<()> {
    Scheduler::start(app.clone());

    let router = setup_route(app).layer(cors_layer(&config.cors_origins));

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    tracing::info!("Listening on {}", config.bind);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "PsyTech API is running" }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": "PsyTech API" }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(%e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

fn add_middlewares(router: Router) -> Router {
    fn log_failure(
        err: tower_http::classify::ServerErrorsFailureClass,
        _latency: std::time::Duration,
        _span: &tracing::Span,
    ) {
        tracing::error!(error = %err, "request failed");
    }

    router.layer(
        TraceLayer::new_for_http()
            .on_failure(log_failure)
            .on_request(|_req: &_, _span: &tracing::Span| {}),
    )
}
