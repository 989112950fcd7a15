pub mod api;
pub mod app;
pub mod config;
pub mod content;
pub mod error;
pub mod generate;
pub mod notify;
pub mod storage;

use tracing_subscriber::{EnvFilter, fmt::time::ChronoLocal};

use app::App;
use config::Config;

pub async fn run() -> error::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f".to_string()))
        .with_env_filter(EnvFilter::from_env("PSYTECH_LOG"))
        .init();

    let config = Config::load()?;
    let app = App::from_config(&config).await?;

    api::run_server(app, &config).await
}
