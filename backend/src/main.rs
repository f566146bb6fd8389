use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use homework_backend::access::CachedCourseAccess;
use homework_backend::api::router;
use homework_backend::config::AppConfig;
use homework_backend::db;
use homework_backend::lms::NoopLmsClient;
use homework_backend::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "homework_backend=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::new_from_env()?;

    let pool = db::connect(&config.database_url).await?;

    // the LMS HTTP client is wired in by the deployment; without one every
    // user is treated as having no LMS configured
    let state = AppState {
        db: pool.clone(),
        lms: Arc::new(NoopLmsClient),
        access: Arc::new(CachedCourseAccess::new(pool.clone())),
        reference_offset: config.reference_offset,
    };

    let app = router(state);

    info!("listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
