mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use eclipse_api::{AppState, AppStateInner};
use eclipse_media::MediaStore;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eclipse=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env();

    // Init database and media store
    let db = eclipse_db::Database::open(&config.db_path)?;
    let media = MediaStore::new(config.media_dir.clone(), config.media_base_url.clone()).await?;

    let state: AppState = Arc::new(AppStateInner { db, media });

    // Every endpoint answers OPTIONS with permissive CORS headers.
    let app = eclipse_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Eclipse server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
