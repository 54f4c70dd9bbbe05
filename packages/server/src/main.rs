use std::sync::Arc;

use media::storage::FilesystemMediaStore;
use tracing::{Level, info};

use faculty_server::config::AppConfig;
use faculty_server::database::init_db;
use faculty_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;
    let db = init_db(&config.database).await?;
    let store = FilesystemMediaStore::from_config(&config.storage).await?;

    let state = AppState {
        db,
        media_root: store.root().to_path_buf(),
        media: Arc::new(store),
        config: config.clone(),
    };
    let app = faculty_server::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
