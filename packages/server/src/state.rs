use std::path::PathBuf;
use std::sync::Arc;

use media::storage::MediaStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub media: Arc<dyn MediaStore>,
    /// Directory served under the public media prefix.
    pub media_root: PathBuf,
    pub config: AppConfig,
}
