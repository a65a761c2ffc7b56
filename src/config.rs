use anyhow::Result;
use sea_orm::Database;

use crate::auth::AuthConfig;
use crate::schemas::AppState;

/// Initialize application state from a database URL and the environment.
pub async fn initialize_app_state_with_url(database_url: &str) -> Result<AppState> {
    // Load configuration
    dotenvy::dotenv().ok();

    // Connect to database
    tracing::info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;

    let auth = AuthConfig::from_env();

    Ok(AppState { db, auth })
}
