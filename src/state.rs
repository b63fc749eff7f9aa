use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::Config;

pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config) -> Arc<Self> {
        Arc::new(Self { db, config })
    }
}
