//! Shared application state for all routes. Built once at startup and read-only afterwards.

use crate::config::{AdminConfig, ResolvedModel};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub model: Arc<ResolvedModel>,
    pub config: Arc<AdminConfig>,
}

impl AppState {
    pub fn new(pool: SqlitePool, model: ResolvedModel, config: AdminConfig) -> Self {
        AppState {
            pool,
            model: Arc::new(model),
            config: Arc::new(config),
        }
    }
}
