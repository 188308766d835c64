//! Equipment inventory server
//!
//! Tracks IT assets across branches: registration, edits, lending to staff,
//! returns, peripherals, and an audit trail entry for every change.

use std::sync::Arc;

pub mod api;
pub mod audit;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod validation;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    pub repository: repository::Repository,
}

impl AppState {
    pub fn new(config: AppConfig, repository: repository::Repository) -> Self {
        let services = services::Services::new(repository.clone(), config.auth.clone());
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
            repository,
        }
    }
}
