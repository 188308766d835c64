//! Business logic services

pub mod history;
pub mod items;
pub mod peripherals;
pub mod users;

use std::sync::Arc;

use crate::{
    config::AuthConfig,
    repository::{HistoryStore, ItemStore, PeripheralStore, Repository, UserStore},
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub items: items::ItemsService,
    pub peripherals: peripherals::PeripheralsService,
    pub history: history::HistoryService,
}

impl Services {
    /// Create all services over one repository
    pub fn new(repository: Repository, auth_config: AuthConfig) -> Self {
        let repository = Arc::new(repository);
        Self::from_stores(
            repository.clone(),
            repository.clone(),
            repository.clone(),
            repository,
            auth_config,
        )
    }

    /// Create all services over separate stores
    pub fn from_stores(
        users: Arc<dyn UserStore>,
        items: Arc<dyn ItemStore>,
        peripherals: Arc<dyn PeripheralStore>,
        history: Arc<dyn HistoryStore>,
        auth_config: AuthConfig,
    ) -> Self {
        Self {
            users: users::UsersService::new(users, auth_config),
            items: items::ItemsService::new(items.clone(), peripherals.clone()),
            peripherals: peripherals::PeripheralsService::new(peripherals),
            history: history::HistoryService::new(history, items),
        }
    }
}
