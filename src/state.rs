use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    cache::{CacheStore, MenuCache},
    clock::Clock,
    order_number::OrderNumberGenerator,
};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub clock: Arc<dyn Clock>,
    pub order_numbers: Arc<dyn OrderNumberGenerator>,
    pub menu_cache: MenuCache,
}

impl AppState {
    pub fn new(
        orm: DatabaseConnection,
        clock: Arc<dyn Clock>,
        order_numbers: Arc<dyn OrderNumberGenerator>,
        cache_store: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            orm,
            clock,
            order_numbers,
            menu_cache: MenuCache::new(cache_store),
        }
    }
}
