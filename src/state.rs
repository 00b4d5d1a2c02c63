use std::sync::Arc;

use crate::config::{ClientConfig, DEFAULT_DATE_FORMAT};
use crate::external::stocks_api::StocksApi;
use crate::models::StocksPage;
use crate::services::query_cache::QueryCache;
use crate::services::toast::Toaster;

/// Everything the stock screen shares between the table and the modals.
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn StocksApi>,
    pub cache: QueryCache<StocksPage>,
    pub toasts: Toaster,
    pub date_format: String,
}

impl AppState {
    pub fn new(api: Arc<dyn StocksApi>) -> Self {
        Self {
            api,
            cache: QueryCache::new(),
            toasts: Toaster::new(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }

    pub fn with_config(api: Arc<dyn StocksApi>, config: &ClientConfig) -> Self {
        Self {
            date_format: config.date_format.clone(),
            ..Self::new(api)
        }
    }
}
