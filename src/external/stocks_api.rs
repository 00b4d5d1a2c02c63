use async_trait::async_trait;

use crate::errors::ApiError;
use crate::models::{Message, StockCreate, StockId, StockRecord, StockUpdate, StocksPage};

/// Remote collaborator holding the stock records.
#[async_trait]
pub trait StocksApi: Send + Sync {
    async fn list(&self) -> Result<StocksPage, ApiError>;

    async fn read(&self, id: StockId) -> Result<StockRecord, ApiError>;

    async fn create(&self, payload: StockCreate) -> Result<StockRecord, ApiError>;

    async fn update(&self, id: StockId, payload: StockUpdate) -> Result<StockRecord, ApiError>;

    async fn delete(&self, id: StockId) -> Result<Message, ApiError>;
}
