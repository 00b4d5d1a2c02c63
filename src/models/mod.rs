mod stock;

pub use stock::{Message, StockCreate, StockId, StockRecord, StockUpdate, StocksPage};
