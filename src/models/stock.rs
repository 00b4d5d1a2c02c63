use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

pub type StockId = i64;

// Represents one holding as returned by the stocks API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub id: StockId,
    pub symbol: String,
    pub quantity: i32,
    pub purchase_price: f64,
    #[serde(default)]
    pub current_price: Option<f64>,
    pub purchase_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockCreate {
    pub symbol: String,
    pub quantity: i32,
    pub purchase_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    pub purchase_date: NaiveDate,
}

/// Partial update. Fields left as `None` are not sent and keep their stored value.
/// `current_price` is nullable: `Some(None)` is sent as `null` and clears the price.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "explicit_null"
    )]
    pub current_price: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<NaiveDate>,
}

// Keeps a present `null` apart from an absent field.
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StocksPage {
    pub data: Vec<StockRecord>,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl StockRecord {
    /// Applies a partial update the way the API does: only fields present in `update` change.
    pub fn apply(&mut self, update: StockUpdate) {
        if let Some(symbol) = update.symbol {
            self.symbol = symbol;
        }
        if let Some(quantity) = update.quantity {
            self.quantity = quantity;
        }
        if let Some(purchase_price) = update.purchase_price {
            self.purchase_price = purchase_price;
        }
        if let Some(current_price) = update.current_price {
            self.current_price = current_price;
        }
        if let Some(purchase_date) = update.purchase_date {
            self.purchase_date = purchase_date;
        }
    }
}

impl StockCreate {
    pub fn into_record(self, id: StockId) -> StockRecord {
        StockRecord {
            id,
            symbol: self.symbol,
            quantity: self.quantity,
            purchase_price: self.purchase_price,
            current_price: self.current_price,
            purchase_date: self.purchase_date,
        }
    }
}
