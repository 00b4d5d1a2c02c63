pub mod add_stock;
pub mod edit_stock;
pub mod rules;
pub mod stock_form;

pub use add_stock::AddStock;
pub use edit_stock::EditStock;
pub use rules::{FieldError, FieldKind, FieldRule, FieldValue, StockField, CREATE_RULES, EDIT_RULES};
pub use stock_form::{StockForm, StockFormValues, ValidatedStock};
