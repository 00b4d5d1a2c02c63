pub mod stocks_table;

pub use stocks_table::{StockRow, StocksTable, TableBody, TableRow};
