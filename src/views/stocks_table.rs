use chrono::NaiveDate;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{info, warn};

use crate::forms::EditStock;
use crate::models::{StockRecord, StocksPage};
use crate::services::query_cache::STOCKS_QUERY_KEY;
use crate::state::AppState;

pub const COLUMNS: [&str; 7] = [
    "ID",
    "Symbol",
    "Quantity",
    "Purchase Price",
    "Current Price",
    "Purchase Date",
    "Actions",
];
pub const PLACEHOLDER_ROWS: usize = 5;
pub const NOT_AVAILABLE: &str = "N/A";

const PLACEHOLDER_CELL: &str = "...";
const ACTIONS_CELL: &str = "[Edit]";

#[derive(Debug, Clone, PartialEq)]
pub enum TableBody {
    Loading,
    Failed(String),
    Loaded(StocksPage),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableRow {
    Placeholder { cells: usize },
    Error { colspan: usize, message: String },
    Stock(StockRow),
}

/// One rendered record. `stock` is kept so the row's actions can open the edit modal.
#[derive(Debug, Clone, PartialEq)]
pub struct StockRow {
    pub cells: [String; 6],
    pub stock: StockRecord,
}

impl StockRow {
    pub fn new(stock: &StockRecord, date_format: &str) -> Self {
        Self {
            cells: [
                stock.id.to_string(),
                stock.symbol.clone(),
                stock.quantity.to_string(),
                format_price(stock.purchase_price),
                // A zero price means none was quoted yet.
                stock
                    .current_price
                    .filter(|price| *price != 0.0)
                    .map(format_price)
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                format_date(stock.purchase_date, date_format),
            ],
            stock: stock.clone(),
        }
    }

    /// Edit action of the row's menu.
    pub fn edit_form(&self) -> EditStock {
        let mut modal = EditStock::new(&self.stock);
        modal.open();
        modal
    }
}

pub fn format_price(price: f64) -> String {
    format!("{:.2}", price)
}

pub fn format_date(date: NaiveDate, date_format: &str) -> String {
    date.format(date_format).to_string()
}

/// Stock list view. Holds its own invalidation subscription so a settled mutation
/// anywhere on the screen leads to a re-fetch here.
pub struct StocksTable {
    body: TableBody,
    date_format: String,
    invalidations: broadcast::Receiver<String>,
}

impl StocksTable {
    pub fn new(state: &AppState) -> Self {
        Self {
            body: TableBody::Loading,
            date_format: state.date_format.clone(),
            invalidations: state.cache.subscribe(),
        }
    }

    pub fn body(&self) -> &TableBody {
        &self.body
    }

    /// Reads the stock list through the cache. Errors become the table's error row
    /// instead of propagating.
    pub async fn load(&mut self, state: &AppState) {
        let api = state.api.clone();
        match state.cache.fetch(STOCKS_QUERY_KEY, || async move { api.list().await }).await {
            Ok(page) => {
                info!("Loaded {} stocks", page.data.len());
                self.body = TableBody::Loaded(page);
            }
            Err(e) => {
                warn!("Failed to load stocks: {}", e);
                self.body = TableBody::Failed(e.to_string());
            }
        }
    }

    /// Re-fetches when the stock list was invalidated since the last call. Returns
    /// whether a fetch happened.
    pub async fn refresh_if_invalidated(&mut self, state: &AppState) -> bool {
        let mut invalidated = false;
        loop {
            match self.invalidations.try_recv() {
                Ok(key) => invalidated |= key == STOCKS_QUERY_KEY,
                // Missed notifications may have included ours.
                Err(TryRecvError::Lagged(_)) => invalidated = true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        if invalidated {
            self.load(state).await;
        }
        invalidated
    }

    pub fn rows(&self) -> Vec<TableRow> {
        match &self.body {
            TableBody::Loading => (0..PLACEHOLDER_ROWS)
                .map(|_| TableRow::Placeholder {
                    cells: COLUMNS.len(),
                })
                .collect(),
            TableBody::Failed(message) => vec![TableRow::Error {
                colspan: COLUMNS.len(),
                message: format!("Something went wrong: {}", message),
            }],
            TableBody::Loaded(page) => page
                .data
                .iter()
                .map(|stock| TableRow::Stock(StockRow::new(stock, &self.date_format)))
                .collect(),
        }
    }

    /// Plain-text rendering with a header line and one line per row.
    pub fn render(&self) -> String {
        let rows = self.rows();
        let mut lines: Vec<Vec<String>> = Vec::with_capacity(rows.len() + 1);
        lines.push(COLUMNS.iter().map(|c| c.to_string()).collect());

        let mut spans = Vec::new();
        for row in &rows {
            match row {
                TableRow::Placeholder { cells } => {
                    lines.push(vec![PLACEHOLDER_CELL.to_string(); *cells]);
                }
                TableRow::Stock(stock) => {
                    let mut cells = stock.cells.to_vec();
                    cells.push(ACTIONS_CELL.to_string());
                    lines.push(cells);
                }
                TableRow::Error { message, .. } => spans.push(message.clone()),
            }
        }

        let mut widths = [0usize; 7];
        for line in &lines {
            for (width, cell) in widths.iter_mut().zip(line) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        for line in &lines {
            let padded: Vec<String> = line
                .iter()
                .zip(widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = width))
                .collect();
            out.push_str(padded.join(" | ").trim_end());
            out.push('\n');
        }
        for message in spans {
            out.push_str(&message);
            out.push('\n');
        }
        out
    }
}
