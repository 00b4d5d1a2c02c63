/// Stock screen flows: create / edit modals, list view and the shared query cache,
/// driven against an in-memory stocks API.
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use reqwest::StatusCode;

use stock_admin::errors::{ApiError, SubmitError};
use stock_admin::external::stocks_api::StocksApi;
use stock_admin::forms::{AddStock, StockField};
use stock_admin::models::{Message, StockCreate, StockId, StockRecord, StockUpdate, StocksPage};
use stock_admin::services::query_cache::STOCKS_QUERY_KEY;
use stock_admin::services::toast::ToastStatus;
use stock_admin::state::AppState;
use stock_admin::views::{StocksTable, TableBody, TableRow};

// ---------------------------------------------------------------------------
// In-memory API
// ---------------------------------------------------------------------------

#[derive(Default)]
struct InMemoryStocks {
    stocks: Mutex<Vec<StockRecord>>,
    next_id: AtomicI64,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
    network_down: AtomicBool,
    bare_errors: AtomicBool,
}

impl InMemoryStocks {
    fn with(stocks: Vec<StockRecord>) -> Arc<Self> {
        let next = stocks.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        let api = Self::default();
        *api.stocks.lock() = stocks;
        api.next_id.store(next, Ordering::SeqCst);
        Arc::new(api)
    }

    fn fail(&self) -> Option<ApiError> {
        if self.network_down.load(Ordering::SeqCst) {
            return Some(ApiError::Network("connection refused".to_string()));
        }
        if self.bare_errors.load(Ordering::SeqCst) {
            return Some(ApiError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: None,
            });
        }
        None
    }
}

#[async_trait]
impl StocksApi for InMemoryStocks {
    async fn list(&self) -> Result<StocksPage, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.fail() {
            return Err(err);
        }
        let data = self.stocks.lock().clone();
        let count = data.len() as i64;
        Ok(StocksPage { data, count })
    }

    async fn read(&self, id: StockId) -> Result<StockRecord, ApiError> {
        self.stocks
            .lock()
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| ApiError::status(StatusCode::NOT_FOUND, "Stock not found"))
    }

    async fn create(&self, payload: StockCreate) -> Result<StockRecord, ApiError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.fail() {
            return Err(err);
        }
        let mut stocks = self.stocks.lock();
        if stocks.iter().any(|s| s.symbol == payload.symbol) {
            return Err(ApiError::status(StatusCode::BAD_REQUEST, "Symbol already exists"));
        }
        let record = payload.into_record(self.next_id.fetch_add(1, Ordering::SeqCst));
        stocks.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: StockId, payload: StockUpdate) -> Result<StockRecord, ApiError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.fail() {
            return Err(err);
        }
        let mut stocks = self.stocks.lock();
        let stock = stocks
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| ApiError::status(StatusCode::NOT_FOUND, "Stock not found"))?;
        stock.apply(payload);
        Ok(stock.clone())
    }

    async fn delete(&self, id: StockId) -> Result<Message, ApiError> {
        let mut stocks = self.stocks.lock();
        let before = stocks.len();
        stocks.retain(|s| s.id != id);
        if stocks.len() == before {
            return Err(ApiError::status(StatusCode::NOT_FOUND, "Stock not found"));
        }
        Ok(Message {
            message: "Stock deleted successfully".to_string(),
        })
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn existing() -> StockRecord {
    StockRecord {
        id: 1,
        symbol: "MSFT".to_string(),
        quantity: 10,
        purchase_price: 300.0,
        current_price: Some(412.5),
        purchase_date: date(2023, 5, 2),
    }
}

fn setup(stocks: Vec<StockRecord>) -> (Arc<InMemoryStocks>, AppState) {
    let api = InMemoryStocks::with(stocks);
    let state = AppState::new(api.clone());
    (api, state)
}

fn stock_rows(table: &StocksTable) -> Vec<[String; 6]> {
    table
        .rows()
        .into_iter()
        .filter_map(|row| match row {
            TableRow::Stock(row) => Some(row.cells),
            _ => None,
        })
        .collect()
}

fn fill(modal: &mut AddStock, symbol: &str, quantity: &str, price: &str, purchased: &str) {
    let form = modal.form_mut();
    form.set(StockField::Symbol, symbol);
    form.set(StockField::Quantity, quantity);
    form.set(StockField::PurchasePrice, price);
    form.set(StockField::PurchaseDate, purchased);
}

// ---------------------------------------------------------------------------
// List view
// ---------------------------------------------------------------------------

#[cfg(test)]
mod list_view {
    use super::*;

    #[tokio::test]
    async fn test_placeholders_before_first_fetch() {
        let (_, state) = setup(vec![]);
        let table = StocksTable::new(&state);

        let rows = table.rows();
        assert_eq!(rows.len(), 5);
        assert!(rows
            .iter()
            .all(|row| *row == TableRow::Placeholder { cells: 7 }));
    }

    #[tokio::test]
    async fn test_renders_one_row_per_record() {
        let (_, state) = setup(vec![existing()]);
        let mut table = StocksTable::new(&state);

        table.load(&state).await;

        let rows = stock_rows(&table);
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0],
            [
                "1".to_string(),
                "MSFT".to_string(),
                "10".to_string(),
                "300.00".to_string(),
                "412.50".to_string(),
                "5/2/2023".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_becomes_error_row() {
        let (api, state) = setup(vec![existing()]);
        api.network_down.store(true, Ordering::SeqCst);
        let mut table = StocksTable::new(&state);

        table.load(&state).await;

        assert_eq!(
            table.rows(),
            vec![TableRow::Error {
                colspan: 7,
                message: "Something went wrong: Network Error".to_string(),
            }]
        );
        assert!(table.render().contains("Something went wrong: Network Error"));
    }

    #[tokio::test]
    async fn test_recovers_from_failed_load_after_mutation() {
        let (api, state) = setup(vec![]);
        api.network_down.store(true, Ordering::SeqCst);
        let mut table = StocksTable::new(&state);
        table.load(&state).await;
        assert!(matches!(table.body(), TableBody::Failed(_)));

        api.network_down.store(false, Ordering::SeqCst);
        let mut modal = AddStock::new(date(2024, 6, 1));
        fill(&mut modal, "ACME", "5", "12.3", "2024-01-01");
        modal.submit(&state).await.unwrap();

        assert!(table.refresh_if_invalidated(&state).await);
        let rows = stock_rows(&table);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][1], "ACME");
    }

    #[tokio::test]
    async fn test_second_load_is_served_from_cache() {
        let (api, state) = setup(vec![existing()]);
        let mut table = StocksTable::new(&state);

        table.load(&state).await;
        table.load(&state).await;

        assert_eq!(api.list_calls.load(Ordering::SeqCst), 1);
        assert!(!table.refresh_if_invalidated(&state).await);
    }

    #[tokio::test]
    async fn test_render_has_header_and_rows() {
        let (_, state) = setup(vec![existing()]);
        let mut table = StocksTable::new(&state);
        table.load(&state).await;

        let text = table.render();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("ID"));
        assert!(lines[0].contains("Purchase Date"));
        assert!(lines[1].contains("MSFT"));
        assert!(lines[1].contains("412.50"));
    }
}

// ---------------------------------------------------------------------------
// Create modal
// ---------------------------------------------------------------------------

#[cfg(test)]
mod create_flow {
    use super::*;

    #[tokio::test]
    async fn test_successful_create_closes_and_refreshes() {
        let (api, state) = setup(vec![]);
        let mut table = StocksTable::new(&state);
        table.load(&state).await;

        let mut modal = AddStock::new(date(2024, 6, 1));
        modal.open();
        fill(&mut modal, "ACME", "5", "12.3", "2024-01-01");

        let created = modal.submit(&state).await.unwrap();

        assert_eq!(created.symbol, "ACME");
        let toast = state.toasts.latest().unwrap();
        assert_eq!(toast.title, "Success!");
        assert_eq!(toast.description, "Stock added successfully.");
        assert_eq!(toast.status, ToastStatus::Success);
        assert!(!modal.is_open());
        assert_eq!(modal.form().value(StockField::Symbol), "");
        assert_eq!(modal.form().value(StockField::Quantity), "1");

        assert!(table.refresh_if_invalidated(&state).await);
        assert_eq!(api.list_calls.load(Ordering::SeqCst), 2);
        let rows = stock_rows(&table);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][2], "5");
        assert_eq!(rows[0][3], "12.30");
        // Created with the default current price of 0.
        assert_eq!(rows[0][4], "N/A");
    }

    #[tokio::test]
    async fn test_server_rejection_keeps_modal_open() {
        let mut taken = existing();
        taken.symbol = "ACME".to_string();
        let (api, state) = setup(vec![taken]);
        let mut table = StocksTable::new(&state);
        table.load(&state).await;

        let mut modal = AddStock::new(date(2024, 6, 1));
        modal.open();
        fill(&mut modal, "ACME", "5", "12.3", "2024-01-01");

        let err = modal.submit(&state).await.unwrap_err();

        assert!(matches!(err, SubmitError::Remote(_)));
        let toast = state.toasts.latest().unwrap();
        assert_eq!(toast.title, "Something went wrong.");
        assert_eq!(toast.description, "Symbol already exists");
        assert!(modal.is_open());
        assert!(modal.can_submit());
        assert_eq!(modal.form().value(StockField::Symbol), "ACME");
        assert_eq!(modal.form().value(StockField::Quantity), "5");

        // Invalidation happens on failure too.
        assert!(table.refresh_if_invalidated(&state).await);
        assert_eq!(api.list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_the_api() {
        let cases = [
            ("", "5", "12.3", "2024-01-01", StockField::Symbol),
            ("ACME", "0", "12.3", "2024-01-01", StockField::Quantity),
            ("ACME", "5", "", "2024-01-01", StockField::PurchasePrice),
            ("ACME", "5", "12.3", "", StockField::PurchaseDate),
        ];

        for (symbol, quantity, price, purchased, field) in cases {
            let (api, state) = setup(vec![]);
            let mut table = StocksTable::new(&state);
            table.load(&state).await;
            let mut modal = AddStock::new(date(2024, 6, 1));
            modal.open();
            fill(&mut modal, symbol, quantity, price, purchased);

            let err = modal.submit(&state).await.unwrap_err();

            match err {
                SubmitError::Invalid(errors) => assert!(errors.contains_key(&field)),
                other => panic!("expected validation failure for {}, got {:?}", field, other),
            }
            assert!(modal.form().error(field).is_some());
            assert_eq!(api.create_calls.load(Ordering::SeqCst), 0);
            assert!(state.toasts.is_empty());
            assert!(!table.refresh_if_invalidated(&state).await);
        }
    }

    #[tokio::test]
    async fn test_large_cent_prices_are_accepted() {
        let (api, state) = setup(vec![]);
        let mut table = StocksTable::new(&state);
        table.load(&state).await;

        for (symbol, price) in [("BIG", "21474836.47"), ("MID", "1234567.89")] {
            let mut modal = AddStock::new(date(2024, 6, 1));
            fill(&mut modal, symbol, "1", price, "2024-01-01");
            modal.submit(&state).await.unwrap();
        }

        assert_eq!(api.create_calls.load(Ordering::SeqCst), 2);
        assert!(table.refresh_if_invalidated(&state).await);
        let prices: Vec<String> = stock_rows(&table).into_iter().map(|row| row[3].clone()).collect();
        assert_eq!(prices, vec!["21474836.47".to_string(), "1234567.89".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_detail_shows_undefined() {
        let (api, state) = setup(vec![]);
        api.bare_errors.store(true, Ordering::SeqCst);
        let mut modal = AddStock::new(date(2024, 6, 1));
        fill(&mut modal, "ACME", "5", "12.3", "2024-01-01");

        modal.submit(&state).await.unwrap_err();

        assert_eq!(state.toasts.latest().unwrap().description, "undefined");
    }
}

// ---------------------------------------------------------------------------
// Edit modal
// ---------------------------------------------------------------------------

#[cfg(test)]
mod edit_flow {
    use super::*;

    async fn loaded_table(state: &AppState) -> StocksTable {
        let mut table = StocksTable::new(state);
        table.load(state).await;
        table
    }

    fn first_row(table: &StocksTable) -> stock_admin::views::StockRow {
        match table.rows().into_iter().next() {
            Some(TableRow::Stock(row)) => row,
            other => panic!("expected a stock row, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_edit_updates_record_in_place() {
        let (api, state) = setup(vec![existing()]);
        let mut table = loaded_table(&state).await;
        let mut modal = first_row(&table).edit_form();

        modal.form_mut().set(StockField::Quantity, "12");
        assert!(modal.can_submit());
        let updated = modal.submit(&state).await.unwrap();

        assert_eq!(updated.id, 1);
        assert_eq!(updated.quantity, 12);
        assert!(!modal.is_open());
        assert_eq!(state.toasts.latest().unwrap().description, "Stock updated successfully.");
        assert_eq!(api.update_calls.load(Ordering::SeqCst), 1);

        assert!(table.refresh_if_invalidated(&state).await);
        assert_eq!(stock_rows(&table)[0][2], "12");
    }

    #[tokio::test]
    async fn test_clearing_current_price_clears_stored_value() {
        let (api, state) = setup(vec![existing()]);
        let mut table = loaded_table(&state).await;
        let mut modal = first_row(&table).edit_form();

        modal.form_mut().set(StockField::CurrentPrice, "");
        assert!(modal.can_submit());
        let updated = modal.submit(&state).await.unwrap();

        assert_eq!(updated.current_price, None);
        assert_eq!(api.read(1).await.unwrap().current_price, None);
        assert!(table.refresh_if_invalidated(&state).await);
        assert_eq!(stock_rows(&table)[0][4], "N/A");
    }

    #[tokio::test]
    async fn test_unchanged_edit_is_not_sent() {
        let (api, state) = setup(vec![existing()]);
        let table = loaded_table(&state).await;
        let mut modal = first_row(&table).edit_form();

        let err = modal.submit(&state).await.unwrap_err();

        assert!(matches!(err, SubmitError::Unchanged));
        assert_eq!(api.update_calls.load(Ordering::SeqCst), 0);
        assert!(state.cache.get(STOCKS_QUERY_KEY).map_or(false, |e| !e.stale));
    }

    #[tokio::test]
    async fn test_failed_update_stays_open() {
        let (api, state) = setup(vec![existing()]);
        let table = loaded_table(&state).await;
        let mut modal = first_row(&table).edit_form();
        api.stocks.lock().clear();

        modal.form_mut().set(StockField::Symbol, "MSFX");
        let err = modal.submit(&state).await.unwrap_err();

        assert!(matches!(err, SubmitError::Remote(_)));
        assert!(modal.is_open());
        assert_eq!(state.toasts.latest().unwrap().description, "Stock not found");
        assert!(state.cache.is_stale(STOCKS_QUERY_KEY));
    }

    #[tokio::test]
    async fn test_resubmitting_seeded_values_round_trips() {
        let (api, state) = setup(vec![existing()]);
        let table = loaded_table(&state).await;
        let row = first_row(&table);
        let mut modal = row.edit_form();

        let payload = modal.form_mut().validate().unwrap().into_update();
        api.update(modal.id(), payload).await.unwrap();

        let refetched = api.read(modal.id()).await.unwrap();
        assert_eq!(refetched, row.stock);
    }

    #[tokio::test]
    async fn test_cancel_then_reopen_starts_from_original() {
        let (_, state) = setup(vec![existing()]);
        let table = loaded_table(&state).await;
        let mut modal = first_row(&table).edit_form();

        modal.form_mut().set(StockField::CurrentPrice, "1");
        modal.cancel();
        modal.open();

        assert_eq!(modal.form().value(StockField::CurrentPrice), "412.5");
        assert!(!modal.can_submit());
    }
}

// ---------------------------------------------------------------------------
// Shared cache
// ---------------------------------------------------------------------------

#[cfg(test)]
mod shared_cache {
    use super::*;

    #[tokio::test]
    async fn test_both_tables_refetch_after_one_mutation() {
        let (api, state) = setup(vec![]);
        let mut first = StocksTable::new(&state);
        let mut second = StocksTable::new(&state);
        first.load(&state).await;
        second.load(&state).await;
        assert_eq!(api.list_calls.load(Ordering::SeqCst), 1);

        let mut modal = AddStock::new(date(2024, 6, 1));
        fill(&mut modal, "ACME", "5", "12.3", "2024-01-01");
        modal.submit(&state).await.unwrap();

        assert!(first.refresh_if_invalidated(&state).await);
        // Already refreshed through the shared cache, so no second network call.
        assert!(second.refresh_if_invalidated(&state).await);
        assert_eq!(api.list_calls.load(Ordering::SeqCst), 2);
        assert!(matches!(second.body(), TableBody::Loaded(page) if page.count == 1));
    }
}
