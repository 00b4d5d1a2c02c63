use chrono::{NaiveDate, Utc};
use tracing::{error, info};

use crate::errors::{ApiError, SubmitError};
use crate::forms::rules::CREATE_RULES;
use crate::forms::stock_form::{StockForm, StockFormValues};
use crate::models::{StockCreate, StockRecord};
use crate::services::query_cache::STOCKS_QUERY_KEY;
use crate::state::AppState;

pub const ADDED_MESSAGE: &str = "Stock added successfully.";

/// "Add Stock" modal.
#[derive(Debug, Clone)]
pub struct AddStock {
    form: StockForm,
    open: bool,
    submitting: bool,
}

impl AddStock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            form: StockForm::new(&CREATE_RULES, StockFormValues::create_defaults(today)),
            open: false,
            submitting: false,
        }
    }

    pub fn for_today() -> Self {
        Self::new(Utc::now().date_naive())
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    /// Closes the modal. Entered values are kept for the next time it opens.
    pub fn cancel(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn can_submit(&self) -> bool {
        !self.submitting
    }

    pub fn form(&self) -> &StockForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut StockForm {
        &mut self.form
    }

    /// Validates the form and marks the submission in flight. Nothing is sent when a field
    /// fails validation.
    pub fn begin_submit(&mut self) -> Result<StockCreate, SubmitError> {
        if self.submitting {
            return Err(SubmitError::InFlight);
        }
        let payload = self
            .form
            .validate()
            .and_then(|validated| validated.into_create())
            .map_err(SubmitError::Invalid)?;

        self.submitting = true;
        Ok(payload)
    }

    /// Applies the outcome of the create request. The stock list is invalidated whatever
    /// the outcome.
    pub fn settle(
        &mut self,
        state: &AppState,
        result: Result<StockRecord, ApiError>,
    ) -> Result<StockRecord, SubmitError> {
        self.submitting = false;

        match &result {
            Ok(stock) => {
                info!("Created stock {} ({})", stock.id, stock.symbol);
                state.toasts.success(ADDED_MESSAGE);
                self.form.reset();
                self.open = false;
            }
            Err(e) => {
                error!("Failed to create stock: {}", e);
                state.toasts.error(&e.detail_or_missing());
            }
        }

        state.cache.invalidate(STOCKS_QUERY_KEY);
        result.map_err(SubmitError::from)
    }

    pub async fn submit(&mut self, state: &AppState) -> Result<StockRecord, SubmitError> {
        let payload = self.begin_submit()?;
        let result = state.api.create(payload).await;
        self.settle(state, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::StockField;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_begin_submit_blocks_invalid_form() {
        let mut modal = AddStock::new(today());
        modal.open();

        let err = modal.begin_submit().unwrap_err();

        assert!(matches!(err, SubmitError::Invalid(ref errors) if errors.contains_key(&StockField::Symbol)));
        assert!(!modal.is_submitting());
        assert!(modal.is_open());
    }

    #[test]
    fn test_second_submission_is_rejected_while_in_flight() {
        let mut modal = AddStock::new(today());
        modal.form_mut().set(StockField::Symbol, "ACME");

        let payload = modal.begin_submit().unwrap();
        assert_eq!(payload.symbol, "ACME");
        assert!(!modal.can_submit());

        assert!(matches!(modal.begin_submit(), Err(SubmitError::InFlight)));
    }

    #[test]
    fn test_cancel_keeps_entered_values() {
        let mut modal = AddStock::new(today());
        modal.open();
        modal.form_mut().set(StockField::Symbol, "ACME");

        modal.cancel();

        assert!(!modal.is_open());
        assert_eq!(modal.form().value(StockField::Symbol), "ACME");
    }
}
