use tracing::{error, info};

use crate::errors::{ApiError, SubmitError};
use crate::forms::rules::EDIT_RULES;
use crate::forms::stock_form::StockForm;
use crate::models::{StockId, StockRecord, StockUpdate};
use crate::services::query_cache::STOCKS_QUERY_KEY;
use crate::state::AppState;

pub const UPDATED_MESSAGE: &str = "Stock updated successfully.";

/// "Edit Stock" modal, seeded from an existing record.
#[derive(Debug, Clone)]
pub struct EditStock {
    id: StockId,
    form: StockForm,
    open: bool,
    submitting: bool,
}

impl EditStock {
    pub fn new(stock: &StockRecord) -> Self {
        Self {
            id: stock.id,
            form: StockForm::for_record(&EDIT_RULES, stock),
            open: false,
            submitting: false,
        }
    }

    pub fn id(&self) -> StockId {
        self.id
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    /// Drops in-progress edits and closes.
    pub fn cancel(&mut self) {
        self.form.reset();
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Save is only enabled once something differs from the original record.
    pub fn can_submit(&self) -> bool {
        !self.submitting && self.form.is_dirty()
    }

    pub fn form(&self) -> &StockForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut StockForm {
        &mut self.form
    }

    /// Validates and returns the full object to send. The payload always carries every
    /// field currently in the form, not just the changed ones.
    pub fn begin_submit(&mut self) -> Result<StockUpdate, SubmitError> {
        if self.submitting {
            return Err(SubmitError::InFlight);
        }
        if !self.form.is_dirty() {
            return Err(SubmitError::Unchanged);
        }
        let payload = self
            .form
            .validate()
            .map_err(SubmitError::Invalid)?
            .into_update();

        self.submitting = true;
        Ok(payload)
    }

    pub fn settle(
        &mut self,
        state: &AppState,
        result: Result<StockRecord, ApiError>,
    ) -> Result<StockRecord, SubmitError> {
        self.submitting = false;

        match &result {
            Ok(stock) => {
                info!("Updated stock {} ({})", stock.id, stock.symbol);
                state.toasts.success(UPDATED_MESSAGE);
                self.open = false;
            }
            Err(e) => {
                error!("Failed to update stock {}: {}", self.id, e);
                state.toasts.error(&e.detail_or_missing());
            }
        }

        state.cache.invalidate(STOCKS_QUERY_KEY);
        result.map_err(SubmitError::from)
    }

    pub async fn submit(&mut self, state: &AppState) -> Result<StockRecord, SubmitError> {
        let payload = self.begin_submit()?;
        let result = state.api.update(self.id, payload).await;
        self.settle(state, result)
    }
}
