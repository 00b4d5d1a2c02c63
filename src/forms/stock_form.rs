use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::errors::FieldErrors;
use crate::forms::rules::{
    rule_for, FieldError, FieldRule, FieldValue, StockField, DATE_INPUT_FORMAT,
};
use crate::models::{StockCreate, StockRecord, StockUpdate};

/// Raw text of every input, as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockFormValues {
    pub symbol: String,
    pub quantity: String,
    pub purchase_price: String,
    pub current_price: String,
    pub purchase_date: String,
}

impl StockFormValues {
    /// Blank create form: quantity 1, prices 0, purchased `today`.
    pub fn create_defaults(today: NaiveDate) -> Self {
        Self {
            symbol: String::new(),
            quantity: "1".to_string(),
            purchase_price: "0".to_string(),
            current_price: "0".to_string(),
            purchase_date: today.format(DATE_INPUT_FORMAT).to_string(),
        }
    }

    pub fn from_record(stock: &StockRecord) -> Self {
        Self {
            symbol: stock.symbol.clone(),
            quantity: stock.quantity.to_string(),
            purchase_price: stock.purchase_price.to_string(),
            current_price: stock
                .current_price
                .map(|price| price.to_string())
                .unwrap_or_default(),
            purchase_date: stock.purchase_date.format(DATE_INPUT_FORMAT).to_string(),
        }
    }

    pub fn get(&self, field: StockField) -> &str {
        match field {
            StockField::Symbol => &self.symbol,
            StockField::Quantity => &self.quantity,
            StockField::PurchasePrice => &self.purchase_price,
            StockField::CurrentPrice => &self.current_price,
            StockField::PurchaseDate => &self.purchase_date,
        }
    }

    fn slot(&mut self, field: StockField) -> &mut String {
        match field {
            StockField::Symbol => &mut self.symbol,
            StockField::Quantity => &mut self.quantity,
            StockField::PurchasePrice => &mut self.purchase_price,
            StockField::CurrentPrice => &mut self.current_price,
            StockField::PurchaseDate => &mut self.purchase_date,
        }
    }
}

/// Coerced values of a form that passed validation. Optional fields left blank are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedStock {
    pub symbol: Option<String>,
    pub quantity: Option<i32>,
    pub purchase_price: Option<f64>,
    pub current_price: Option<f64>,
    pub purchase_date: Option<NaiveDate>,
}

impl ValidatedStock {
    fn assign(&mut self, field: StockField, value: FieldValue) {
        match (field, value) {
            (StockField::Symbol, FieldValue::Text(text)) => self.symbol = Some(text),
            (StockField::Quantity, FieldValue::Integer(n)) => self.quantity = Some(n),
            (StockField::PurchasePrice, FieldValue::Decimal(n)) => self.purchase_price = Some(n),
            (StockField::CurrentPrice, FieldValue::Decimal(n)) => self.current_price = Some(n),
            (StockField::PurchaseDate, FieldValue::Date(date)) => self.purchase_date = Some(date),
            _ => {}
        }
    }

    /// Builds the create payload. Fails with `Required` for anything the rules let through blank.
    pub fn into_create(self) -> Result<StockCreate, FieldErrors> {
        match (self.symbol, self.quantity, self.purchase_price, self.purchase_date) {
            (Some(symbol), Some(quantity), Some(purchase_price), Some(purchase_date)) => {
                Ok(StockCreate {
                    symbol,
                    quantity,
                    purchase_price,
                    current_price: self.current_price,
                    purchase_date,
                })
            }
            (symbol, quantity, purchase_price, purchase_date) => {
                let present = [
                    (StockField::Symbol, symbol.is_some()),
                    (StockField::Quantity, quantity.is_some()),
                    (StockField::PurchasePrice, purchase_price.is_some()),
                    (StockField::PurchaseDate, purchase_date.is_some()),
                ];
                Err(present
                    .into_iter()
                    .filter(|(_, present)| !present)
                    .map(|(field, _)| (field, FieldError::Required(field)))
                    .collect())
            }
        }
    }

    /// Builds the update payload. A blank current price is sent as `null` so clearing
    /// the field clears the stored price.
    pub fn into_update(self) -> StockUpdate {
        StockUpdate {
            symbol: self.symbol,
            quantity: self.quantity,
            purchase_price: self.purchase_price,
            current_price: Some(self.current_price),
            purchase_date: self.purchase_date,
        }
    }
}

/// Field state shared by the create and edit modals: current input, the values it was
/// seeded with, and the errors currently shown.
#[derive(Debug, Clone)]
pub struct StockForm {
    rules: &'static [FieldRule],
    defaults: StockFormValues,
    values: StockFormValues,
    errors: FieldErrors,
    touched: BTreeSet<StockField>,
    seeded_from_record: bool,
}

impl StockForm {
    pub fn new(rules: &'static [FieldRule], defaults: StockFormValues) -> Self {
        Self {
            rules,
            values: defaults.clone(),
            defaults,
            errors: BTreeMap::new(),
            touched: BTreeSet::new(),
            seeded_from_record: false,
        }
    }

    /// Form over a stored record. Untouched values keep whatever precision the server
    /// holds; only edited prices are held to the input step.
    pub fn for_record(rules: &'static [FieldRule], stock: &StockRecord) -> Self {
        Self {
            seeded_from_record: true,
            ..Self::new(rules, StockFormValues::from_record(stock))
        }
    }

    fn check(&self, rule: &FieldRule) -> Result<FieldValue, FieldError> {
        let enforce_step = !self.seeded_from_record || self.is_field_dirty(rule.field);
        rule.check_with(self.values.get(rule.field), enforce_step)
    }

    pub fn values(&self) -> &StockFormValues {
        &self.values
    }

    pub fn defaults(&self) -> &StockFormValues {
        &self.defaults
    }

    pub fn value(&self, field: StockField) -> &str {
        self.values.get(field)
    }

    /// Updates an input. A field already showing an error is re-checked right away.
    pub fn set(&mut self, field: StockField, raw: impl Into<String>) {
        *self.values.slot(field) = raw.into();
        if self.errors.contains_key(&field) {
            self.validate_field(field);
        }
    }

    /// Marks the field touched and validates it.
    pub fn blur(&mut self, field: StockField) -> bool {
        self.touched.insert(field);
        self.validate_field(field)
    }

    pub fn is_touched(&self, field: StockField) -> bool {
        self.touched.contains(&field)
    }

    pub fn error(&self, field: StockField) -> Option<String> {
        self.errors.get(&field).map(|err| err.to_string())
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    fn validate_field(&mut self, field: StockField) -> bool {
        let Some(rule) = rule_for(self.rules, field) else {
            return true;
        };
        match self.check(rule) {
            Ok(_) => {
                self.errors.remove(&field);
                true
            }
            Err(err) => {
                self.errors.insert(field, err);
                false
            }
        }
    }

    /// Validates every field, as on submit. On failure every offending field carries
    /// its error and the full set is returned.
    pub fn validate(&mut self) -> Result<ValidatedStock, FieldErrors> {
        let mut validated = ValidatedStock::default();
        let mut errors = FieldErrors::new();

        for rule in self.rules {
            self.touched.insert(rule.field);
            match self.check(rule) {
                Ok(value) => validated.assign(rule.field, value),
                Err(err) => {
                    errors.insert(rule.field, err);
                }
            }
        }

        self.errors = errors.clone();
        if errors.is_empty() {
            Ok(validated)
        } else {
            Err(errors)
        }
    }

    /// True when any field's value differs from the one it was seeded with.
    pub fn is_dirty(&self) -> bool {
        StockField::ALL
            .iter()
            .any(|&field| self.is_field_dirty(field))
    }

    pub fn is_field_dirty(&self, field: StockField) -> bool {
        let current = self.values.get(field);
        let original = self.defaults.get(field);
        match rule_for(self.rules, field) {
            Some(rule) => !rule.same_value(current, original),
            None => current != original,
        }
    }

    /// Restores the seeded values and clears errors.
    pub fn reset(&mut self) {
        self.values = self.defaults.clone();
        self.errors.clear();
        self.touched.clear();
    }
}
