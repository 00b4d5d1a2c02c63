use std::fmt;

use chrono::NaiveDate;
use thiserror::Error;

pub const DATE_INPUT_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StockField {
    Symbol,
    Quantity,
    PurchasePrice,
    CurrentPrice,
    PurchaseDate,
}

impl StockField {
    pub const ALL: [StockField; 5] = [
        StockField::Symbol,
        StockField::Quantity,
        StockField::PurchasePrice,
        StockField::CurrentPrice,
        StockField::PurchaseDate,
    ];

    /// Wire name of the field.
    pub fn name(self) -> &'static str {
        match self {
            StockField::Symbol => "symbol",
            StockField::Quantity => "quantity",
            StockField::PurchasePrice => "purchase_price",
            StockField::CurrentPrice => "current_price",
            StockField::PurchaseDate => "purchase_date",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StockField::Symbol => "Symbol",
            StockField::Quantity => "Quantity",
            StockField::PurchasePrice => "Purchase price",
            StockField::CurrentPrice => "Current price",
            StockField::PurchaseDate => "Purchase date",
        }
    }
}

impl fmt::Display for StockField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Decimal,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRule {
    pub field: StockField,
    pub required: bool,
    pub kind: FieldKind,
    pub min: Option<f64>,
    pub step: Option<f64>,
}

/// Inline message shown under a field. Display is the user-facing text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("{} is required.", .0.label())]
    Required(StockField),
    #[error("{} must be a number.", .0.label())]
    NotANumber(StockField),
    #[error("{} must be a whole number.", .0.label())]
    NotAWholeNumber(StockField),
    #[error("{} must be at least {}.", .field.label(), .min)]
    BelowMin { field: StockField, min: f64 },
    #[error("{} must be a multiple of {}.", .field.label(), .step)]
    Step { field: StockField, step: f64 },
    #[error("{} must be a valid date.", .0.label())]
    InvalidDate(StockField),
}

/// Value of a field after coercion from its text input.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Empty,
    Text(String),
    Integer(i32),
    Decimal(f64),
    Date(NaiveDate),
}

// Allowed drift, in ulps of the value, between a number and its nearest step.
const STEP_ULPS: f64 = 8.0;

impl FieldRule {
    const fn new(field: StockField, kind: FieldKind) -> Self {
        Self {
            field,
            required: false,
            kind,
            min: None,
            step: None,
        }
    }

    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    const fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    const fn step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    /// Coerces `raw` and checks it against the rule.
    pub fn check(&self, raw: &str) -> Result<FieldValue, FieldError> {
        self.check_with(raw, true)
    }

    /// Like `check`, with the step check optional. Values seeded from a stored record
    /// are not held to the input step.
    pub fn check_with(&self, raw: &str, enforce_step: bool) -> Result<FieldValue, FieldError> {
        let value = self.coerce(raw)?;
        let number = match value {
            FieldValue::Empty if self.required => return Err(FieldError::Required(self.field)),
            FieldValue::Integer(n) => f64::from(n),
            FieldValue::Decimal(n) => n,
            _ => return Ok(value),
        };

        if let Some(min) = self.min {
            if number < min {
                return Err(FieldError::BelowMin {
                    field: self.field,
                    min,
                });
            }
        }
        if let Some(step) = self.step.filter(|_| enforce_step) {
            if !on_step(number, self.min.unwrap_or(0.0), step) {
                return Err(FieldError::Step {
                    field: self.field,
                    step,
                });
            }
        }
        Ok(value)
    }

    /// Coercion only, without required/min/step checks.
    pub fn coerce(&self, raw: &str) -> Result<FieldValue, FieldError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(FieldValue::Empty);
        }

        match self.kind {
            FieldKind::Text => Ok(FieldValue::Text(trimmed.to_string())),
            FieldKind::Integer => {
                let number = parse_number(self.field, trimmed)?;
                if number.fract() != 0.0 || number.abs() > f64::from(i32::MAX) {
                    return Err(FieldError::NotAWholeNumber(self.field));
                }
                Ok(FieldValue::Integer(number as i32))
            }
            FieldKind::Decimal => Ok(FieldValue::Decimal(parse_number(self.field, trimmed)?)),
            FieldKind::Date => NaiveDate::parse_from_str(trimmed, DATE_INPUT_FORMAT)
                .map(FieldValue::Date)
                .map_err(|_| FieldError::InvalidDate(self.field)),
        }
    }

    /// Whether two inputs hold the same value. Unparsable input is compared as text.
    pub fn same_value(&self, a: &str, b: &str) -> bool {
        match (self.coerce(a), self.coerce(b)) {
            (Ok(x), Ok(y)) => x == y,
            _ => a.trim() == b.trim(),
        }
    }
}

fn on_step(number: f64, base: f64, step: f64) -> bool {
    let snapped = base + ((number - base) / step).round() * step;
    (snapped - number).abs() <= number.abs().max(1.0) * f64::EPSILON * STEP_ULPS
}

fn parse_number(field: StockField, raw: &str) -> Result<f64, FieldError> {
    raw.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or(FieldError::NotANumber(field))
}

pub static CREATE_RULES: [FieldRule; 5] = [
    FieldRule::new(StockField::Symbol, FieldKind::Text).required(),
    FieldRule::new(StockField::Quantity, FieldKind::Integer)
        .required()
        .min(1.0),
    FieldRule::new(StockField::PurchasePrice, FieldKind::Decimal)
        .required()
        .min(0.0)
        .step(0.01),
    FieldRule::new(StockField::CurrentPrice, FieldKind::Decimal)
        .min(0.0)
        .step(0.01),
    FieldRule::new(StockField::PurchaseDate, FieldKind::Date).required(),
];

pub static EDIT_RULES: [FieldRule; 5] = [
    FieldRule::new(StockField::Symbol, FieldKind::Text).required(),
    FieldRule::new(StockField::Quantity, FieldKind::Integer).min(0.0),
    FieldRule::new(StockField::PurchasePrice, FieldKind::Decimal)
        .min(0.0)
        .step(0.01),
    FieldRule::new(StockField::CurrentPrice, FieldKind::Decimal)
        .min(0.0)
        .step(0.01),
    FieldRule::new(StockField::PurchaseDate, FieldKind::Date).required(),
];

pub fn rule_for(rules: &[FieldRule], field: StockField) -> Option<&FieldRule> {
    rules.iter().find(|rule| rule.field == field)
}
