//! Costing error types

use rust_decimal::Decimal;
use thiserror::Error;

use crate::db::DbError;

#[derive(Debug, Error)]
pub enum CostingError {
    #[error("Cannot convert between different unit types: {from} and {to}")]
    IncompatibleUnitTypes { from: String, to: String },

    #[error("Unit '{unit}' has an invalid conversion factor: {factor}")]
    InvalidConversionFactor { unit: String, factor: f64 },

    #[error("Converting {value} from {from} to {to} is out of range")]
    ConversionOutOfRange { value: f64, from: String, to: String },

    #[error("Invalid {field}: {value} (must not be negative)")]
    InvalidCostValue { field: &'static str, value: Decimal },

    #[error("servings must be at least 1, got {0}")]
    InvalidServings(i64),

    #[error("Budget name cannot be empty")]
    EmptyBudgetName,

    #[error("Amount overflow while computing {0}")]
    AmountOverflow(&'static str),

    #[error("Recipe budget not found: {0}")]
    BudgetNotFound(i64),

    #[error(transparent)]
    Storage(#[from] DbError),
}

impl CostingError {
    /// Whether the error was caused by the caller's input rather than storage
    pub fn is_invalid_input(&self) -> bool {
        !matches!(
            self,
            CostingError::Storage(_) | CostingError::BudgetNotFound(_)
        )
    }
}

pub type CostingResult<T> = Result<T, CostingError>;
