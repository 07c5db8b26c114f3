//! Recipe costing module
//!
//! Budget totals and margins, plus unit conversion across a family's units.

pub mod budget;
pub mod converter;
pub mod error;
pub mod store;
pub mod units;

pub use budget::{
    compute_totals, cost_per_serving, profit_per_serving, round_money, BudgetCalculator,
};
pub use converter::{convert_quantity, effective_factor, UnitConversionService};
pub use error::{CostingError, CostingResult};
pub use store::{BudgetStore, SqliteBudgetStore, SqliteUnitStore, UnitStore};
pub use units::{normalize_unit_type, UnitFamily, STANDARD_UNITS};
