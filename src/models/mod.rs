//! Data models
//!
//! Rust structs representing database entities.

mod costs;
mod recipe_budget;
mod unit;

pub use costs::{BudgetTotals, CostComponents};
pub use recipe_budget::{BudgetStatus, RecipeBudget, RecipeBudgetCreate, RecipeBudgetUpdate};
pub use unit::{Unit, UnitCreate, UnitUpdate};
