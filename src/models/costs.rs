//! Shared cost data structures
//!
//! Inputs and derived figures of a recipe budget.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Itemized cost components and the profit margin.
///
/// Every field defaults to zero when absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostComponents {
    pub ingredient_cost: Decimal,
    pub labor_cost: Decimal,
    pub overhead_cost: Decimal,
    pub packaging_cost: Decimal,
    pub other_costs: Decimal,
    /// Markup applied to total cost, in percent (20 means +20%)
    pub profit_margin_percentage: Decimal,
}

impl CostComponents {
    /// The five summed components paired with their field names
    pub fn components(&self) -> [(&'static str, Decimal); 5] {
        [
            ("ingredient_cost", self.ingredient_cost),
            ("labor_cost", self.labor_cost),
            ("overhead_cost", self.overhead_cost),
            ("packaging_cost", self.packaging_cost),
            ("other_costs", self.other_costs),
        ]
    }
}

/// Figures derived from [`CostComponents`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetTotals {
    pub total_cost: Decimal,
    pub selling_price: Decimal,
}
