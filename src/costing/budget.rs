//! Recipe budget calculation
//!
//! Totals are always derived here, on create and on every update, and rounded
//! half-to-even to two decimal places.

use rust_decimal::{Decimal, RoundingStrategy};

use super::error::{CostingError, CostingResult};
use super::store::BudgetStore;
use crate::models::{
    BudgetTotals, CostComponents, RecipeBudget, RecipeBudgetCreate, RecipeBudgetUpdate,
};

/// Decimal places kept for money
pub const MONEY_DP: u32 = 2;

/// Round a money amount half-to-even to [`MONEY_DP`] places
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointNearestEven)
}

/// Compute total cost and selling price.
///
/// Negative components and a negative margin are rejected, never clamped.
pub fn compute_totals(costs: &CostComponents) -> CostingResult<BudgetTotals> {
    let mut total = Decimal::ZERO;
    for (field, value) in costs.components() {
        if value < Decimal::ZERO {
            return Err(CostingError::InvalidCostValue { field, value });
        }
        total = total
            .checked_add(value)
            .ok_or(CostingError::AmountOverflow("total_cost"))?;
    }

    let margin = costs.profit_margin_percentage;
    if margin < Decimal::ZERO {
        return Err(CostingError::InvalidCostValue {
            field: "profit_margin_percentage",
            value: margin,
        });
    }

    // selling_price is derived from the rounded total_cost
    let total = round_money(total);
    let markup = total
        .checked_mul(margin)
        .and_then(|m| m.checked_div(Decimal::ONE_HUNDRED))
        .ok_or(CostingError::AmountOverflow("selling_price"))?;
    let selling_price = total
        .checked_add(markup)
        .ok_or(CostingError::AmountOverflow("selling_price"))?;

    Ok(BudgetTotals {
        total_cost: total,
        selling_price: round_money(selling_price),
    })
}

fn per_serving(amount: Decimal, servings: i64) -> Option<Decimal> {
    if servings <= 0 {
        return None;
    }
    amount.checked_div(Decimal::from(servings)).map(round_money)
}

/// `total_cost / servings`, or `None` when the budget has no servings
pub fn cost_per_serving(budget: &RecipeBudget) -> Option<Decimal> {
    per_serving(budget.total_cost, budget.servings)
}

/// `(selling_price - total_cost) / servings`, or `None` when the budget has no servings
pub fn profit_per_serving(budget: &RecipeBudget) -> Option<Decimal> {
    let profit = budget.selling_price.checked_sub(budget.total_cost)?;
    per_serving(profit, budget.servings)
}

fn validate_servings(servings: i64) -> CostingResult<()> {
    if servings < 1 {
        return Err(CostingError::InvalidServings(servings));
    }
    Ok(())
}

/// Creates and updates budgets, deriving their totals
pub struct BudgetCalculator<S> {
    store: S,
}

impl<S: BudgetStore> BudgetCalculator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Load a budget by ID
    pub async fn get_budget(&self, id: i64) -> CostingResult<Option<RecipeBudget>> {
        Ok(self.store.find_by_id(id).await?)
    }

    /// Validate, compute totals and persist a new budget
    pub async fn create_budget(&self, mut data: RecipeBudgetCreate) -> CostingResult<RecipeBudget> {
        data.budget_name = data.budget_name.trim().to_string();
        if data.budget_name.is_empty() {
            return Err(CostingError::EmptyBudgetName);
        }
        validate_servings(data.servings)?;

        let totals = compute_totals(&data.costs)?;
        let budget = self.store.create(data, totals).await?;

        tracing::info!(
            budget_id = budget.id,
            recipe_id = budget.recipe_id,
            total_cost = %budget.total_cost,
            selling_price = %budget.selling_price,
            "created recipe budget"
        );
        Ok(budget)
    }

    /// Merge `changes` over the stored budget, recompute totals and persist.
    ///
    /// The read and the write are not atomic: two concurrent updates of the
    /// same budget can lose one of the changes.
    pub async fn update_budget(
        &self,
        id: i64,
        mut changes: RecipeBudgetUpdate,
    ) -> CostingResult<RecipeBudget> {
        let existing = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(CostingError::BudgetNotFound(id))?;

        if let Some(name) = changes.budget_name.take() {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(CostingError::EmptyBudgetName);
            }
            changes.budget_name = Some(name);
        }
        if let Some(servings) = changes.servings {
            validate_servings(servings)?;
        }

        let merged = changes.merge_costs(&existing.costs);
        let totals = compute_totals(&merged)?;

        let budget = self
            .store
            .update(id, changes.with_costs(&merged), totals)
            .await?
            .ok_or(CostingError::BudgetNotFound(id))?;

        tracing::info!(
            budget_id = id,
            previous_total = %existing.total_cost,
            total_cost = %budget.total_cost,
            selling_price = %budget.selling_price,
            "updated recipe budget"
        );
        Ok(budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costing::store::{test_database, SqliteBudgetStore};
    use crate::models::BudgetStatus;
    use chrono::NaiveDate;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn costs(ingredient: &str, labor: &str, overhead: &str, packaging: &str, other: &str, margin: &str) -> CostComponents {
        CostComponents {
            ingredient_cost: dec(ingredient),
            labor_cost: dec(labor),
            overhead_cost: dec(overhead),
            packaging_cost: dec(packaging),
            other_costs: dec(other),
            profit_margin_percentage: dec(margin),
        }
    }

    fn budget_with(total: &str, price: &str, servings: i64) -> RecipeBudget {
        RecipeBudget {
            id: 1,
            user_id: 1,
            recipe_id: 1,
            budget_name: "b".to_string(),
            budget_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            servings,
            costs: CostComponents::default(),
            total_cost: dec(total),
            selling_price: dec(price),
            notes: None,
            status: BudgetStatus::Draft,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn new_budget(costs: CostComponents, servings: i64) -> RecipeBudgetCreate {
        RecipeBudgetCreate {
            user_id: 7,
            recipe_id: 3,
            budget_name: "  Catering run  ".to_string(),
            budget_date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            servings,
            costs,
            notes: None,
            status: BudgetStatus::Draft,
        }
    }

    #[test]
    fn test_totals_are_additive() {
        let totals = compute_totals(&costs("10", "5", "2", "1", "0", "0")).unwrap();
        assert_eq!(totals.total_cost, dec("18"));
        assert_eq!(totals.selling_price, dec("18"));
    }

    #[test]
    fn test_margin_pricing() {
        let totals = compute_totals(&costs("60", "25", "10", "5", "0", "20")).unwrap();
        assert_eq!(totals.total_cost, dec("100"));
        assert_eq!(totals.selling_price, dec("120"));
    }

    #[test]
    fn test_defaults_are_zero() {
        let totals = compute_totals(&CostComponents::default()).unwrap();
        assert_eq!(totals, BudgetTotals::default());
    }

    #[test]
    fn test_negative_component_rejected() {
        let err = compute_totals(&costs("-5", "0", "0", "0", "0", "0")).unwrap_err();
        assert!(matches!(
            err,
            CostingError::InvalidCostValue { field: "ingredient_cost", .. }
        ));

        let err = compute_totals(&costs("5", "0", "0", "0", "0", "-1")).unwrap_err();
        assert!(matches!(
            err,
            CostingError::InvalidCostValue { field: "profit_margin_percentage", .. }
        ));
    }

    #[test]
    fn test_rounding_is_half_even() {
        // 0.125 -> 0.12, 0.135 -> 0.14
        let totals = compute_totals(&costs("0.125", "0", "0", "0", "0", "0")).unwrap();
        assert_eq!(totals.total_cost, dec("0.12"));
        let totals = compute_totals(&costs("0.135", "0", "0", "0", "0", "0")).unwrap();
        assert_eq!(totals.total_cost, dec("0.14"));

        // 10.05 * 1.10 = 11.055 -> 11.06 (6 is even)
        let totals = compute_totals(&costs("10.05", "0", "0", "0", "0", "10")).unwrap();
        assert_eq!(totals.selling_price, dec("11.06"));
    }

    #[test]
    fn test_selling_price_follows_stored_total() {
        // 0.125 rounds to 0.12; doubling that must give 0.24, not round(0.25)
        let totals = compute_totals(&costs("0.125", "0", "0", "0", "0", "100")).unwrap();
        assert_eq!(totals.total_cost, dec("0.12"));
        assert_eq!(totals.selling_price, dec("0.24"));

        let budget = budget_with("0.12", "0.24", 1);
        assert_eq!(profit_per_serving(&budget), Some(dec("0.12")));
    }

    #[test]
    fn test_compute_totals_is_deterministic() {
        let input = costs("3.33", "1.11", "0.07", "0.5", "2", "37.5");
        assert_eq!(compute_totals(&input).unwrap(), compute_totals(&input).unwrap());
    }

    #[test]
    fn test_per_serving_figures() {
        let budget = budget_with("50", "60", 4);
        assert_eq!(cost_per_serving(&budget), Some(dec("12.50")));
        assert_eq!(profit_per_serving(&budget), Some(dec("2.50")));

        let thirds = budget_with("50", "50", 3);
        assert_eq!(cost_per_serving(&thirds), Some(dec("16.67")));
        assert_eq!(profit_per_serving(&thirds), Some(Decimal::ZERO));
    }

    #[test]
    fn test_zero_servings_is_none() {
        let budget = budget_with("50", "60", 0);
        assert_eq!(cost_per_serving(&budget), None);
        assert_eq!(profit_per_serving(&budget), None);
    }

    #[tokio::test]
    async fn test_create_budget_stores_computed_totals() {
        let calculator = BudgetCalculator::new(SqliteBudgetStore::new(test_database()));
        let budget = calculator
            .create_budget(new_budget(costs("10", "5", "2", "1", "0", "20"), 6))
            .await
            .unwrap();

        assert_eq!(budget.budget_name, "Catering run");
        assert_eq!(budget.total_cost, dec("18"));
        assert_eq!(budget.selling_price, dec("21.60"));

        let stored = calculator.get_budget(budget.id).await.unwrap().unwrap();
        assert_eq!(stored, budget);
    }

    #[tokio::test]
    async fn test_create_budget_validates_input() {
        let calculator = BudgetCalculator::new(SqliteBudgetStore::new(test_database()));

        let err = calculator
            .create_budget(new_budget(CostComponents::default(), 0))
            .await
            .unwrap_err();
        assert!(matches!(err, CostingError::InvalidServings(0)));

        let mut unnamed = new_budget(CostComponents::default(), 2);
        unnamed.budget_name = "   ".to_string();
        let err = calculator.create_budget(unnamed).await.unwrap_err();
        assert!(matches!(err, CostingError::EmptyBudgetName));

        let err = calculator
            .create_budget(new_budget(costs("1", "-0.01", "0", "0", "0", "0"), 2))
            .await
            .unwrap_err();
        assert!(matches!(err, CostingError::InvalidCostValue { field: "labor_cost", .. }));
    }

    #[tokio::test]
    async fn test_update_recomputes_from_merged_values() {
        let calculator = BudgetCalculator::new(SqliteBudgetStore::new(test_database()));
        let budget = calculator
            .create_budget(new_budget(costs("10", "5", "2", "1", "0", "50"), 4))
            .await
            .unwrap();
        assert_eq!(budget.total_cost, dec("18"));

        let updated = calculator
            .update_budget(
                budget.id,
                RecipeBudgetUpdate {
                    labor_cost: Some(dec("15")),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.total_cost, dec("28"));
        assert_eq!(updated.selling_price, dec("42"));
        assert_eq!(updated.costs.ingredient_cost, dec("10"));
        assert_eq!(updated.costs.labor_cost, dec("15"));
        assert_eq!(updated.costs.profit_margin_percentage, dec("50"));
    }

    #[tokio::test]
    async fn test_update_margin_only() {
        let calculator = BudgetCalculator::new(SqliteBudgetStore::new(test_database()));
        let budget = calculator
            .create_budget(new_budget(costs("80", "20", "0", "0", "0", "0"), 10))
            .await
            .unwrap();

        let updated = calculator
            .update_budget(
                budget.id,
                RecipeBudgetUpdate {
                    profit_margin_percentage: Some(dec("35")),
                    status: Some(BudgetStatus::Active),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.total_cost, dec("100"));
        assert_eq!(updated.selling_price, dec("135"));
        assert_eq!(updated.status, BudgetStatus::Active);
        assert_eq!(profit_per_serving(&updated), Some(dec("3.50")));
    }

    #[tokio::test]
    async fn test_update_missing_budget() {
        let calculator = BudgetCalculator::new(SqliteBudgetStore::new(test_database()));
        let err = calculator
            .update_budget(404, RecipeBudgetUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CostingError::BudgetNotFound(404)));
        assert!(!err.is_invalid_input());
    }

    #[tokio::test]
    async fn test_update_rejects_negative_and_leaves_budget_untouched() {
        let calculator = BudgetCalculator::new(SqliteBudgetStore::new(test_database()));
        let budget = calculator
            .create_budget(new_budget(costs("10", "5", "2", "1", "0", "0"), 4))
            .await
            .unwrap();

        let err = calculator
            .update_budget(
                budget.id,
                RecipeBudgetUpdate {
                    overhead_cost: Some(dec("-2")),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());

        let stored = calculator.get_budget(budget.id).await.unwrap().unwrap();
        assert_eq!(stored.total_cost, dec("18"));
        assert_eq!(stored.costs.overhead_cost, dec("2"));
    }

    #[tokio::test]
    async fn test_update_rejects_zero_servings() {
        let calculator = BudgetCalculator::new(SqliteBudgetStore::new(test_database()));
        let budget = calculator
            .create_budget(new_budget(costs("10", "5", "2", "1", "0", "0"), 4))
            .await
            .unwrap();

        let err = calculator
            .update_budget(
                budget.id,
                RecipeBudgetUpdate {
                    servings: Some(0),
                    labor_cost: Some(dec("9")),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CostingError::InvalidServings(0)));

        let stored = calculator.get_budget(budget.id).await.unwrap().unwrap();
        assert_eq!(stored, budget);
    }

    #[tokio::test]
    async fn test_update_rejects_blank_name() {
        let calculator = BudgetCalculator::new(SqliteBudgetStore::new(test_database()));
        let budget = calculator
            .create_budget(new_budget(costs("10", "0", "0", "0", "0", "0"), 2))
            .await
            .unwrap();

        let err = calculator
            .update_budget(
                budget.id,
                RecipeBudgetUpdate {
                    budget_name: Some("  ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CostingError::EmptyBudgetName));

        let stored = calculator.get_budget(budget.id).await.unwrap().unwrap();
        assert_eq!(stored.budget_name, "Catering run");

        let renamed = calculator
            .update_budget(
                budget.id,
                RecipeBudgetUpdate {
                    budget_name: Some(" Wedding ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.budget_name, "Wedding");
    }
}
