//! Recipe Budget MCP Tools
//!
//! Tools for costing recipes. Create and update go through the calculator so
//! totals are always derived, never taken from the caller.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::costing::{
    cost_per_serving, profit_per_serving, BudgetCalculator, CostingResult, SqliteBudgetStore,
};
use crate::db::Database;
use crate::models::{BudgetStatus, RecipeBudget, RecipeBudgetCreate, RecipeBudgetUpdate};

/// Budget with per-serving figures
#[derive(Debug, Serialize)]
pub struct BudgetDetail {
    #[serde(flatten)]
    pub budget: RecipeBudget,
    pub cost_per_serving: Option<Decimal>,
    pub profit_per_serving: Option<Decimal>,
}

impl From<RecipeBudget> for BudgetDetail {
    fn from(budget: RecipeBudget) -> Self {
        Self {
            cost_per_serving: cost_per_serving(&budget),
            profit_per_serving: profit_per_serving(&budget),
            budget,
        }
    }
}

/// Budget summary for listing
#[derive(Debug, Serialize)]
pub struct BudgetSummary {
    pub id: i64,
    pub recipe_id: i64,
    pub budget_name: String,
    pub budget_date: String,
    pub servings: i64,
    pub total_cost: Decimal,
    pub selling_price: Decimal,
    pub status: BudgetStatus,
}

impl From<&RecipeBudget> for BudgetSummary {
    fn from(budget: &RecipeBudget) -> Self {
        Self {
            id: budget.id,
            recipe_id: budget.recipe_id,
            budget_name: budget.budget_name.clone(),
            budget_date: budget.budget_date.to_string(),
            servings: budget.servings,
            total_cost: budget.total_cost,
            selling_price: budget.selling_price,
            status: budget.status,
        }
    }
}

/// Response for list_budgets
#[derive(Debug, Serialize)]
pub struct ListBudgetsResponse {
    pub budgets: Vec<BudgetSummary>,
    pub count: usize,
}

/// Response for successful delete
#[derive(Debug, Serialize)]
pub struct BudgetDeleteResponse {
    pub success: bool,
    pub deleted_id: i64,
}

/// Which budgets to list
#[derive(Debug, Clone, Copy)]
pub enum BudgetFilter {
    Recipe(i64),
    User {
        user_id: i64,
        status: Option<BudgetStatus>,
    },
}

/// Create a budget
pub async fn create_budget(
    calculator: &BudgetCalculator<SqliteBudgetStore>,
    data: RecipeBudgetCreate,
) -> CostingResult<BudgetDetail> {
    Ok(calculator.create_budget(data).await?.into())
}

/// Update a budget and recompute its totals
pub async fn update_budget(
    calculator: &BudgetCalculator<SqliteBudgetStore>,
    id: i64,
    changes: RecipeBudgetUpdate,
) -> CostingResult<BudgetDetail> {
    Ok(calculator.update_budget(id, changes).await?.into())
}

/// Get a budget with per-serving figures
pub async fn get_budget(
    calculator: &BudgetCalculator<SqliteBudgetStore>,
    id: i64,
) -> CostingResult<Option<BudgetDetail>> {
    Ok(calculator.get_budget(id).await?.map(BudgetDetail::from))
}

/// List budgets by recipe or by user
pub fn list_budgets(db: &Database, filter: BudgetFilter) -> Result<ListBudgetsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let budgets = match filter {
        BudgetFilter::Recipe(recipe_id) => RecipeBudget::list_for_recipe(&conn, recipe_id),
        BudgetFilter::User { user_id, status } => {
            RecipeBudget::list_for_user(&conn, user_id, status)
        }
    }
    .map_err(|e| format!("Failed to list budgets: {}", e))?;

    let budgets: Vec<BudgetSummary> = budgets.iter().map(BudgetSummary::from).collect();
    Ok(ListBudgetsResponse {
        count: budgets.len(),
        budgets,
    })
}

/// Delete a budget
pub fn delete_budget(db: &Database, id: i64) -> Result<Option<BudgetDeleteResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let deleted =
        RecipeBudget::delete(&conn, id).map_err(|e| format!("Failed to delete budget: {}", e))?;

    if deleted {
        tracing::info!(budget_id = id, "deleted recipe budget");
    }
    Ok(deleted.then_some(BudgetDeleteResponse {
        success: true,
        deleted_id: id,
    }))
}
