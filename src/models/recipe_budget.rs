//! Recipe Budget model
//!
//! Costing snapshots for a recipe. Money columns are stored as decimal text and
//! parsed into [`Decimal`] when read; a malformed value fails the read.

use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{BudgetTotals, CostComponents};
use crate::db::DbResult;

/// Lifecycle tag of a budget. Transitions are not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    #[default]
    Draft,
    Active,
    Archived,
}

impl BudgetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetStatus::Draft => "draft",
            BudgetStatus::Active => "active",
            BudgetStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Some(BudgetStatus::Draft),
            "active" => Some(BudgetStatus::Active),
            "archived" => Some(BudgetStatus::Archived),
            _ => None,
        }
    }
}

impl ToSql for BudgetStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for BudgetStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        BudgetStatus::parse(s).ok_or_else(|| {
            FromSqlError::Other(format!("unknown budget status: {}", s).into())
        })
    }
}

/// A costing snapshot for one recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeBudget {
    pub id: i64,
    pub user_id: i64,
    pub recipe_id: i64,
    pub budget_name: String,
    pub budget_date: NaiveDate,
    pub servings: i64,
    #[serde(flatten)]
    pub costs: CostComponents,
    pub total_cost: Decimal,
    pub selling_price: Decimal,
    pub notes: Option<String>,
    pub status: BudgetStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a budget. Totals are never part of the input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeBudgetCreate {
    pub user_id: i64,
    pub recipe_id: i64,
    pub budget_name: String,
    pub budget_date: NaiveDate,
    pub servings: i64,
    #[serde(flatten)]
    pub costs: CostComponents,
    pub notes: Option<String>,
    #[serde(default)]
    pub status: BudgetStatus,
}

/// Partial update of a budget. Each cost field overrides the stored one independently.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeBudgetUpdate {
    pub budget_name: Option<String>,
    pub budget_date: Option<NaiveDate>,
    pub servings: Option<i64>,
    pub ingredient_cost: Option<Decimal>,
    pub labor_cost: Option<Decimal>,
    pub overhead_cost: Option<Decimal>,
    pub packaging_cost: Option<Decimal>,
    pub other_costs: Option<Decimal>,
    pub profit_margin_percentage: Option<Decimal>,
    pub notes: Option<String>,
    pub status: Option<BudgetStatus>,
}

impl RecipeBudgetUpdate {
    /// Overlay the provided cost fields on `existing`
    pub fn merge_costs(&self, existing: &CostComponents) -> CostComponents {
        CostComponents {
            ingredient_cost: self.ingredient_cost.unwrap_or(existing.ingredient_cost),
            labor_cost: self.labor_cost.unwrap_or(existing.labor_cost),
            overhead_cost: self.overhead_cost.unwrap_or(existing.overhead_cost),
            packaging_cost: self.packaging_cost.unwrap_or(existing.packaging_cost),
            other_costs: self.other_costs.unwrap_or(existing.other_costs),
            profit_margin_percentage: self
                .profit_margin_percentage
                .unwrap_or(existing.profit_margin_percentage),
        }
    }

    /// Replace every cost field with the given values
    pub fn with_costs(mut self, costs: &CostComponents) -> Self {
        self.ingredient_cost = Some(costs.ingredient_cost);
        self.labor_cost = Some(costs.labor_cost);
        self.overhead_cost = Some(costs.overhead_cost);
        self.packaging_cost = Some(costs.packaging_cost);
        self.other_costs = Some(costs.other_costs);
        self.profit_margin_percentage = Some(costs.profit_margin_percentage);
        self
    }
}

/// Read a decimal stored as text
fn decimal_column(row: &Row, column: &str) -> rusqlite::Result<Decimal> {
    let idx = row.as_ref().column_index(column)?;
    let raw: String = row.get(idx)?;
    Decimal::from_str(raw.trim())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl RecipeBudget {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            recipe_id: row.get("recipe_id")?,
            budget_name: row.get("budget_name")?,
            budget_date: row.get("budget_date")?,
            servings: row.get("servings")?,
            costs: CostComponents {
                ingredient_cost: decimal_column(row, "ingredient_cost")?,
                labor_cost: decimal_column(row, "labor_cost")?,
                overhead_cost: decimal_column(row, "overhead_cost")?,
                packaging_cost: decimal_column(row, "packaging_cost")?,
                other_costs: decimal_column(row, "other_costs")?,
                profit_margin_percentage: decimal_column(row, "profit_margin_percentage")?,
            },
            total_cost: decimal_column(row, "total_cost")?,
            selling_price: decimal_column(row, "selling_price")?,
            notes: row.get("notes")?,
            status: row.get("status")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new budget together with its computed totals
    pub fn create(
        conn: &Connection,
        data: &RecipeBudgetCreate,
        totals: &BudgetTotals,
    ) -> DbResult<Self> {
        let costs = &data.costs;
        conn.execute(
            r#"
            INSERT INTO recipe_budgets (
                user_id, recipe_id, budget_name, budget_date, servings,
                ingredient_cost, labor_cost, overhead_cost, packaging_cost, other_costs,
                profit_margin_percentage, total_cost, selling_price, notes, status
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                data.user_id,
                data.recipe_id,
                data.budget_name,
                data.budget_date,
                data.servings,
                costs.ingredient_cost.to_string(),
                costs.labor_cost.to_string(),
                costs.overhead_cost.to_string(),
                costs.packaging_cost.to_string(),
                costs.other_costs.to_string(),
                costs.profit_margin_percentage.to_string(),
                totals.total_cost.to_string(),
                totals.selling_price.to_string(),
                data.notes,
                data.status,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a budget by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM recipe_budgets WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(budget) => Ok(Some(budget)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Budgets of one recipe, newest first
    pub fn list_for_recipe(conn: &Connection, recipe_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM recipe_budgets WHERE recipe_id = ?1 ORDER BY budget_date DESC, id DESC",
        )?;
        let budgets = stmt
            .query_map([recipe_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(budgets)
    }

    /// Budgets of one user, optionally filtered by status, newest first
    pub fn list_for_user(
        conn: &Connection,
        user_id: i64,
        status: Option<BudgetStatus>,
    ) -> DbResult<Vec<Self>> {
        let budgets = match status {
            Some(status) => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM recipe_budgets WHERE user_id = ?1 AND status = ?2 ORDER BY budget_date DESC, id DESC",
                )?;
                let rows = stmt.query_map(params![user_id, status], Self::from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM recipe_budgets WHERE user_id = ?1 ORDER BY budget_date DESC, id DESC",
                )?;
                let rows = stmt.query_map([user_id], Self::from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(budgets)
    }

    /// IDs of every stored budget
    pub fn list_ids(conn: &Connection) -> DbResult<Vec<i64>> {
        let mut stmt = conn.prepare("SELECT id FROM recipe_budgets ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Apply a partial update and write the given totals alongside it
    pub fn update(
        conn: &Connection,
        id: i64,
        data: &RecipeBudgetUpdate,
        totals: &BudgetTotals,
    ) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = data.budget_name {
            updates.push(format!("budget_name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(name.clone()));
        }
        if let Some(date) = data.budget_date {
            updates.push(format!("budget_date = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(date));
        }
        if let Some(servings) = data.servings {
            updates.push(format!("servings = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(servings));
        }

        let cost_fields = [
            ("ingredient_cost", data.ingredient_cost),
            ("labor_cost", data.labor_cost),
            ("overhead_cost", data.overhead_cost),
            ("packaging_cost", data.packaging_cost),
            ("other_costs", data.other_costs),
            ("profit_margin_percentage", data.profit_margin_percentage),
        ];
        for (column, value) in cost_fields {
            if let Some(value) = value {
                updates.push(format!("{} = ?{}", column, params_vec.len() + 1));
                params_vec.push(Box::new(value.to_string()));
            }
        }

        if let Some(ref notes) = data.notes {
            updates.push(format!("notes = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(notes.clone()));
        }
        if let Some(status) = data.status {
            updates.push(format!("status = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(status));
        }

        updates.push(format!("total_cost = ?{}", params_vec.len() + 1));
        params_vec.push(Box::new(totals.total_cost.to_string()));
        updates.push(format!("selling_price = ?{}", params_vec.len() + 1));
        params_vec.push(Box::new(totals.selling_price.to_string()));
        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE recipe_budgets SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();
        let rows = conn.execute(&sql, params_refs.as_slice())?;
        if rows == 0 {
            return Ok(None);
        }

        Self::get_by_id(conn, id)
    }

    /// Overwrite only the derived totals
    pub fn update_totals(conn: &Connection, id: i64, totals: &BudgetTotals) -> DbResult<bool> {
        let rows = conn.execute(
            r#"
            UPDATE recipe_budgets SET
                total_cost = ?1,
                selling_price = ?2,
                updated_at = datetime('now')
            WHERE id = ?3
            "#,
            params![
                totals.total_cost.to_string(),
                totals.selling_price.to_string(),
                id,
            ],
        )?;
        Ok(rows > 0)
    }

    /// Delete a budget. Returns Ok(false) if not found.
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM recipe_budgets WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn setup() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        conn
    }

    fn sample(recipe_id: i64, date: &str) -> RecipeBudgetCreate {
        RecipeBudgetCreate {
            user_id: 1,
            recipe_id,
            budget_name: "Weekend batch".to_string(),
            budget_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            servings: 4,
            costs: CostComponents {
                ingredient_cost: Decimal::new(1050, 2),
                ..Default::default()
            },
            notes: None,
            status: BudgetStatus::Draft,
        }
    }

    fn totals(total: i64, price: i64) -> BudgetTotals {
        BudgetTotals {
            total_cost: Decimal::new(total, 2),
            selling_price: Decimal::new(price, 2),
        }
    }

    #[test]
    fn test_create_round_trips_decimals_and_date() {
        let conn = setup();
        let budget = RecipeBudget::create(&conn, &sample(3, "2026-01-09"), &totals(1050, 1260)).unwrap();

        assert_eq!(budget.costs.ingredient_cost, Decimal::new(1050, 2));
        assert_eq!(budget.costs.labor_cost, Decimal::ZERO);
        assert_eq!(budget.total_cost, Decimal::new(1050, 2));
        assert_eq!(budget.selling_price, Decimal::new(1260, 2));
        assert_eq!(budget.budget_date.to_string(), "2026-01-09");
        assert_eq!(budget.status, BudgetStatus::Draft);
    }

    #[test]
    fn test_malformed_money_fails_the_read() {
        let conn = setup();
        let budget = RecipeBudget::create(&conn, &sample(3, "2026-01-09"), &totals(1050, 1050)).unwrap();
        conn.execute(
            "UPDATE recipe_budgets SET labor_cost = 'lots' WHERE id = ?1",
            [budget.id],
        )
        .unwrap();

        assert!(RecipeBudget::get_by_id(&conn, budget.id).is_err());
    }

    #[test]
    fn test_update_missing_budget_returns_none() {
        let conn = setup();
        let result = RecipeBudget::update(
            &conn,
            42,
            &RecipeBudgetUpdate::default(),
            &totals(0, 0),
        )
        .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_listing_orders_newest_first_and_filters_status() {
        let conn = setup();
        RecipeBudget::create(&conn, &sample(3, "2026-01-01"), &totals(0, 0)).unwrap();
        let newer = RecipeBudget::create(&conn, &sample(3, "2026-02-01"), &totals(0, 0)).unwrap();
        let mut archived = sample(5, "2026-03-01");
        archived.status = BudgetStatus::Archived;
        RecipeBudget::create(&conn, &archived, &totals(0, 0)).unwrap();

        let for_recipe = RecipeBudget::list_for_recipe(&conn, 3).unwrap();
        assert_eq!(for_recipe.len(), 2);
        assert_eq!(for_recipe[0].id, newer.id);

        let archived_only =
            RecipeBudget::list_for_user(&conn, 1, Some(BudgetStatus::Archived)).unwrap();
        assert_eq!(archived_only.len(), 1);
        assert_eq!(archived_only[0].recipe_id, 5);

        assert_eq!(RecipeBudget::list_for_user(&conn, 1, None).unwrap().len(), 3);
    }

    #[test]
    fn test_merge_costs_overrides_only_given_fields() {
        let existing = CostComponents {
            ingredient_cost: Decimal::from(10),
            labor_cost: Decimal::from(5),
            ..Default::default()
        };
        let update = RecipeBudgetUpdate {
            labor_cost: Some(Decimal::from(15)),
            ..Default::default()
        };
        let merged = update.merge_costs(&existing);
        assert_eq!(merged.ingredient_cost, Decimal::from(10));
        assert_eq!(merged.labor_cost, Decimal::from(15));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(BudgetStatus::parse("Active"), Some(BudgetStatus::Active));
        assert_eq!(BudgetStatus::parse("deleted"), None);
        assert_eq!(BudgetStatus::default(), BudgetStatus::Draft);
    }
}
