//! Recompute stored budget totals from their cost components
//! Usage: cargo run --bin recalculate_budgets -- [--dry-run]

use rusqlite::Connection;
use ugm::costing::compute_totals;
use ugm::db::{migrations, Database, DbResult};
use ugm::models::RecipeBudget;

#[derive(Debug, Default, PartialEq)]
struct Summary {
    changed: usize,
    skipped: usize,
}

fn recalculate(conn: &Connection, dry_run: bool) -> DbResult<Summary> {
    let ids = RecipeBudget::list_ids(conn)?;
    println!("Checking {} budgets", ids.len());

    let mut summary = Summary::default();
    for id in ids {
        let budget = match RecipeBudget::get_by_id(conn, id) {
            Ok(Some(budget)) => budget,
            Ok(None) => continue,
            Err(e) => {
                println!("Budget {}: skipped, unreadable row: {}", id, e);
                summary.skipped += 1;
                continue;
            }
        };

        let totals = match compute_totals(&budget.costs) {
            Ok(totals) => totals,
            Err(e) => {
                println!("Budget {} ({}): skipped, {}", id, budget.budget_name, e);
                summary.skipped += 1;
                continue;
            }
        };

        if totals.total_cost == budget.total_cost && totals.selling_price == budget.selling_price {
            continue;
        }

        println!("\nBudget {} ({})", id, budget.budget_name);
        println!("  Total cost:    {} -> {}", budget.total_cost, totals.total_cost);
        println!("  Selling price: {} -> {}", budget.selling_price, totals.selling_price);

        if !dry_run {
            RecipeBudget::update_totals(conn, id, &totals)?;
        }
        summary.changed += 1;
    }

    Ok(summary)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dry_run = std::env::args().skip(1).any(|a| a == "--dry-run");

    let db_path = ugm::config::database_path();
    println!("Database: {}", db_path.display());

    let database = Database::new(&db_path)?;
    database.with_conn_mut(migrations::run_migrations)?;

    let summary = database.with_conn(|conn| recalculate(conn, dry_run))?;

    let verb = if dry_run { "would be updated" } else { "updated" };
    println!("\n{} budgets {}, {} skipped", summary.changed, verb, summary.skipped);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use ugm::models::{BudgetStatus, BudgetTotals, CostComponents, RecipeBudgetCreate};

    fn setup() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        migrations::run_migrations(&mut conn).unwrap();
        conn
    }

    fn stale_budget(conn: &Connection) -> RecipeBudget {
        let data = RecipeBudgetCreate {
            user_id: 1,
            recipe_id: 1,
            budget_name: "Stale".to_string(),
            budget_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            servings: 2,
            costs: CostComponents {
                ingredient_cost: Decimal::from(10),
                profit_margin_percentage: Decimal::from(50),
                ..Default::default()
            },
            notes: None,
            status: BudgetStatus::Draft,
        };
        RecipeBudget::create(conn, &data, &BudgetTotals::default()).unwrap()
    }

    #[test]
    fn test_unreadable_row_is_skipped() {
        let conn = setup();
        let broken = stale_budget(&conn);
        let good = stale_budget(&conn);
        conn.execute(
            "UPDATE recipe_budgets SET labor_cost = 'lots' WHERE id = ?1",
            [broken.id],
        )
        .unwrap();

        let summary = recalculate(&conn, false).unwrap();
        assert_eq!(summary, Summary { changed: 1, skipped: 1 });

        let fixed = RecipeBudget::get_by_id(&conn, good.id).unwrap().unwrap();
        assert_eq!(fixed.total_cost, Decimal::from(10));
        assert_eq!(fixed.selling_price, Decimal::from(15));
    }

    #[test]
    fn test_dry_run_leaves_rows_alone() {
        let conn = setup();
        let budget = stale_budget(&conn);

        let summary = recalculate(&conn, true).unwrap();
        assert_eq!(summary, Summary { changed: 1, skipped: 0 });

        let stored = RecipeBudget::get_by_id(&conn, budget.id).unwrap().unwrap();
        assert_eq!(stored.total_cost, Decimal::ZERO);
    }
}
