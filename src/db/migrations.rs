//! Database migrations
//!
//! Schema creation, migration and seed logic.

use rusqlite::{params, Connection};

use super::connection::DbResult;
use crate::costing::units::STANDARD_UNITS;

/// Current schema version
const SCHEMA_VERSION: i32 = 2;

/// Run all migrations to bring the database up to the current schema version.
///
/// Each migration runs inside its own transaction together with its version row.
pub fn run_migrations(conn: &mut Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        let tx = conn.transaction()?;
        migrate_v1(&tx)?;
        tx.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
        tx.commit()?;
        tracing::info!("applied schema migration 1");
    }

    if current_version < 2 {
        let tx = conn.transaction()?;
        migrate_v2(&tx)?;
        tx.execute("INSERT INTO schema_migrations (version) VALUES (2)", [])?;
        tx.commit()?;
        tracing::info!("applied schema migration 2");
    }

    Ok(())
}

/// Migration v1: units and recipe budgets
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- UNITS
        -- Measurement units grouped into families
        -- ============================================
        CREATE TABLE units (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            abbreviation TEXT NOT NULL,
            unit_type TEXT NOT NULL,             -- family: "weight", "volume", "count", ...
            category TEXT,                       -- "metric", "imperial", ...
            conversion_factor REAL,              -- base-family units per one of this unit; NULL means 1
            base_unit INTEGER NOT NULL DEFAULT 0,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_units_type ON units(unit_type);
        CREATE INDEX idx_units_category ON units(category);
        CREATE UNIQUE INDEX idx_units_one_base_per_type
            ON units(unit_type) WHERE base_unit = 1 AND is_active = 1;

        -- ============================================
        -- RECIPE BUDGETS
        -- Costing snapshots; money columns hold decimal text
        -- ============================================
        CREATE TABLE recipe_budgets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            recipe_id INTEGER NOT NULL,
            budget_name TEXT NOT NULL,
            budget_date TEXT NOT NULL,           -- ISO date: "2026-01-09"
            servings INTEGER NOT NULL,

            ingredient_cost TEXT NOT NULL DEFAULT '0',
            labor_cost TEXT NOT NULL DEFAULT '0',
            overhead_cost TEXT NOT NULL DEFAULT '0',
            packaging_cost TEXT NOT NULL DEFAULT '0',
            other_costs TEXT NOT NULL DEFAULT '0',
            profit_margin_percentage TEXT NOT NULL DEFAULT '0',

            -- Derived, always written by the calculator
            total_cost TEXT NOT NULL DEFAULT '0',
            selling_price TEXT NOT NULL DEFAULT '0',

            notes TEXT,
            status TEXT NOT NULL DEFAULT 'draft' CHECK(status IN ('draft', 'active', 'archived')),
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_recipe_budgets_recipe ON recipe_budgets(recipe_id);
        CREATE INDEX idx_recipe_budgets_user ON recipe_budgets(user_id);
        CREATE INDEX idx_recipe_budgets_user_status ON recipe_budgets(user_id, status);
        "#,
    )?;

    Ok(())
}

/// Migration v2: seed the standard unit catalog
fn migrate_v2(conn: &Connection) -> DbResult<()> {
    let mut stmt = conn.prepare(
        r#"
        INSERT INTO units (name, abbreviation, unit_type, category, conversion_factor, base_unit)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )?;

    for unit in STANDARD_UNITS {
        stmt.execute(params![
            unit.name,
            unit.abbreviation,
            unit.family.as_str(),
            unit.category,
            unit.conversion_factor,
            unit.base_unit as i32,
        ])?;
    }

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}
