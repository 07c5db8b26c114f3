//! Unit model
//!
//! Measurement units with linear conversion factors, soft-deleted via `is_active`.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// A measurement unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: i64,
    pub name: String,
    pub abbreviation: String,
    pub unit_type: String,
    pub category: Option<String>,
    /// Base-family units per one of this unit; `None` means 1
    pub conversion_factor: Option<f64>,
    pub base_unit: bool,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitCreate {
    pub name: String,
    pub abbreviation: String,
    pub unit_type: String,
    pub category: Option<String>,
    pub conversion_factor: Option<f64>,
    #[serde(default)]
    pub base_unit: bool,
}

/// Data for updating a unit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitUpdate {
    pub name: Option<String>,
    pub abbreviation: Option<String>,
    pub unit_type: Option<String>,
    pub category: Option<String>,
    pub conversion_factor: Option<f64>,
    pub base_unit: Option<bool>,
    pub is_active: Option<bool>,
}

impl Unit {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            abbreviation: row.get("abbreviation")?,
            unit_type: row.get("unit_type")?,
            category: row.get("category")?,
            conversion_factor: row.get("conversion_factor")?,
            base_unit: row.get::<_, i32>("base_unit")? != 0,
            is_active: row.get::<_, i32>("is_active")? != 0,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new unit into the database
    pub fn create(conn: &Connection, data: &UnitCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO units (name, abbreviation, unit_type, category, conversion_factor, base_unit)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                data.name,
                data.abbreviation,
                data.unit_type,
                data.category,
                data.conversion_factor,
                data.base_unit as i32,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a unit by ID, active or not
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        Self::query_one(conn, "SELECT * FROM units WHERE id = ?1", [id])
    }

    /// Get an active unit by ID
    pub fn get_active_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        Self::query_one(
            conn,
            "SELECT * FROM units WHERE id = ?1 AND is_active = 1",
            [id],
        )
    }

    /// List all active units
    pub fn list_active(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM units WHERE is_active = 1 ORDER BY unit_type, conversion_factor, name",
        )?;
        let units = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(units)
    }

    /// List active units of one family
    pub fn list_by_type(conn: &Connection, unit_type: &str) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM units WHERE unit_type = ?1 AND is_active = 1 ORDER BY conversion_factor, name",
        )?;
        let units = stmt
            .query_map([unit_type], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(units)
    }

    /// List active units of one category
    pub fn list_by_category(conn: &Connection, category: &str) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM units WHERE category = ?1 AND is_active = 1 ORDER BY unit_type, conversion_factor, name",
        )?;
        let units = stmt
            .query_map([category], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(units)
    }

    /// Find the active base unit of a family
    pub fn find_base_unit(conn: &Connection, unit_type: &str) -> DbResult<Option<Self>> {
        Self::query_one(
            conn,
            "SELECT * FROM units WHERE unit_type = ?1 AND base_unit = 1 AND is_active = 1",
            [unit_type],
        )
    }

    /// Update a unit
    pub fn update(conn: &Connection, id: i64, data: &UnitUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = data.name {
            updates.push(format!("name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(name.clone()));
        }
        if let Some(ref abbreviation) = data.abbreviation {
            updates.push(format!("abbreviation = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(abbreviation.clone()));
        }
        if let Some(ref unit_type) = data.unit_type {
            updates.push(format!("unit_type = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(unit_type.clone()));
        }
        if let Some(ref category) = data.category {
            updates.push(format!("category = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(category.clone()));
        }
        if let Some(factor) = data.conversion_factor {
            updates.push(format!("conversion_factor = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(factor));
        }
        if let Some(base_unit) = data.base_unit {
            updates.push(format!("base_unit = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(base_unit as i32));
        }
        if let Some(is_active) = data.is_active {
            updates.push(format!("is_active = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(is_active as i32));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE units SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Soft delete: mark a unit inactive.
    /// Returns Ok(false) if the unit does not exist.
    pub fn deactivate(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute(
            "UPDATE units SET is_active = 0, updated_at = datetime('now') WHERE id = ?1",
            [id],
        )?;
        Ok(rows > 0)
    }

    fn query_one<P: rusqlite::Params>(
        conn: &Connection,
        sql: &str,
        params: P,
    ) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare(sql)?;
        match stmt.query_row(params, Self::from_row) {
            Ok(unit) => Ok(Some(unit)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
