//! Unit MCP Tools
//!
//! Tools for managing measurement units and converting quantities.

use rusqlite::ErrorCode;
use serde::Serialize;
use thiserror::Error;

use crate::costing::{normalize_unit_type, CostingResult, SqliteUnitStore, UnitConversionService};
use crate::db::{Database, DbError};
use crate::models::{Unit, UnitCreate, UnitUpdate};

/// Errors from the unit write tools
#[derive(Debug, Error)]
pub enum UnitToolError {
    #[error("{0}")]
    Invalid(String),

    #[error("Database error: {0}")]
    Storage(DbError),
}

impl From<DbError> for UnitToolError {
    fn from(e: DbError) -> Self {
        match e {
            // Unique or check constraint: e.g. a second active base unit for a family
            DbError::Sqlite(rusqlite::Error::SqliteFailure(ref failure, ref message))
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                UnitToolError::Invalid(
                    message.clone().unwrap_or_else(|| "constraint violation".to_string()),
                )
            }
            other => UnitToolError::Storage(other),
        }
    }
}

/// Response for list_units
#[derive(Debug, Serialize)]
pub struct ListUnitsResponse {
    pub units: Vec<Unit>,
    pub total: usize,
}

/// Response for convert_units
#[derive(Debug, Serialize)]
pub struct ConvertUnitsResponse {
    pub value: f64,
    pub from_unit_id: i64,
    pub to_unit_id: i64,
    pub converted: f64,
}

/// Response for delete_unit
#[derive(Debug, Serialize)]
pub struct DeleteUnitResponse {
    pub success: bool,
    pub deactivated_id: i64,
}

fn validate_factor(factor: Option<f64>) -> Result<(), UnitToolError> {
    match factor {
        Some(f) if !f.is_finite() || f <= 0.0 => Err(UnitToolError::Invalid(format!(
            "conversion_factor must be a positive number, got {}",
            f
        ))),
        _ => Ok(()),
    }
}

fn require_text(field: &str, value: &str) -> Result<String, UnitToolError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(UnitToolError::Invalid(format!("{} cannot be empty", field)));
    }
    Ok(trimmed.to_string())
}

/// Create a new unit
pub fn add_unit(db: &Database, mut data: UnitCreate) -> Result<Unit, UnitToolError> {
    data.name = require_text("name", &data.name)?;
    data.abbreviation = require_text("abbreviation", &data.abbreviation)?;
    data.unit_type = normalize_unit_type(&require_text("unit_type", &data.unit_type)?);
    validate_factor(data.conversion_factor)?;

    let conn = db.get_conn()?;
    let unit = Unit::create(&conn, &data)?;

    tracing::info!(unit_id = unit.id, unit_type = %unit.unit_type, "created unit");
    Ok(unit)
}

/// Get a unit by ID, including inactive ones
pub fn get_unit(db: &Database, id: i64) -> Result<Option<Unit>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    Unit::get_by_id(&conn, id).map_err(|e| format!("Failed to get unit: {}", e))
}

/// List active units, optionally by family or category
pub async fn list_units(
    db: &Database,
    service: &UnitConversionService<SqliteUnitStore>,
    unit_type: Option<&str>,
    category: Option<&str>,
) -> Result<ListUnitsResponse, String> {
    let units = match (unit_type, category) {
        (Some(t), _) => service
            .units_for_family(&normalize_unit_type(t))
            .await
            .map_err(|e| format!("Failed to list units: {}", e))?,
        (None, category) => {
            let category = category.map(|c| c.trim().to_string());
            db.run(move |conn| match category {
                Some(c) => Unit::list_by_category(conn, &c),
                None => Unit::list_active(conn),
            })
            .await
            .map_err(|e| format!("Failed to list units: {}", e))?
        }
    };

    // Both filters: narrow the family listing by category
    let units: Vec<Unit> = match (unit_type, category) {
        (Some(_), Some(c)) => units
            .into_iter()
            .filter(|u| u.category.as_deref() == Some(c.trim()))
            .collect(),
        _ => units,
    };

    Ok(ListUnitsResponse {
        total: units.len(),
        units,
    })
}

/// Update a unit
pub fn update_unit(
    db: &Database,
    id: i64,
    mut data: UnitUpdate,
) -> Result<Option<Unit>, UnitToolError> {
    if let Some(ref name) = data.name {
        data.name = Some(require_text("name", name)?);
    }
    if let Some(ref abbreviation) = data.abbreviation {
        data.abbreviation = Some(require_text("abbreviation", abbreviation)?);
    }
    if let Some(ref unit_type) = data.unit_type {
        data.unit_type = Some(normalize_unit_type(&require_text("unit_type", unit_type)?));
    }
    validate_factor(data.conversion_factor)?;

    let conn = db.get_conn()?;
    Ok(Unit::update(&conn, id, &data)?)
}

/// Soft delete a unit
pub fn delete_unit(db: &Database, id: i64) -> Result<Option<DeleteUnitResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let deactivated =
        Unit::deactivate(&conn, id).map_err(|e| format!("Failed to delete unit: {}", e))?;

    Ok(deactivated.then_some(DeleteUnitResponse {
        success: true,
        deactivated_id: id,
    }))
}

/// Convert a quantity between two units
pub async fn convert_units(
    service: &UnitConversionService<SqliteUnitStore>,
    value: f64,
    from_unit_id: i64,
    to_unit_id: i64,
) -> CostingResult<Option<ConvertUnitsResponse>> {
    let converted = service.convert(value, from_unit_id, to_unit_id).await?;
    Ok(converted.map(|converted| ConvertUnitsResponse {
        value,
        from_unit_id,
        to_unit_id,
        converted,
    }))
}

/// Get the base unit of a family
pub async fn get_base_unit(
    service: &UnitConversionService<SqliteUnitStore>,
    unit_type: &str,
) -> CostingResult<Option<Unit>> {
    service
        .find_base_unit_for_family(&normalize_unit_type(unit_type))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costing::store::test_database;

    fn create(unit_type: &str, factor: Option<f64>) -> UnitCreate {
        UnitCreate {
            name: " stick ".to_string(),
            abbreviation: "stick".to_string(),
            unit_type: unit_type.to_string(),
            category: Some("imperial".to_string()),
            conversion_factor: factor,
            base_unit: false,
        }
    }

    #[test]
    fn test_add_unit_normalizes() {
        let db = test_database();
        let unit = add_unit(&db, create(" Weight ", Some(113.0))).unwrap();
        assert_eq!(unit.name, "stick");
        assert_eq!(unit.unit_type, "weight");
    }

    #[test]
    fn test_add_unit_rejects_bad_factor() {
        let db = test_database();
        assert!(matches!(
            add_unit(&db, create("weight", Some(0.0))),
            Err(UnitToolError::Invalid(_))
        ));
        assert!(matches!(
            add_unit(&db, create("weight", Some(-3.0))),
            Err(UnitToolError::Invalid(_))
        ));
        assert!(matches!(
            add_unit(&db, create("  ", Some(1.0))),
            Err(UnitToolError::Invalid(_))
        ));
    }

    #[test]
    fn test_second_base_unit_is_invalid_input() {
        let db = test_database();
        let mut base = create("weight", Some(1.0));
        base.base_unit = true;
        assert!(matches!(add_unit(&db, base), Err(UnitToolError::Invalid(_))));
    }

    #[test]
    fn test_storage_failure_is_not_invalid_input() {
        let err = UnitToolError::from(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows));
        assert!(matches!(err, UnitToolError::Storage(_)));
    }

    #[tokio::test]
    async fn test_list_units_filters() {
        let db = test_database();
        let service = UnitConversionService::new(SqliteUnitStore::new(db.clone()));
        let all = list_units(&db, &service, None, None).await.unwrap();
        assert_eq!(all.total, crate::costing::STANDARD_UNITS.len());

        let imperial = list_units(&db, &service, None, Some(" imperial ")).await.unwrap();
        assert!(imperial.units.iter().all(|u| u.category.as_deref() == Some("imperial")));
        assert!(imperial.total > 0);

        let metric_volume = list_units(&db, &service, Some("VOLUME"), Some("metric"))
            .await
            .unwrap();
        let abbreviations: Vec<_> = metric_volume.units.iter().map(|u| u.abbreviation.as_str()).collect();
        assert_eq!(abbreviations, vec!["ml", "l"]);
    }

    #[test]
    fn test_delete_unit() {
        let db = test_database();
        let unit = add_unit(&db, create("weight", Some(113.0))).unwrap();
        assert!(delete_unit(&db, unit.id).unwrap().is_some());
        assert!(delete_unit(&db, 12345).unwrap().is_none());
        assert!(!get_unit(&db, unit.id).unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn test_convert_units_tool() {
        let db = test_database();
        let service = UnitConversionService::new(SqliteUnitStore::new(db.clone()));
        let stick = add_unit(&db, create("weight", Some(113.0))).unwrap();
        let base = get_base_unit(&service, " weight").await.unwrap().unwrap();

        let response = convert_units(&service, 2.0, stick.id, base.id)
            .await
            .unwrap()
            .unwrap();
        assert!((response.converted - 226.0).abs() < 1e-9);
    }
}
