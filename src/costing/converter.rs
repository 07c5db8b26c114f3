//! Unit conversion
//!
//! Each unit carries a factor to its family's base measure, so converting A to B
//! scales by A's factor and then by the inverse of B's factor. The base unit
//! record itself is never needed.

use super::error::{CostingError, CostingResult};
use super::store::UnitStore;
use crate::models::Unit;

/// Effective factor of a unit: absent means 1, anything else must be finite and positive
pub fn effective_factor(unit: &Unit) -> CostingResult<f64> {
    match unit.conversion_factor {
        None => Ok(1.0),
        Some(factor) if factor.is_finite() && factor > 0.0 => Ok(factor),
        Some(factor) => Err(CostingError::InvalidConversionFactor {
            unit: unit.abbreviation.clone(),
            factor,
        }),
    }
}

/// Convert a quantity between two resolved units of the same family
pub fn convert_quantity(value: f64, from: &Unit, to: &Unit) -> CostingResult<f64> {
    if from.unit_type != to.unit_type {
        return Err(CostingError::IncompatibleUnitTypes {
            from: from.unit_type.clone(),
            to: to.unit_type.clone(),
        });
    }

    let from_factor = effective_factor(from)?;
    let to_factor = effective_factor(to)?;
    let out_of_range = || CostingError::ConversionOutOfRange {
        value,
        from: from.abbreviation.clone(),
        to: to.abbreviation.clone(),
    };
    if !value.is_finite() {
        return Err(out_of_range());
    }

    // Same unit or same scale: skip the float round trip so identity is exact
    if from.id == to.id || from_factor == to_factor {
        return Ok(value);
    }

    let base_value = value * from_factor;
    let converted = base_value / to_factor;
    if !base_value.is_finite() || !converted.is_finite() {
        return Err(out_of_range());
    }
    Ok(converted)
}

/// Converts quantities between stored units
pub struct UnitConversionService<S> {
    store: S,
}

impl<S: UnitStore> UnitConversionService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Convert `value` from one unit to another, both looked up by ID.
    ///
    /// Returns `Ok(None)` when either unit does not exist or is inactive.
    pub async fn convert(
        &self,
        value: f64,
        from_unit_id: i64,
        to_unit_id: i64,
    ) -> CostingResult<Option<f64>> {
        let Some(from) = self.store.find_by_id(from_unit_id).await? else {
            tracing::debug!(unit_id = from_unit_id, "source unit not found");
            return Ok(None);
        };
        let Some(to) = self.store.find_by_id(to_unit_id).await? else {
            tracing::debug!(unit_id = to_unit_id, "target unit not found");
            return Ok(None);
        };

        let converted = convert_quantity(value, &from, &to)?;
        tracing::debug!(
            value,
            from = %from.abbreviation,
            to = %to.abbreviation,
            converted,
            "converted quantity"
        );
        Ok(Some(converted))
    }

    /// Active units of one family
    pub async fn units_for_family(&self, unit_type: &str) -> CostingResult<Vec<Unit>> {
        Ok(self.store.find_by_type(unit_type).await?)
    }

    /// The active base unit of a family, for display and anchoring
    pub async fn find_base_unit_for_family(&self, unit_type: &str) -> CostingResult<Option<Unit>> {
        Ok(self.store.find_base_unit(unit_type).await?)
    }
}
