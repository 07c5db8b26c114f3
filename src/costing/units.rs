//! Unit families and the standard unit catalog
//!
//! Conversion factors express how many base units of the family one unit equals.

use serde::{Deserialize, Serialize};

/// Well-known unit families. Stored `unit_type` values are free-form, these
/// are the ones seeded by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitFamily {
    /// Mass, based on grams
    Weight,
    /// Volume, based on milliliters
    Volume,
    /// Discrete items, based on a single item
    Count,
}

impl UnitFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitFamily::Weight => "weight",
            UnitFamily::Volume => "volume",
            UnitFamily::Count => "count",
        }
    }
}

/// Normalize a free-form unit type so family comparison is exact
pub fn normalize_unit_type(unit_type: &str) -> String {
    unit_type.trim().to_lowercase()
}

// ============================================================================
// Volume Conversion Constants (to milliliters)
// ============================================================================

pub const ML_PER_TSP: f64 = 4.92892;
pub const ML_PER_TBSP: f64 = 14.7868;
pub const ML_PER_FL_OZ: f64 = 29.5735;
pub const ML_PER_CUP: f64 = 236.588;
pub const ML_PER_PINT: f64 = 473.176;
pub const ML_PER_QUART: f64 = 946.353;
pub const ML_PER_LITER: f64 = 1000.0;
pub const ML_PER_GALLON: f64 = 3785.41;

// ============================================================================
// Weight Conversion Constants (to grams)
// ============================================================================

pub const G_PER_MG: f64 = 0.001;
pub const G_PER_KG: f64 = 1000.0;
pub const G_PER_OZ: f64 = 28.3495;
pub const G_PER_LB: f64 = 453.592;

/// A unit seeded into a fresh database
#[derive(Debug, Clone, Copy)]
pub struct StandardUnit {
    pub name: &'static str,
    pub abbreviation: &'static str,
    pub family: UnitFamily,
    pub category: Option<&'static str>,
    pub conversion_factor: f64,
    pub base_unit: bool,
}

const fn unit(
    name: &'static str,
    abbreviation: &'static str,
    family: UnitFamily,
    category: Option<&'static str>,
    conversion_factor: f64,
    base_unit: bool,
) -> StandardUnit {
    StandardUnit {
        name,
        abbreviation,
        family,
        category,
        conversion_factor,
        base_unit,
    }
}

const METRIC: Option<&str> = Some("metric");
const IMPERIAL: Option<&str> = Some("imperial");

pub const STANDARD_UNITS: &[StandardUnit] = &[
    // Weight
    unit("gram", "g", UnitFamily::Weight, METRIC, 1.0, true),
    unit("milligram", "mg", UnitFamily::Weight, METRIC, G_PER_MG, false),
    unit("kilogram", "kg", UnitFamily::Weight, METRIC, G_PER_KG, false),
    unit("ounce", "oz", UnitFamily::Weight, IMPERIAL, G_PER_OZ, false),
    unit("pound", "lb", UnitFamily::Weight, IMPERIAL, G_PER_LB, false),
    // Volume
    unit("milliliter", "ml", UnitFamily::Volume, METRIC, 1.0, true),
    unit("liter", "l", UnitFamily::Volume, METRIC, ML_PER_LITER, false),
    unit("teaspoon", "tsp", UnitFamily::Volume, IMPERIAL, ML_PER_TSP, false),
    unit("tablespoon", "tbsp", UnitFamily::Volume, IMPERIAL, ML_PER_TBSP, false),
    unit("fluid ounce", "fl oz", UnitFamily::Volume, IMPERIAL, ML_PER_FL_OZ, false),
    unit("cup", "cup", UnitFamily::Volume, IMPERIAL, ML_PER_CUP, false),
    unit("pint", "pint", UnitFamily::Volume, IMPERIAL, ML_PER_PINT, false),
    unit("quart", "quart", UnitFamily::Volume, IMPERIAL, ML_PER_QUART, false),
    unit("gallon", "gallon", UnitFamily::Volume, IMPERIAL, ML_PER_GALLON, false),
    // Count
    unit("each", "each", UnitFamily::Count, None, 1.0, true),
    unit("dozen", "dozen", UnitFamily::Count, None, 12.0, false),
];
