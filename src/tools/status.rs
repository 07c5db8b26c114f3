//! UGM Status Tool
//!
//! Runtime status information and usage instructions for the UGM service.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;

/// Costing instructions for AI assistants
pub const COSTING_INSTRUCTIONS: &str = r#"
# UGM Recipe Costing Instructions

## Units

Units belong to a family (`unit_type`): "weight", "volume", "count", or any
custom family you create. Each unit has a `conversion_factor`: how many base
units of its family one of it equals. The seeded base units are:

| Family | Base unit | Example factor |
|--------|-----------|----------------|
| weight | g         | lb = 453.592   |
| volume | ml        | cup = 236.588  |
| count  | each      | dozen = 12     |

- `convert_units` only works within one family. Volume to weight needs a
  density, which UGM does not model; the call fails instead of guessing.
- `delete_unit` deactivates a unit. Inactive units cannot be converted and
  are hidden from listings. Reactivate with `update_unit` and `is_active: true`.
- Only one active base unit is allowed per family.

## Budgets

A budget is a costing snapshot of a recipe for a number of servings.

- Cost components: ingredient_cost, labor_cost, overhead_cost,
  packaging_cost, other_costs. All default to 0 and must not be negative.
- profit_margin_percentage: markup on total cost (20 means +20%).
- total_cost and selling_price are ALWAYS computed by UGM:
  - total_cost = sum of the five components
  - selling_price = total_cost + total_cost * margin / 100
  - both rounded half-to-even to 2 decimal places
- `update_budget` merges the fields you pass over the stored budget and
  recomputes the totals. Pass only what changed.
- `get_budget` also reports cost_per_serving and profit_per_serving.
- status is one of draft, active, archived.
- Dates use ISO format: YYYY-MM-DD
"#;

/// Runtime status of the UGM service
#[derive(Debug, Clone, Serialize)]
pub struct UgmStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    pub fn get_status(&self) -> UgmStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        UgmStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}
