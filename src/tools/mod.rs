//! UGM Tools module
//!
//! MCP tool implementations for the Universal Gastronomy Manager.

pub mod budgets;
pub mod status;
pub mod units;
