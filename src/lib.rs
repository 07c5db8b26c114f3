//! Universal Gastronomy Manager (UGM) Library
//!
//! Recipe costing and unit conversion.

pub mod build_info;
pub mod config;
pub mod costing;
pub mod db;
pub mod mcp;
pub mod models;
pub mod tools;
