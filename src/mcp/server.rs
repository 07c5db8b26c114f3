//! UGM MCP Server Implementation
//!
//! Implements the MCP server with all UGM tools.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::costing::{
    BudgetCalculator, CostingError, SqliteBudgetStore, SqliteUnitStore, UnitConversionService,
};
use crate::db::Database;
use crate::models::{
    BudgetStatus, CostComponents, RecipeBudgetCreate, RecipeBudgetUpdate, UnitCreate, UnitUpdate,
};
use crate::tools::budgets::{self, BudgetFilter};
use crate::tools::status::StatusTracker;
use crate::tools::units::{self, UnitToolError};

/// UGM MCP Service
#[derive(Clone)]
pub struct UgmService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    converter: Arc<UnitConversionService<SqliteUnitStore>>,
    calculator: Arc<BudgetCalculator<SqliteBudgetStore>>,
    tool_router: ToolRouter<UgmService>,
}

impl UgmService {
    pub fn new(database_path: PathBuf, database: Database) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            converter: Arc::new(UnitConversionService::new(SqliteUnitStore::new(
                database.clone(),
            ))),
            calculator: Arc::new(BudgetCalculator::new(SqliteBudgetStore::new(
                database.clone(),
            ))),
            database,
            tool_router: Self::tool_router(),
        }
    }
}

// ============================================================================
// Parameter conversion helpers
// ============================================================================

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn not_found(what: &str, id: i64) -> Result<CallToolResult, McpError> {
    let json = serde_json::json!({ "error": format!("{} not found", what), "id": id });
    Ok(CallToolResult::success(vec![Content::text(json.to_string())]))
}

fn costing_error(e: CostingError) -> McpError {
    if e.is_invalid_input() {
        McpError::invalid_params(e.to_string(), None)
    } else {
        McpError::internal_error(e.to_string(), None)
    }
}

fn unit_tool_error(e: UnitToolError) -> McpError {
    match e {
        UnitToolError::Invalid(message) => McpError::invalid_params(message, None),
        UnitToolError::Storage(e) => McpError::internal_error(e.to_string(), None),
    }
}

fn decimal_param(field: &str, value: f64) -> Result<Decimal, McpError> {
    Decimal::try_from(value).map_err(|_| {
        McpError::invalid_params(format!("{} must be a finite number, got {}", field, value), None)
    })
}

fn optional_decimal(field: &str, value: Option<f64>) -> Result<Option<Decimal>, McpError> {
    value.map(|v| decimal_param(field, v)).transpose()
}

fn date_param(value: &str) -> Result<NaiveDate, McpError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        McpError::invalid_params(format!("budget_date must be YYYY-MM-DD, got '{}'", value), None)
    })
}

fn status_param(value: &str) -> Result<BudgetStatus, McpError> {
    BudgetStatus::parse(value).ok_or_else(|| {
        McpError::invalid_params(
            format!("status must be draft, active or archived, got '{}'", value),
            None,
        )
    })
}

// ============================================================================
// Unit Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddUnitParams {
    /// Full name, e.g. "tablespoon"
    pub name: String,
    /// Short form, e.g. "tbsp"
    pub abbreviation: String,
    /// Unit family, e.g. "weight", "volume", "count"
    pub unit_type: String,
    /// Optional grouping, e.g. "metric", "imperial"
    pub category: Option<String>,
    /// Base-family units per one of this unit (default 1)
    pub conversion_factor: Option<f64>,
    /// Mark as the family's base unit (default false)
    #[serde(default)]
    pub base_unit: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetUnitParams {
    /// Unit ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListUnitsParams {
    /// Only units of this family
    pub unit_type: Option<String>,
    /// Only units of this category
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateUnitParams {
    pub id: i64,
    pub name: Option<String>,
    pub abbreviation: Option<String>,
    pub unit_type: Option<String>,
    pub category: Option<String>,
    pub conversion_factor: Option<f64>,
    pub base_unit: Option<bool>,
    /// Set true to reactivate a deleted unit
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteUnitParams {
    /// Unit ID to deactivate
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetBaseUnitParams {
    /// Unit family
    pub unit_type: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ConvertUnitsParams {
    /// Quantity to convert
    pub value: f64,
    /// Unit the quantity is expressed in
    pub from_unit_id: i64,
    /// Unit to convert into (same family)
    pub to_unit_id: i64,
}

// ============================================================================
// Budget Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateBudgetParams {
    pub user_id: i64,
    pub recipe_id: i64,
    pub budget_name: String,
    /// ISO date: YYYY-MM-DD
    pub budget_date: String,
    /// Number of servings (at least 1)
    pub servings: i64,
    #[serde(default)]
    pub ingredient_cost: f64,
    #[serde(default)]
    pub labor_cost: f64,
    #[serde(default)]
    pub overhead_cost: f64,
    #[serde(default)]
    pub packaging_cost: f64,
    #[serde(default)]
    pub other_costs: f64,
    /// Markup on total cost in percent (default 0)
    #[serde(default)]
    pub profit_margin_percentage: f64,
    pub notes: Option<String>,
    /// draft (default), active or archived
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetBudgetParams {
    /// Budget ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListBudgetsParams {
    /// List budgets of this recipe
    pub recipe_id: Option<i64>,
    /// List budgets of this user (ignored when recipe_id is set)
    pub user_id: Option<i64>,
    /// With user_id: only budgets in this status
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateBudgetParams {
    pub id: i64,
    pub budget_name: Option<String>,
    /// ISO date: YYYY-MM-DD
    pub budget_date: Option<String>,
    pub servings: Option<i64>,
    pub ingredient_cost: Option<f64>,
    pub labor_cost: Option<f64>,
    pub overhead_cost: Option<f64>,
    pub packaging_cost: Option<f64>,
    pub other_costs: Option<f64>,
    pub profit_margin_percentage: Option<f64>,
    pub notes: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteBudgetParams {
    /// Budget ID to delete
    pub id: i64,
}

impl CreateBudgetParams {
    fn into_create(self) -> Result<RecipeBudgetCreate, McpError> {
        Ok(RecipeBudgetCreate {
            user_id: self.user_id,
            recipe_id: self.recipe_id,
            budget_name: self.budget_name,
            budget_date: date_param(&self.budget_date)?,
            servings: self.servings,
            costs: CostComponents {
                ingredient_cost: decimal_param("ingredient_cost", self.ingredient_cost)?,
                labor_cost: decimal_param("labor_cost", self.labor_cost)?,
                overhead_cost: decimal_param("overhead_cost", self.overhead_cost)?,
                packaging_cost: decimal_param("packaging_cost", self.packaging_cost)?,
                other_costs: decimal_param("other_costs", self.other_costs)?,
                profit_margin_percentage: decimal_param(
                    "profit_margin_percentage",
                    self.profit_margin_percentage,
                )?,
            },
            notes: self.notes,
            status: self.status.as_deref().map(status_param).transpose()?.unwrap_or_default(),
        })
    }
}

impl UpdateBudgetParams {
    fn into_update(self) -> Result<(i64, RecipeBudgetUpdate), McpError> {
        let changes = RecipeBudgetUpdate {
            budget_name: self.budget_name,
            budget_date: self.budget_date.as_deref().map(date_param).transpose()?,
            servings: self.servings,
            ingredient_cost: optional_decimal("ingredient_cost", self.ingredient_cost)?,
            labor_cost: optional_decimal("labor_cost", self.labor_cost)?,
            overhead_cost: optional_decimal("overhead_cost", self.overhead_cost)?,
            packaging_cost: optional_decimal("packaging_cost", self.packaging_cost)?,
            other_costs: optional_decimal("other_costs", self.other_costs)?,
            profit_margin_percentage: optional_decimal(
                "profit_margin_percentage",
                self.profit_margin_percentage,
            )?,
            notes: self.notes,
            status: self.status.as_deref().map(status_param).transpose()?,
        };
        Ok((self.id, changes))
    }
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl UgmService {
    // --- Status ---

    #[tool(description = "Get the current status of the UGM service including build info, database status, and process information")]
    async fn ugm_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        to_json(&tracker.get_status())
    }

    #[tool(description = "Get instructions for managing units and recipe budgets. Call this when starting a costing session or when unsure how totals are computed.")]
    fn costing_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::COSTING_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(COSTING_INSTRUCTIONS)]))
    }

    // --- Units ---

    #[tool(description = "Create a new measurement unit in a unit family")]
    fn add_unit(&self, Parameters(p): Parameters<AddUnitParams>) -> Result<CallToolResult, McpError> {
        let data = UnitCreate {
            name: p.name, abbreviation: p.abbreviation, unit_type: p.unit_type,
            category: p.category, conversion_factor: p.conversion_factor, base_unit: p.base_unit,
        };
        let result = units::add_unit(&self.database, data).map_err(unit_tool_error)?;
        to_json(&result)
    }

    #[tool(description = "Get a unit by ID (including deactivated units)")]
    fn get_unit(&self, Parameters(p): Parameters<GetUnitParams>) -> Result<CallToolResult, McpError> {
        match units::get_unit(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))? {
            Some(unit) => to_json(&unit),
            None => not_found("Unit", p.id),
        }
    }

    #[tool(description = "List active units, optionally filtered by unit_type and/or category")]
    async fn list_units(&self, Parameters(p): Parameters<ListUnitsParams>) -> Result<CallToolResult, McpError> {
        let result = units::list_units(
            &self.database,
            &self.converter,
            p.unit_type.as_deref(),
            p.category.as_deref(),
        )
        .await
        .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Update a unit. Set is_active=true to reactivate a deleted unit.")]
    fn update_unit(&self, Parameters(p): Parameters<UpdateUnitParams>) -> Result<CallToolResult, McpError> {
        let data = UnitUpdate {
            name: p.name, abbreviation: p.abbreviation, unit_type: p.unit_type, category: p.category,
            conversion_factor: p.conversion_factor, base_unit: p.base_unit, is_active: p.is_active,
        };
        match units::update_unit(&self.database, p.id, data).map_err(unit_tool_error)? {
            Some(unit) => to_json(&unit),
            None => not_found("Unit", p.id),
        }
    }

    #[tool(description = "Delete (deactivate) a unit. Deactivated units cannot be used for conversion.")]
    fn delete_unit(&self, Parameters(p): Parameters<DeleteUnitParams>) -> Result<CallToolResult, McpError> {
        match units::delete_unit(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))? {
            Some(response) => to_json(&response),
            None => not_found("Unit", p.id),
        }
    }

    #[tool(description = "Get the base unit of a unit family")]
    async fn get_base_unit(&self, Parameters(p): Parameters<GetBaseUnitParams>) -> Result<CallToolResult, McpError> {
        match units::get_base_unit(&self.converter, &p.unit_type).await.map_err(costing_error)? {
            Some(unit) => to_json(&unit),
            None => {
                let json = serde_json::json!({ "error": "No base unit for unit type", "unit_type": p.unit_type });
                Ok(CallToolResult::success(vec![Content::text(json.to_string())]))
            }
        }
    }

    #[tool(description = "Convert a quantity from one unit to another within the same unit family")]
    async fn convert_units(&self, Parameters(p): Parameters<ConvertUnitsParams>) -> Result<CallToolResult, McpError> {
        let result = units::convert_units(&self.converter, p.value, p.from_unit_id, p.to_unit_id)
            .await
            .map_err(costing_error)?;
        match result {
            Some(response) => to_json(&response),
            None => {
                let json = serde_json::json!({
                    "error": "Unit not found",
                    "from_unit_id": p.from_unit_id,
                    "to_unit_id": p.to_unit_id,
                });
                Ok(CallToolResult::success(vec![Content::text(json.to_string())]))
            }
        }
    }

    // --- Budgets ---

    #[tool(description = "Create a recipe budget. total_cost and selling_price are computed from the cost components and profit margin.")]
    async fn create_budget(&self, Parameters(p): Parameters<CreateBudgetParams>) -> Result<CallToolResult, McpError> {
        let data = p.into_create()?;
        let result = budgets::create_budget(&self.calculator, data).await.map_err(costing_error)?;
        to_json(&result)
    }

    #[tool(description = "Get a recipe budget with cost and profit per serving")]
    async fn get_budget(&self, Parameters(p): Parameters<GetBudgetParams>) -> Result<CallToolResult, McpError> {
        match budgets::get_budget(&self.calculator, p.id).await.map_err(costing_error)? {
            Some(detail) => to_json(&detail),
            None => not_found("Recipe budget", p.id),
        }
    }

    #[tool(description = "List budgets for a recipe, or for a user with an optional status filter. Newest budget_date first.")]
    fn list_budgets(&self, Parameters(p): Parameters<ListBudgetsParams>) -> Result<CallToolResult, McpError> {
        let filter = match (p.recipe_id, p.user_id) {
            (Some(recipe_id), _) => BudgetFilter::Recipe(recipe_id),
            (None, Some(user_id)) => BudgetFilter::User {
                user_id,
                status: p.status.as_deref().map(status_param).transpose()?,
            },
            (None, None) => {
                return Err(McpError::invalid_params("Provide recipe_id or user_id", None));
            }
        };
        let result = budgets::list_budgets(&self.database, filter).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Update a recipe budget. Only pass fields that change; totals are recomputed from the merged values.")]
    async fn update_budget(&self, Parameters(p): Parameters<UpdateBudgetParams>) -> Result<CallToolResult, McpError> {
        let (id, changes) = p.into_update()?;
        match budgets::update_budget(&self.calculator, id, changes).await {
            Ok(detail) => to_json(&detail),
            Err(CostingError::BudgetNotFound(id)) => not_found("Recipe budget", id),
            Err(e) => Err(costing_error(e)),
        }
    }

    #[tool(description = "Delete a recipe budget")]
    fn delete_budget(&self, Parameters(p): Parameters<DeleteBudgetParams>) -> Result<CallToolResult, McpError> {
        match budgets::delete_budget(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))? {
            Some(response) => to_json(&response),
            None => not_found("Recipe budget", p.id),
        }
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for UgmService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "ugm".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Universal Gastronomy Manager".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Universal Gastronomy Manager (UGM) - Recipe costing and unit conversion. \
                 IMPORTANT: Call costing_instructions before creating budgets. \
                 Units: add/get/list/update/delete_unit, get_base_unit, convert_units. \
                 Budgets: create/get/list/update/delete_budget. \
                 Totals and selling prices are always computed by UGM."
                    .into(),
            ),
        }
    }
}
