//! Persistence collaborators for the costing services
//!
//! The services only see these traits; the SQLite implementations move the
//! blocking rusqlite calls onto tokio's blocking pool via [`Database::run`].

use async_trait::async_trait;

use crate::db::{Database, DbResult};
use crate::models::{
    BudgetTotals, RecipeBudget, RecipeBudgetCreate, RecipeBudgetUpdate, Unit,
};

/// Read-only unit lookups. Inactive units are never returned.
#[async_trait]
pub trait UnitStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> DbResult<Option<Unit>>;
    async fn find_by_type(&self, unit_type: &str) -> DbResult<Vec<Unit>>;
    async fn find_base_unit(&self, unit_type: &str) -> DbResult<Option<Unit>>;
}

/// Budget persistence
#[async_trait]
pub trait BudgetStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> DbResult<Option<RecipeBudget>>;
    async fn create(
        &self,
        data: RecipeBudgetCreate,
        totals: BudgetTotals,
    ) -> DbResult<RecipeBudget>;
    async fn update(
        &self,
        id: i64,
        data: RecipeBudgetUpdate,
        totals: BudgetTotals,
    ) -> DbResult<Option<RecipeBudget>>;
}

#[derive(Clone)]
pub struct SqliteUnitStore {
    db: Database,
}

impl SqliteUnitStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UnitStore for SqliteUnitStore {
    async fn find_by_id(&self, id: i64) -> DbResult<Option<Unit>> {
        self.db.run(move |conn| Unit::get_active_by_id(conn, id)).await
    }

    async fn find_by_type(&self, unit_type: &str) -> DbResult<Vec<Unit>> {
        let unit_type = unit_type.to_string();
        self.db
            .run(move |conn| Unit::list_by_type(conn, &unit_type))
            .await
    }

    async fn find_base_unit(&self, unit_type: &str) -> DbResult<Option<Unit>> {
        let unit_type = unit_type.to_string();
        self.db
            .run(move |conn| Unit::find_base_unit(conn, &unit_type))
            .await
    }
}

#[derive(Clone)]
pub struct SqliteBudgetStore {
    db: Database,
}

impl SqliteBudgetStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BudgetStore for SqliteBudgetStore {
    async fn find_by_id(&self, id: i64) -> DbResult<Option<RecipeBudget>> {
        self.db.run(move |conn| RecipeBudget::get_by_id(conn, id)).await
    }

    async fn create(
        &self,
        data: RecipeBudgetCreate,
        totals: BudgetTotals,
    ) -> DbResult<RecipeBudget> {
        self.db
            .run(move |conn| RecipeBudget::create(conn, &data, &totals))
            .await
    }

    async fn update(
        &self,
        id: i64,
        data: RecipeBudgetUpdate,
        totals: BudgetTotals,
    ) -> DbResult<Option<RecipeBudget>> {
        self.db
            .run(move |conn| RecipeBudget::update(conn, id, &data, &totals))
            .await
    }
}

/// In-memory database with the schema applied, for tests
#[cfg(test)]
pub(crate) fn test_database() -> Database {
    let db = Database::in_memory().unwrap();
    db.with_conn_mut(|conn| crate::db::migrations::run_migrations(conn))
        .unwrap();
    db
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UnitCreate;

    #[tokio::test]
    async fn test_unit_store_skips_inactive_units() {
        let db = test_database();
        let unit = db
            .with_conn(|conn| {
                Unit::create(
                    conn,
                    &UnitCreate {
                        name: "handful".to_string(),
                        abbreviation: "handful".to_string(),
                        unit_type: "count".to_string(),
                        category: None,
                        conversion_factor: Some(5.0),
                        base_unit: false,
                    },
                )
            })
            .unwrap();

        let store = SqliteUnitStore::new(db.clone());
        assert!(store.find_by_id(unit.id).await.unwrap().is_some());

        db.with_conn(|conn| Unit::deactivate(conn, unit.id)).unwrap();
        assert!(store.find_by_id(unit.id).await.unwrap().is_none());
        assert!(store
            .find_by_type("count")
            .await
            .unwrap()
            .iter()
            .all(|u| u.id != unit.id));
    }

    #[tokio::test]
    async fn test_unit_store_base_unit() {
        let store = SqliteUnitStore::new(test_database());
        let base = store.find_base_unit("volume").await.unwrap().unwrap();
        assert_eq!(base.abbreviation, "ml");
    }
}
