use std::sync::Arc;
use anyhow::Result;
use serde_json::Value;
use tokio::sync::Mutex;
use typedb_driver::TypeDBDriver;
use crate::execute_typedb_query;

/// Thin adapter around a TypeDB connection. The query's transaction type
/// (read/write/schema) is inferred from its TypeQL stages, so callers just
/// hand over a query string; `operation_mutex` serializes access to the one
/// driver connection.
pub struct TypeDBAdapter {
    driver: Arc<TypeDBDriver>,
    database: String,
    operation_mutex: Arc<Mutex<()>>,
}

impl TypeDBAdapter {
    pub fn new(driver: Arc<TypeDBDriver>, database: String, operation_mutex: Arc<Mutex<()>>) -> Self {
        Self { driver, database, operation_mutex }
    }

    /// Execute a write query (insert, delete, update operations)
    pub async fn write(&self, data: Value) -> Result<Value> {
        self.execute(data).await
    }

    /// Execute a read query (match operations)
    pub async fn read(&self, data: Value) -> Result<Value> {
        self.execute(data).await
    }

    /// Execute a schema query (define/undefine/redefine operations)
    pub async fn schema(&self, data: Value) -> Result<Value> {
        self.execute(data).await
    }

    async fn execute(&self, data: Value) -> Result<Value> {
        let _lock = self.operation_mutex.lock().await;

        let query = data.get("query")
            .and_then(|q| q.as_str())
            .ok_or_else(|| anyhow::anyhow!("Missing 'query' field"))?;

        execute_typedb_query(&self.driver, &self.database, query).await
    }
}
