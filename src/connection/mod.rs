use async_trait::async_trait;

use crate::core::Result;
use crate::result::QueryResult;

/// The live database seam the executor and snapshot store are written
/// against. Concrete drivers implement this outside the engine; timeouts and
/// retries are theirs, not ours.
#[async_trait]
pub trait SqlConnection: Send + Sync {
    /// Runs a statement, returning the affected-row count where the backend
    /// reports one.
    async fn execute(&self, sql: &str) -> Result<u64>;

    /// Runs a query and materializes the full result set.
    async fn query(&self, sql: &str) -> Result<QueryResult>;
}
