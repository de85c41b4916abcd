//! Record store trait definition

use crate::{
    models::{DiagnosticTest, DiagnosticTestPatch, NewDiagnosticTest, TestQuery},
    Result,
};
use async_trait::async_trait;

/// Abstract interface over the `diagnostic_tests` table.
///
/// Implementations own id assignment and must keep ids unique for the life of
/// the store. Writes are last-write-wins; there is no version check.
#[async_trait]
pub trait TestStore: Send + Sync {
    /// Short backend name for logs and health output.
    fn backend_name(&self) -> &'static str;

    /// Insert a validated record and return it with its assigned id.
    async fn insert(&self, test: NewDiagnosticTest) -> Result<DiagnosticTest>;

    /// Fetch a record by id.
    async fn get(&self, id: i64) -> Result<Option<DiagnosticTest>>;

    /// Apply a partial update. Returns `None` if the record does not exist.
    async fn update(&self, id: i64, patch: &DiagnosticTestPatch)
        -> Result<Option<DiagnosticTest>>;

    /// Remove a record. Returns whether a record was removed.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// One page of matches ordered by `test_date` then `id`, both descending,
    /// together with the total number of matches.
    async fn search(&self, query: &TestQuery) -> Result<(Vec<DiagnosticTest>, u64)>;

    /// Cheap liveness probe.
    async fn health_check(&self) -> Result<()>;
}
