//! Search and pagination models

use serde::Serialize;

use super::DiagnosticTest;

/// Normalized list/search request handed to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestQuery {
    /// Case-insensitive substring matched against patient name or test type.
    pub search: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl TestQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    pub fn total_pages(&self, total_records: u64) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        total_records.div_ceil(u64::from(self.limit))
    }
}

/// One page of matching records, newest `testDate` first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestPage {
    pub tests: Vec<DiagnosticTest>,
    pub total_records: u64,
    pub total_pages: u64,
    pub current_page: u32,
    pub limit: u32,
}
