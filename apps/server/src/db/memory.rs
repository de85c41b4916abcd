//! In-process `TestStore` implementation.
//!
//! Keeps records in a `BTreeMap` behind a mutex. Used by the integration tests
//! and for running the API locally without PostgreSQL. Ordering and matching
//! follow the PostgreSQL store: `test_date DESC, id DESC`, case-insensitive
//! substring search on patient name or test type.

use super::TestStore;
use crate::{
    models::{DiagnosticTest, DiagnosticTestPatch, NewDiagnosticTest, TestQuery},
    Error, Result,
};
use async_trait::async_trait;
use std::{
    cmp::Reverse,
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    tests: BTreeMap<i64, DiagnosticTest>,
}

/// In-memory store with monotonically assigned ids. Ids are never reused.
#[derive(Debug, Default)]
pub struct InMemoryTestStore {
    inner: Mutex<Inner>,
}

impl InMemoryTestStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| Error::Internal("in-memory store lock poisoned".to_string()))
    }
}

fn matches_search(test: &DiagnosticTest, needle: &str) -> bool {
    test.patient_name.to_lowercase().contains(needle)
        || test.test_type.to_lowercase().contains(needle)
}

#[async_trait]
impl TestStore for InMemoryTestStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, test: NewDiagnosticTest) -> Result<DiagnosticTest> {
        let mut inner = self.lock()?;
        inner.next_id += 1;
        let record = test.into_record(inner.next_id);
        inner.tests.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: i64) -> Result<Option<DiagnosticTest>> {
        Ok(self.lock()?.tests.get(&id).cloned())
    }

    async fn update(
        &self,
        id: i64,
        patch: &DiagnosticTestPatch,
    ) -> Result<Option<DiagnosticTest>> {
        let mut inner = self.lock()?;
        Ok(inner.tests.get_mut(&id).map(|record| {
            patch.apply_to(record);
            record.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.lock()?.tests.remove(&id).is_some())
    }

    async fn search(&self, query: &TestQuery) -> Result<(Vec<DiagnosticTest>, u64)> {
        let needle = query.search.as_deref().map(str::to_lowercase);

        let mut matching: Vec<DiagnosticTest> = {
            let inner = self.lock()?;
            inner
                .tests
                .values()
                .filter(|t| needle.as_deref().map_or(true, |n| matches_search(t, n)))
                .cloned()
                .collect()
        };
        matching.sort_by_key(|t| Reverse((t.test_date, t.id)));

        let total = matching.len() as u64;
        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let page = matching
            .into_iter()
            .skip(offset)
            .take(query.limit as usize)
            .collect();

        Ok((page, total))
    }

    async fn health_check(&self) -> Result<()> {
        self.lock().map(|_| ())
    }
}
