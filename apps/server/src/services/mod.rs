//! Business logic layer
//!
//! Services orchestrate operations by coordinating the record store and
//! applying validation and paging rules.


pub use diagnostic_tests::{DiagnosticTestService, ListParams, PagingPolicy};
