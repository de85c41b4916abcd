//! Domain models

pub mod search;
pub mod timestamp;

pub use diagnostic_test::{DiagnosticTest, DiagnosticTestPatch, NewDiagnosticTest};
pub use search::{TestPage, TestQuery};
