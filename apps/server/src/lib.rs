//! labtrack - hospital lab-result tracking API
//!
//! A JSON API over a single `diagnostic_tests` table: paginated search,
//! read, create, partial update and delete, with field validation and a
//! canonical timestamp form for test dates.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod state;
pub mod validation;

pub use error::{Error, Result};
