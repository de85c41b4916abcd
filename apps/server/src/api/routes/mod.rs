//! Route tables


pub use diagnostic_tests::test_routes;
