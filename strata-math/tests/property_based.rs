//! Property-based testing entry point for strata-math
//!
//! Run with: cargo test --test property_based

mod property_tests;
