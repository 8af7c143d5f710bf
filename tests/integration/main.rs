//! Cross-layer integration tests for normstore
//!
//! Tests that verify correct interaction between multiple crates.
