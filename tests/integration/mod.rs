//! Integration test suite for chartform
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **synth**: library-level synthesis of charts into a stack
//! - **chart_files**: YAML chart files through the library
//! - **cli**: the `chartform` binary

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;
#[path = "../fixtures/mod.rs"]
mod fixtures;

mod chart_files;
mod synth;
