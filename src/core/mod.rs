//! Core types shared across chartform.
//!
//! Currently this is the error system: [`ChartformError`] for typed
//! failures of a synthesis run and [`ErrorContext`] /
//! [`user_friendly_error`] for presenting them on the command line.

pub mod error;

pub use error::{ChartformError, ErrorContext, ValidationIssue, user_friendly_error};
