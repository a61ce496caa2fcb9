//! tcsync Common Library
//!
//! Shared data model and error types for the test-manifest reconciler.

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
