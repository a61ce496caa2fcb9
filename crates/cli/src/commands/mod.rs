//! CLI Commands

pub mod scan;
pub mod sync;
