//! CLI command implementations.

pub mod reset;
pub mod value;
