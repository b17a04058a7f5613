//! CLI command implementations.

pub mod generate;
pub mod run;
pub mod strategies;
pub mod version;
