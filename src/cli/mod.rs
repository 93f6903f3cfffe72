//! Command-line interface for SustainLens.

mod commands;
pub mod icons;

pub use commands::run;
