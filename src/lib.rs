//! SustainLens - SDG classification dashboard.
//!
//! Collects a URL or a file from the user, forwards it to an external
//! classification service and renders the returned text excerpt, keywords
//! and SDG distribution.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod models;
pub mod render;
