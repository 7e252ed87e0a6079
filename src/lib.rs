pub mod types;
pub mod config;
pub mod validation;
pub mod schedule;
pub mod api;
pub mod metrics;
pub mod error_handling;
pub mod render;
pub mod build;
pub mod dashboard;
pub mod terminal;
