//! Core data types: pipeline configuration and run outcomes.
//!
//! - [`PipelineConfig`](config::PipelineConfig): TOML configuration
//! - [`ValidationOutcome`](types::ValidationOutcome), [`Violation`](types::Violation): manifest check results
//! - [`RunOutcome`](types::RunOutcome), [`RunStatus`](types::RunStatus), [`Stage`](types::Stage): final run report

pub mod config;
pub mod types;
