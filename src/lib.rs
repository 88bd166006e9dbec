//! # amplicon-qc
//!
//! Quality-control orchestration for amplicon sequencing batches run through
//! [mothur](https://mothur.org).
//!
//! A run checks that mothur is installed, validates the batch manifest, runs
//! the configured mothur commands, classifies any failure by the signal or
//! exit code that ended mothur, and writes a deduplicated copy of mothur's
//! log next to the original.
//!
//! ## Features
//!
//! - **Manifest validation**: every rule is checked on every line, so one pass reports all problems
//! - **Failure classification**: `return_code=-11` becomes "segmentation fault: invalid memory reference"
//! - **Bounded execution**: optional timeout with the child killed on expiry
//! - **Log deduplication**: repeated log records collapsed without touching the raw log
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use amplicon_qc::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::load(Path::new("qc.toml")).unwrap();
//! let outcome = Pipeline::new(&config).run();
//! if !outcome.is_success() {
//!     eprintln!("{}", outcome.diagnostic.as_deref().unwrap_or_default());
//! }
//! std::process::exit(i32::from(outcome.exit_code()));
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Configuration and outcome types
//! - [`parsing`]: Batch manifest reader
//! - [`utils`]: Manifest validation rules
//! - [`failure`]: Return-code extraction and signal descriptions
//! - [`logs`]: Log deduplication
//! - [`tool`]: Tool discovery and invocation
//! - [`pipeline`]: The run state machine
//! - [`logging`]: Log sink setup
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod failure;
pub mod logging;
pub mod logs;
pub mod parsing;
pub mod pipeline;
pub mod tool;
pub mod utils;

// Re-export commonly used types for convenience
pub use core::config::PipelineConfig;
pub use core::types::*;
pub use failure::code::ErrorCode;
pub use logs::dedup::{DedupRule, LogDeduplicator};
pub use pipeline::{Pipeline, PipelineError};
