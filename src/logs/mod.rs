//! Post-processing of the wrapped tool's log.

pub mod dedup;
