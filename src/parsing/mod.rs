//! Parsers for pipeline input files.
//!
//! - **Batch manifests**: one sample per line, whitespace-delimited filenames
//!
//! ## Example
//!
//! ```rust
//! use amplicon_qc::parsing::manifest::parse_manifest_text;
//!
//! let lines = parse_manifest_text("s1_R1.fastq s1_R2.fastq s1_I1.fastq\n");
//! assert_eq!(lines[0].tokens.len(), 3);
//! ```

pub mod manifest;
