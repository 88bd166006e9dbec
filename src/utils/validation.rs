//! Structural validation of batch manifests.
//!
//! Each manifest line must:
//!
//! 1. contain a token with "R1" and a token with "R2"
//! 2. contain a token with "I1" or "I2"
//! 3. contain no token with a hyphen
//!
//! and, when an input directory is configured, every token must name an
//! existing file in it. Rules are checked independently and the whole
//! manifest is scanned; nothing stops at the first bad line.

use std::path::Path;

use tracing::debug;

use crate::core::types::{ValidationOutcome, Violation, ViolationKind};
use crate::parsing::manifest::{read_manifest, ManifestError, ManifestLine};

/// Validate a manifest file.
///
/// # Errors
///
/// Returns `ManifestError::Unreadable` if the file cannot be read. Structural
/// problems are never errors; they are reported in the returned outcome.
pub fn validate_manifest(
    path: &Path,
    input_dir: Option<&Path>,
) -> Result<ValidationOutcome, ManifestError> {
    let lines = read_manifest(path)?;
    Ok(validate_lines(&lines, input_dir))
}

/// Validate already-parsed manifest lines
#[must_use]
pub fn validate_lines(lines: &[ManifestLine], input_dir: Option<&Path>) -> ValidationOutcome {
    let mut violations = Vec::new();
    for line in lines {
        let found = check_line(line, input_dir);
        if !found.is_empty() {
            debug!("Manifest line {} failed {} rule(s)", line.number, found.len());
        }
        violations.extend(found);
    }
    ValidationOutcome::from_violations(violations, lines.len())
}

/// Check one line against every rule, returning all violations found
#[must_use]
pub fn check_line(line: &ManifestLine, input_dir: Option<&Path>) -> Vec<Violation> {
    let mut found = Vec::new();
    let mut flag = |kind, detail: String| {
        found.push(Violation {
            line: line.number,
            kind,
            detail,
        });
    };

    let has_r1 = line.any_token_contains("R1");
    let has_r2 = line.any_token_contains("R2");
    if !(has_r1 && has_r2) {
        let missing = match (has_r1, has_r2) {
            (false, false) => "R1 and R2",
            (false, true) => "R1",
            _ => "R2",
        };
        flag(
            ViolationKind::MissingReadPair,
            format!("no file for {missing}"),
        );
    }

    if !(line.any_token_contains("I1") || line.any_token_contains("I2")) {
        flag(
            ViolationKind::MissingIndex,
            "no index file (I1 or I2)".to_string(),
        );
    }

    let hyphenated: Vec<&str> = line
        .tokens
        .iter()
        .filter(|t| t.contains('-'))
        .map(String::as_str)
        .collect();
    if !hyphenated.is_empty() {
        flag(
            ViolationKind::Hyphen,
            format!("hyphens are not allowed: {}", hyphenated.join(", ")),
        );
    }

    if let Some(dir) = input_dir {
        let missing: Vec<&str> = line
            .tokens
            .iter()
            .filter(|t| !dir.join(t.as_str()).is_file())
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            flag(
                ViolationKind::MissingFile,
                format!("not found in {}: {}", dir.display(), missing.join(", ")),
            );
        }
    }

    found
}
