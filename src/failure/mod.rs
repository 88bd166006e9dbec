//! Classification of wrapped-tool failures.
//!
//! A failed tool run yields raw error text. Classification runs in two steps:
//!
//! 1. [`code`]: recover the embedded return code (`return_code=<value>`)
//! 2. [`signal`]: map the code to a human-readable cause
//!
//! Classification never fails. Unrecognized text degrades to an absent code
//! and the "no error, or error code unavailable" description.
//!
//! ## Example
//!
//! ```rust
//! use amplicon_qc::failure::{classify, code::ReturnCodePattern};
//!
//! let diagnosis = classify("mothur exited abnormally: return_code=-9", &ReturnCodePattern);
//! assert_eq!(diagnosis.code.value(), Some(-9));
//! assert!(diagnosis.cause.contains("immediately terminate the process"));
//! ```

pub mod code;
pub mod signal;

use code::{ErrorCode, ErrorCodeExtractor};

/// A classified tool failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureDiagnosis {
    pub code: ErrorCode,
    pub cause: &'static str,
    /// The raw error text the diagnosis was derived from
    pub message: String,
}

impl FailureDiagnosis {
    /// One-line summary suitable for the run log and the final report
    #[must_use]
    pub fn summary(&self) -> String {
        match self.code {
            ErrorCode::Code(code) if code < 0 => {
                let signal = code.unsigned_abs();
                match signal::signal_name(signal) {
                    Some(name) => format!(
                        "tool terminated by signal {signal} ({name}): {}",
                        self.cause
                    ),
                    None => format!("tool terminated by signal {signal}: {}", self.cause),
                }
            }
            // Positive codes are exit statuses; any signal reading is conditional
            ErrorCode::Code(code) => match signal::signal_name(code.unsigned_abs()) {
                Some(name) => format!(
                    "tool exited with code {code} (if this was signal {code} ({name}): {})",
                    self.cause
                ),
                None => format!("tool exited with code {code}: {}", self.cause),
            },
            ErrorCode::Absent => format!("tool failed ({}): {}", self.cause, self.message),
        }
    }
}

/// Classify raw failure text using the given extractor
#[must_use]
pub fn classify(message: &str, extractor: &dyn ErrorCodeExtractor) -> FailureDiagnosis {
    let code = extractor.extract(message);
    FailureDiagnosis {
        code,
        cause: signal::describe(code),
        message: message.to_string(),
    }
}
