//! Recovery of a process return code from free-text tool errors.
//!
//! The wrapped tool reports failures as text with an embedded
//! `return_code=<value>` token, where `<value>` is an integer (negative for a
//! terminating signal) or `None`. Extraction sits behind [`ErrorCodeExtractor`]
//! so the rest of the pipeline depends only on the typed [`ErrorCode`].

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static RETURN_CODE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"return_code=(None|[+-]?\d+)").expect("return code regex is valid")
});

/// A return code recovered from an error message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// No code embedded, the sentinel `None`, or a value that doesn't fit
    Absent,
    Code(i32),
}

impl ErrorCode {
    #[must_use]
    pub fn value(self) -> Option<i32> {
        match self {
            Self::Absent => None,
            Self::Code(code) => Some(code),
        }
    }
}

impl From<Option<i32>> for ErrorCode {
    fn from(value: Option<i32>) -> Self {
        value.map_or(Self::Absent, Self::Code)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Absent => write!(f, "None"),
            Self::Code(code) => write!(f, "{code}"),
        }
    }
}

/// Turns a raw error message into an [`ErrorCode`]. Must never fail.
pub trait ErrorCodeExtractor {
    fn extract(&self, message: &str) -> ErrorCode;
}

/// Extracts the first `return_code=<value>` token in a message.
///
/// A missing token is treated as [`ErrorCode::Absent`], the same as the
/// explicit `None` sentinel.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReturnCodePattern;

impl ErrorCodeExtractor for ReturnCodePattern {
    fn extract(&self, message: &str) -> ErrorCode {
        extract_return_code(message)
    }
}

/// Extract the embedded return code from an error message.
///
/// # Examples
///
/// ```
/// use amplicon_qc::failure::code::{extract_return_code, ErrorCode};
///
/// assert_eq!(extract_return_code("died: return_code=-11 extra"), ErrorCode::Code(-11));
/// assert_eq!(extract_return_code("return_code=None"), ErrorCode::Absent);
/// assert_eq!(extract_return_code("no code here"), ErrorCode::Absent);
/// ```
#[must_use]
pub fn extract_return_code(message: &str) -> ErrorCode {
    let Some(caps) = RETURN_CODE_REGEX.captures(message) else {
        return ErrorCode::Absent;
    };
    match &caps[1] {
        "None" => ErrorCode::Absent,
        value => value.parse::<i32>().ok().into(),
    }
}
