//! Human-readable causes for POSIX-style signal numbers.

use crate::failure::code::ErrorCode;

pub const NO_ERROR: &str = "no error, or error code unavailable";
pub const UNKNOWN_CODE: &str = "unknown error code outside the recognized range";

/// Signal number, name, and cause for signals 1 through 15
pub static SIGNAL_TABLE: [(u32, &str, &str); 15] = [
    (1, "SIGHUP", "hangup: the controlling terminal closed or its process died"),
    (2, "SIGINT", "interrupt from the keyboard (Ctrl-C)"),
    (3, "SIGQUIT", "quit from the keyboard, with a core dump"),
    (4, "SIGILL", "illegal instruction, often a binary built for another CPU"),
    (5, "SIGTRAP", "trace or breakpoint trap"),
    (6, "SIGABRT", "abort: the process aborted itself, usually a failed assertion"),
    (7, "SIGBUS", "bus error: bad memory access"),
    (8, "SIGFPE", "floating point exception, such as division by zero"),
    (
        9,
        "SIGKILL",
        "kill signal sent to immediately terminate the process, often by the out-of-memory killer",
    ),
    (10, "SIGUSR1", "user-defined signal 1"),
    (11, "SIGSEGV", "segmentation fault: invalid memory reference"),
    (12, "SIGUSR2", "user-defined signal 2"),
    (13, "SIGPIPE", "broken pipe: wrote to a pipe with no readers"),
    (14, "SIGALRM", "timer signal from alarm"),
    (15, "SIGTERM", "termination signal, a request to immediately terminate the process"),
];

/// Name of a signal in the table, e.g. `SIGSEGV` for 11
#[must_use]
pub fn signal_name(signal: u32) -> Option<&'static str> {
    SIGNAL_TABLE
        .iter()
        .find(|(num, _, _)| *num == signal)
        .map(|(_, name, _)| *name)
}

/// Describe a return code.
///
/// Absent and zero mean there is nothing to explain. Any other value is looked
/// up by its absolute value, so `-11` and `11` both describe `SIGSEGV`.
#[must_use]
pub fn describe(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::Absent | ErrorCode::Code(0) => NO_ERROR,
        ErrorCode::Code(code) => {
            let signal = code.unsigned_abs();
            SIGNAL_TABLE
                .iter()
                .find(|(num, _, _)| *num == signal)
                .map_or(UNKNOWN_CODE, |(_, _, cause)| *cause)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segfault() {
        let desc = describe(ErrorCode::Code(-11));
        assert!(desc.starts_with("segmentation fault"));
        assert_eq!(desc, describe(ErrorCode::Code(11)));
    }

    #[test]
    fn test_kill() {
        assert!(describe(ErrorCode::Code(-9)).contains("immediately terminate the process"));
    }

    #[test]
    fn test_no_error() {
        assert_eq!(describe(ErrorCode::Code(0)), NO_ERROR);
        assert_eq!(describe(ErrorCode::Absent), NO_ERROR);
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(describe(ErrorCode::Code(-99)), UNKNOWN_CODE);
        assert_eq!(describe(ErrorCode::Code(16)), UNKNOWN_CODE);
        assert_eq!(describe(ErrorCode::Code(i32::MIN)), UNKNOWN_CODE);
    }

    #[test]
    fn test_table_covers_one_through_fifteen() {
        for signal in 1..=15u32 {
            let code = i32::try_from(signal).unwrap();
            assert_ne!(describe(ErrorCode::Code(-code)), UNKNOWN_CODE);
            assert!(signal_name(signal).is_some());
        }
        assert_eq!(signal_name(11), Some("SIGSEGV"));
        assert_eq!(signal_name(0), None);
    }
}
