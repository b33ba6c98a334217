//! Shared utilities for running scheduler tools and reading their output.
//!
//! Used by submit-slurm to keep the per-tool modules free of process
//! plumbing.

pub mod command;
pub mod time;

pub use command::{CommandError, run_command, run_command_with_input};
pub use time::{format_duration, format_duration_slurm, parse_duration};

/// Filter helper for optional string fields.
/// Returns None if the string is empty or a placeholder value.
pub fn non_empty_string(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty()
        || trimmed == "-"
        || trimmed == "N/A"
        || trimmed == "Unknown"
        || trimmed == "(null)"
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// First non-blank line of command output, trimmed.
pub fn first_line(output: &str) -> Option<&str> {
    output.lines().map(str::trim).find(|l| !l.is_empty())
}

/// Trim every line and drop blank ones.
pub fn trim_lines(s: &str) -> String {
    s.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_string() {
        assert_eq!(non_empty_string("hello"), Some("hello".to_string()));
        assert_eq!(non_empty_string("  hello  "), Some("hello".to_string()));
        assert_eq!(non_empty_string(""), None);
        assert_eq!(non_empty_string("-"), None);
        assert_eq!(non_empty_string("N/A"), None);
        assert_eq!(non_empty_string("(null)"), None);
    }

    #[test]
    fn test_first_line() {
        assert_eq!(first_line("\n  berzelius \nalvis\n"), Some("berzelius"));
        assert_eq!(first_line("   \n"), None);
    }

    #[test]
    fn test_trim_lines() {
        assert_eq!(trim_lines("\n    a\n\n      b  \n"), "a\nb");
    }
}
