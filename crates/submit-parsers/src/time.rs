//! SLURM duration parsing and formatting.

use std::time::Duration;

/// Parse a SLURM duration.
///
/// Supports:
/// - D-HH:MM:SS, D-HH:MM, D-HH
/// - HH:MM:SS
/// - MM:SS
/// - Minutes as integer
///
/// Returns None for "UNLIMITED", empty strings, anything malformed, or a
/// value too large to count in seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() || s == "UNLIMITED" || s == "-" {
        return None;
    }

    let (days, time_part) = match s.split_once('-') {
        Some((d, rest)) => (Some(d.parse::<u64>().ok()?), rest),
        None => (None, s),
    };

    let time_parts = time_part
        .split(':')
        .map(|p| p.parse::<u64>().ok())
        .collect::<Option<Vec<u64>>>()?;

    let hms = |h: u64, m: u64, sec: u64| {
        h.checked_mul(3600)?
            .checked_add(m.checked_mul(60)?)?
            .checked_add(sec)
    };
    let seconds = match (days, time_parts.as_slice()) {
        // With a day prefix the fields are hours, minutes, seconds.
        (Some(_), [h]) => hms(*h, 0, 0)?,
        (Some(_), [h, m]) => hms(*h, *m, 0)?,
        (Some(_), [h, m, sec]) | (None, [h, m, sec]) => hms(*h, *m, *sec)?,
        (None, [m, sec]) => hms(0, *m, *sec)?,
        (None, [m]) => hms(0, *m, 0)?,
        _ => return None,
    };

    let total = days.unwrap_or(0).checked_mul(86400)?.checked_add(seconds)?;
    Some(Duration::from_secs(total))
}

/// Format seconds as human-readable duration (e.g., "1d 02:30:00", "01:30:00", "05:30").
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours >= 24 {
        let days = hours / 24;
        let hours = hours % 24;
        format!("{}d {:02}:{:02}:{:02}", days, hours, mins, secs)
    } else if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}

/// Format seconds as SLURM duration format (D-HH:MM:SS).
pub fn format_duration_slurm(seconds: u64) -> String {
    let days = seconds / 86400;
    let hours = (seconds % 86400) / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{}-{:02}:{:02}:{:02}", days, hours, mins, secs)
}
