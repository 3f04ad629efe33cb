//! Human-readable byte sizes.
//!
//! Units are binary: `KB` and `KiB` both mean 1024 bytes.

use super::ConfigError;

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;
const GB: u64 = 1024 * MB;

fn unit_multiplier(unit: &str) -> Option<u64> {
    match unit.to_ascii_lowercase().as_str() {
        "" | "b" | "bytes" => Some(1),
        "k" | "kb" | "kib" => Some(KB),
        "m" | "mb" | "mib" => Some(MB),
        "g" | "gb" | "gib" => Some(GB),
        _ => None,
    }
}

/// Parse a size such as `1048576`, `512KB`, `100 MB`, `1.5GiB`.
pub fn parse_size(input: &str) -> Result<u64, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidSize {
        value: input.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = input.trim();
    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);

    if number.is_empty() {
        return Err(invalid("missing number"));
    }
    let multiplier = unit_multiplier(unit.trim()).ok_or_else(|| invalid("unknown unit"))?;

    if let Ok(whole) = number.parse::<u64>() {
        return whole
            .checked_mul(multiplier)
            .ok_or_else(|| invalid("size too large"));
    }

    let value: f64 = number.parse().map_err(|_| invalid("not a number"))?;
    let bytes = (value * multiplier as f64).round();
    if !bytes.is_finite() || bytes > u64::MAX as f64 {
        return Err(invalid("size too large"));
    }
    Ok(bytes as u64)
}

/// Format a size for display, e.g. `100.00 MB`.
pub fn format_size(bytes: u64) -> String {
    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Exact form for writing back to a config file, e.g. `100MB` or `1536KB`.
pub(crate) fn format_size_exact(bytes: u64) -> String {
    match bytes {
        0 => "0".to_string(),
        b if b % GB == 0 => format!("{}GB", b / GB),
        b if b % MB == 0 => format!("{}MB", b / MB),
        b if b % KB == 0 => format!("{}KB", b / KB),
        b => b.to_string(),
    }
}
