//! Field validators for [`Validate`](crate::manager::Validate)
//! implementations.
//!
//! Each validator names the field in its error so messages can be surfaced
//! to operators as-is.

use regex_lite::Regex;
use std::net::IpAddr;
use std::sync::OnceLock;
use url::Url;

/// Reject empty strings.
pub fn require_non_empty(value: &str, field: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    Ok(())
}

/// Accept a syntactically valid hostname or IP address.
pub fn validate_host(host: &str, field: &str, allow_empty: bool) -> Result<(), String> {
    if host.is_empty() {
        if allow_empty {
            return Ok(());
        }
        return Err(format!("{field} must not be empty"));
    }

    if host.parse::<IpAddr>().is_ok() {
        return Ok(());
    }

    // Four all-numeric labels is a malformed IPv4 address, not a hostname.
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() == 4 && labels.iter().all(|l| l.parse::<u32>().is_ok()) {
        return Err(format!("{field} {host:?} is not a valid address"));
    }

    if host.len() > 255 {
        return Err(format!("{field} {host:?} is not a valid hostname"));
    }
    for label in &labels {
        if label.is_empty() || label.len() > 63 {
            return Err(format!("{field} {host:?} is not a valid hostname"));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(format!("{field} {host:?} is not a valid hostname"));
        }
        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
            return Err(format!("{field} {host:?} is not a valid hostname"));
        }
    }
    Ok(())
}

/// Accept a TCP/UDP port in 1..=65535, optionally allowing 0.
pub fn validate_port(port: i64, field: &str, allow_zero: bool) -> Result<(), String> {
    if allow_zero && port == 0 {
        return Ok(());
    }
    if port <= 0 || port > 65535 {
        return Err(format!(
            "{field} {port} is out of range, must be within 1-65535"
        ));
    }
    Ok(())
}

/// Accept a value from a fixed list.
pub fn validate_one_of(
    value: &str,
    field: &str,
    allowed: &[&str],
    case_sensitive: bool,
) -> Result<(), String> {
    let matches = allowed.iter().any(|candidate| {
        if case_sensitive {
            *candidate == value
        } else {
            candidate.eq_ignore_ascii_case(value)
        }
    });
    if matches {
        Ok(())
    } else {
        Err(format!(
            "{field} {value:?} is not allowed, must be one of {allowed:?}"
        ))
    }
}

/// Bound the length of a string; `max` of `None` means unbounded.
pub fn validate_length(
    value: &str,
    field: &str,
    min: usize,
    max: Option<usize>,
    allow_empty: bool,
) -> Result<(), String> {
    let length = value.chars().count();
    if length == 0 {
        if allow_empty {
            return Ok(());
        }
        return Err(format!("{field} must not be empty"));
    }
    if length < min || max.is_some_and(|max| length > max) {
        return Err(format!(
            "{field} {value:?} has invalid length, expected {min}-{} characters",
            max.map_or_else(|| "unbounded".to_string(), |m| m.to_string())
        ));
    }
    Ok(())
}

/// Accept letters and digits only.
pub fn validate_alphanumeric(value: &str, field: &str, allow_empty: bool) -> Result<(), String> {
    if value.is_empty() {
        if allow_empty {
            return Ok(());
        }
        return Err(format!("{field} must not be empty"));
    }
    if value.chars().all(char::is_alphanumeric) {
        Ok(())
    } else {
        Err(format!(
            "{field} {value:?} must contain only letters and digits"
        ))
    }
}

/// Accept an absolute URL.
pub fn validate_url(value: &str, field: &str, allow_empty: bool) -> Result<(), String> {
    if value.is_empty() {
        if allow_empty {
            return Ok(());
        }
        return Err(format!("{field} must not be empty"));
    }
    Url::parse(value)
        .map(|_| ())
        .map_err(|err| format!("{field} {value:?} is not a valid URL: {err}"))
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,4}$").expect("static email pattern")
    })
}

/// Accept a plain email address.
pub fn validate_email(value: &str, field: &str, allow_empty: bool) -> Result<(), String> {
    if value.is_empty() {
        if allow_empty {
            return Ok(());
        }
        return Err(format!("{field} must not be empty"));
    }
    if email_pattern().is_match(value) {
        Ok(())
    } else {
        Err(format!("{field} {value:?} is not a valid email address"))
    }
}

/// Accept strictly positive integers.
pub fn require_positive(value: i64, field: &str) -> Result<(), String> {
    if value <= 0 {
        return Err(format!("{field} {value} must be a positive number"));
    }
    Ok(())
}
