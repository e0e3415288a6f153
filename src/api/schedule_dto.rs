use serde::Deserialize;

use crate::error::{Error, Result};

/// One row of the timetable CSV.
///
/// Times are minutes from simulation epoch. The stop list is a single field
/// in either bracketed form (`"['SBC', 'MYA']"`) or plain comma-separated
/// form (`"SBC,MYA"`).
#[derive(Debug, Deserialize)]
pub struct ScheduleRowDto {
    pub train_id: String,
    pub dep_time: f64,
    pub arr_time: f64,
    pub speed_kmh: f64,
    pub stops: String,
    #[serde(default)]
    pub priority: Option<u8>,
    #[serde(default)]
    pub train_type: Option<String>,
    #[serde(default)]
    pub through_destination: Option<String>,
}

/// Parses a stop-list field into ordered station codes.
///
/// Accepted forms are a bracketed list with optionally quoted entries and a
/// plain comma-separated list. Unbalanced brackets, stray quotes and empty
/// entries are rejected; a malformed stop list must fail loading, not produce
/// a partial route.
pub fn parse_stop_list(raw: &str) -> Result<Vec<String>> {
    let malformed = || Error::MalformedStopList(raw.to_string());

    let trimmed = raw.trim();

    let inner = if trimmed.starts_with('[') || trimmed.ends_with(']') {
        trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')).ok_or_else(malformed)?
    } else {
        trimmed
    };

    let mut stops = Vec::new();

    for entry in inner.split(',') {
        let entry = entry.trim();

        let code = if entry.starts_with('\'') || entry.ends_with('\'') {
            entry.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')).ok_or_else(malformed)?
        } else if entry.starts_with('"') || entry.ends_with('"') {
            entry.strip_prefix('"').and_then(|s| s.strip_suffix('"')).ok_or_else(malformed)?
        } else {
            entry
        };

        if code.is_empty() || code.contains(['\'', '"', '[', ']']) {
            return Err(malformed());
        }

        stops.push(code.to_string());
    }

    if stops.is_empty() {
        return Err(malformed());
    }

    Ok(stops)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracketed_quoted_list_parses() {
        let stops = parse_stop_list("['SBC', 'KGI', 'MYS']").unwrap();
        assert_eq!(stops, vec!["SBC", "KGI", "MYS"]);
    }

    #[test]
    fn plain_comma_list_parses() {
        let stops = parse_stop_list("SBC,MYS").unwrap();
        assert_eq!(stops, vec!["SBC", "MYS"]);
    }

    #[test]
    fn unbalanced_bracket_is_rejected() {
        assert!(parse_stop_list("['SBC', 'MYS'").is_err());
        assert!(parse_stop_list("'SBC', 'MYS']").is_err());
    }

    #[test]
    fn empty_entries_are_rejected() {
        assert!(parse_stop_list("SBC,,MYS").is_err());
        assert!(parse_stop_list("").is_err());
        assert!(parse_stop_list("[]").is_err());
    }
}
