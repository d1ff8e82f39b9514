/*!
A case-insensitive header map, plus the validation helpers used throughout the SSDP, SOAP, and
GENA codecs to turn a missing or malformed header into a descriptive `MessageFormatError`.
*/

use crate::error::{invalid_header_value, missing_required_header, MessageFormatError};
use regex::Regex;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::error;

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

/// Preserves insertion order for display/encoding while comparing and looking up names
/// case-insensitively, per §4.2: "case-insensitive on field names, preserves original casing on
/// field values except for trimming surrounding whitespace".
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<S1, S2>(&mut self, name: S1, value: S2) -> &mut Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        let name = name.into();
        let value = value.into().trim().to_string();
        match self.index_of(&name) {
            Some(i) => self.entries[i].1 = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.index_of(name).map(|i| self.entries[i].1.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.index_of(name).map(|i| self.entries.remove(i).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, String)> {
        self.entries.iter()
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    /// Parses `line` (without the trailing CRLF) as a single `Name: value` header.
    pub fn parse_line(&mut self, line: &str) -> Result<(), MessageFormatError> {
        match line.split_once(':') {
            Some((name, value)) => {
                self.set(name.trim(), value.trim());
                Ok(())
            }
            None => Err(invalid_header_value("<header line>", line)),
        }
    }

    pub fn as_map(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|(n, v)| (n.to_ascii_uppercase(), v.clone()))
            .collect()
    }
}

// ------------------------------------------------------------------------------------------------

pub fn check_required(headers: &Headers, required: &[&str]) -> Result<(), MessageFormatError> {
    let missing: Vec<&str> = required
        .iter()
        .cloned()
        .filter(|h| !headers.contains(h))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        error!("message missing required headers '{:?}'", missing);
        Err(missing_required_header(missing.join(", ")))
    }
}

pub fn check_parsed_value<T>(header_value: &str, name: &str) -> Result<T, MessageFormatError>
where
    T: FromStr,
{
    header_value.parse::<T>().map_err(|_| {
        error!("header '{}' value '{}' could not be parsed", name, header_value);
        invalid_header_value(name, header_value)
    })
}

pub fn check_regex(
    header_value: &str,
    name: &str,
    regex: &Regex,
) -> Result<String, MessageFormatError> {
    match regex.captures(header_value) {
        Some(captured) => Ok(captured.get(1).unwrap().as_str().to_string()),
        None => {
            error!("header '{}' value '{}' did not match regex", name, header_value);
            Err(invalid_header_value(name, header_value))
        }
    }
}

pub fn check_empty(header_value: &str, name: &str) -> Result<(), MessageFormatError> {
    if header_value.trim().is_empty() {
        Ok(())
    } else {
        Err(invalid_header_value(name, header_value))
    }
}

pub fn check_not_empty(header_value: Option<&str>, default: &str) -> String {
    match header_value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

// ------------------------------------------------------------------------------------------------
// Private Types
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lookup_is_case_insensitive() {
        let mut headers = Headers::new();
        headers.set("Content-Type", "text/xml");
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/xml"));
    }

    #[test]
    fn set_trims_value_whitespace_only() {
        let mut headers = Headers::new();
        headers.set("X-Test", "  Some Value  ");
        assert_eq!(headers.get("x-test"), Some("Some Value"));
    }

    #[test]
    fn required_check_reports_all_missing() {
        let headers = Headers::new();
        assert!(check_required(&headers, &["HOST", "NT"]).is_err());
    }
}
