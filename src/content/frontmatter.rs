//! Front-matter parsing

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime};
use indexmap::IndexMap;
use serde::Serialize;

use crate::render::ContentError;

/// Metadata extracted from a document's front-matter, in source key order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Metadata {
    values: IndexMap<String, serde_yaml::Value>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, key: &str) -> Option<&serde_yaml::Value> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: serde_yaml::Value) {
        self.values.insert(key.into(), value);
    }

    /// String value of `key`; other value types yield `None`
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_str())
    }

    /// The `title` key, when it holds a string
    pub fn title(&self) -> Option<&str> {
        self.get_str("title")
    }

    /// The `date` key parsed as a local timestamp
    pub fn date(&self) -> Option<DateTime<Local>> {
        self.get_str("date").and_then(parse_date_string)
    }

    /// The `modified` key as an RFC 3339 timestamp.
    ///
    /// A missing or non-string value is `None`; a string that does not parse
    /// is an error.
    pub fn modified(&self) -> Result<Option<DateTime<FixedOffset>>, ContentError> {
        let Some(value) = self.get_str("modified") else {
            return Ok(None);
        };
        DateTime::parse_from_rfc3339(value.trim())
            .map(Some)
            .map_err(|source| ContentError::Timestamp {
                key: "modified",
                value: value.to_string(),
                source,
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_yaml::Value)> {
        self.values.iter()
    }

    /// Build metadata from a parsed YAML value. `null` means no metadata;
    /// anything but a mapping with string keys is rejected.
    fn from_yaml(value: serde_yaml::Value) -> Result<Self, ContentError> {
        match value {
            serde_yaml::Value::Null => Ok(Self::default()),
            serde_yaml::Value::Mapping(mapping) => {
                let mut values = IndexMap::new();
                for (key, value) in mapping {
                    let serde_yaml::Value::String(key) = key else {
                        return Err(ContentError::MetadataShape);
                    };
                    values.insert(key, value);
                }
                Ok(Self { values })
            }
            _ => Err(ContentError::MetadataShape),
        }
    }
}

/// Splits front-matter from a document body
pub struct FrontMatter;

impl FrontMatter {
    /// Parse front-matter from content string
    /// Returns (metadata, remaining_content)
    pub fn parse(content: &str) -> Result<(Metadata, &str), ContentError> {
        let content = content.trim_start_matches('\u{feff}');
        let trimmed = content.trim_start();

        // YAML front-matter (---)
        if trimmed.starts_with("---") {
            return Self::parse_yaml(trimmed);
        }

        // JSON front-matter (;;;)
        if trimmed.starts_with(";;;") {
            return Self::parse_json(trimmed);
        }

        Ok((Metadata::default(), content))
    }

    fn parse_yaml(content: &str) -> Result<(Metadata, &str), ContentError> {
        let rest = &content[3..]; // Skip opening ---
        let rest = rest.trim_start_matches(['\n', '\r']);

        // Closing fence right after the opening one: empty front-matter
        if let Some(after) = rest.strip_prefix("---") {
            if after.is_empty() || after.starts_with(['\n', '\r']) {
                return Ok((Metadata::default(), after.trim_start_matches(['\n', '\r'])));
            }
        }

        let Some(end_pos) = rest.find("\n---") else {
            // No closing ---, treat as no front-matter
            return Ok((Metadata::default(), content));
        };

        let yaml_content = &rest[..end_pos];
        let remaining = &rest[end_pos + 4..]; // Skip \n---
        let remaining = remaining.trim_start_matches(['\n', '\r']);

        if yaml_content.trim().is_empty() {
            return Ok((Metadata::default(), remaining));
        }

        // A leading --- may just be a thematic break. Only blocks with at
        // least one `key: value` line are front-matter.
        if !has_yaml_structure(yaml_content) {
            return Ok((Metadata::default(), content));
        }

        let value: serde_yaml::Value = serde_yaml::from_str(yaml_content)?;
        Ok((Metadata::from_yaml(value)?, remaining))
    }

    fn parse_json(content: &str) -> Result<(Metadata, &str), ContentError> {
        let rest = &content[3..];
        let Some(end_pos) = rest.find(";;;") else {
            return Ok((Metadata::default(), content));
        };

        let json_content = rest[..end_pos].trim();
        let remaining = rest[end_pos + 3..].trim_start_matches(['\n', '\r']);

        let json_content = if json_content.starts_with('{') {
            json_content.to_string()
        } else {
            // Bare key/value pairs between the ;;; markers
            format!("{{{}}}", json_content)
        };

        let values: IndexMap<String, serde_yaml::Value> = serde_json::from_str(&json_content)?;
        Ok((Metadata { values }, remaining))
    }
}

/// Whether a block looks like YAML: some line must be a `key: value` pair
/// with a simple key that is not a URL scheme.
fn has_yaml_structure(block: &str) -> bool {
    block.lines().any(|line| {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return false;
        }
        let Some(colon_pos) = trimmed.find(':') else {
            return false;
        };
        let key = &trimmed[..colon_pos];
        let is_valid_key = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            && !matches!(key, "http" | "https" | "ftp");
        if !is_valid_key {
            return false;
        }
        let after_colon = &trimmed[colon_pos + 1..];
        after_colon.is_empty() || after_colon.starts_with(' ')
    })
}

/// Parse a date string in various formats
fn parse_date_string(s: &str) -> Option<DateTime<Local>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local));
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return dt.and_local_timezone(Local).earliest();
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = chrono::NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0)?.and_local_timezone(Local).earliest();
        }
    }

    None
}
