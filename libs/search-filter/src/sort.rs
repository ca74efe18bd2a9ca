//! Sort parameter parsing (e.g. `-short_name,serial_number`).

use crate::error::{Error, Result};
use serde_json::{json, Value as JsonValue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub field: String,
    pub ascending: bool,
}

impl SortField {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: true,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: false,
        }
    }

    /// Parses a comma separated list; a leading `-` sorts descending.
    pub fn parse_list(value: &str) -> Result<Vec<SortField>> {
        let mut out = Vec::new();
        for raw in value.split(',') {
            let s = raw.trim();
            if s.is_empty() {
                continue;
            }
            let (field, ascending) = match s.strip_prefix('-') {
                Some(rest) => (rest.trim(), false),
                None => (s, true),
            };
            if field.is_empty() {
                return Err(Error::InvalidSort(raw.to_string()));
            }
            out.push(SortField {
                field: field.to_string(),
                ascending,
            });
        }
        Ok(out)
    }

    pub fn direction(&self) -> &'static str {
        if self.ascending {
            "asc"
        } else {
            "desc"
        }
    }

    pub fn render(&self) -> JsonValue {
        json!({ self.field.as_str(): self.direction() })
    }
}

/// Renders sort fields as the search backend's sort clause list.
pub fn render_sort(sort: &[SortField]) -> Vec<JsonValue> {
    sort.iter().map(SortField::render).collect()
}
