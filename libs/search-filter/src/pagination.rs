//! Page size and page number request parameters.

use crate::error::{Error, Result};

/// One-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub number: usize,
    pub size: usize,
}

impl Pagination {
    /// Parses `size` and `number`, falling back to `default_size` and page 1.
    pub fn from_params(
        size: Option<&str>,
        number: Option<&str>,
        default_size: usize,
    ) -> Result<Self> {
        let size = match size {
            Some(raw) => parse_positive("size", raw)?,
            None => default_size.max(1),
        };
        let number = match number {
            Some(raw) => parse_positive("number", raw)?,
            None => 1,
        };
        Ok(Self { number, size })
    }

    /// Reads `page[size]`/`size` and `page[number]`/`number` from request items.
    pub fn from_items(items: &[(String, String)], default_size: usize) -> Result<Self> {
        let mut size = None;
        let mut number = None;
        for (key, value) in items {
            match key.as_str() {
                "page[size]" | "size" => size = Some(value.as_str()),
                "page[number]" | "number" => number = Some(value.as_str()),
                _ => {}
            }
        }
        Self::from_params(size, number, default_size)
    }

    /// Zero-based index of the first hit on this page.
    pub fn offset(&self) -> usize {
        self.number.saturating_sub(1).saturating_mul(self.size)
    }
}

fn parse_positive(name: &str, raw: &str) -> Result<usize> {
    let invalid = || Error::InvalidPagination {
        name: name.to_string(),
        value: raw.to_string(),
    };
    let parsed: i64 = raw.trim().parse().map_err(|_| invalid())?;
    if parsed < 1 {
        return Err(invalid());
    }
    usize::try_from(parsed).map_err(|_| invalid())
}
