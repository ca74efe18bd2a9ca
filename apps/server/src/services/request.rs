//! List request parameters

use crate::Result;
use instrumeta_filter::{Pagination, QueryBuilder, SortField};

/// Query parameters of a collection list request, in request order.
///
/// Recognised keys: `q`, `filter`, `sort`, `page[size]`/`size` and
/// `page[number]`/`number`. Anything else is left for the relational path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRequest {
    items: Vec<(String, String)>,
}

impl ListRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: &[(String, String)]) -> Self {
        Self {
            items: items.to_vec(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.items.push((key.into(), value.into()));
        self
    }

    pub fn items(&self) -> &[(String, String)] {
        &self.items
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn query_builder(&self) -> Result<QueryBuilder> {
        Ok(QueryBuilder::from_params(&self.items)?)
    }

    pub fn pagination(&self, default_size: usize) -> Result<Pagination> {
        Ok(Pagination::from_items(&self.items, default_size)?)
    }

    /// Sort fields from the single `sort` parameter.
    pub fn sort(&self) -> Result<Vec<SortField>> {
        let mut values = self.items.iter().filter(|(k, _)| k == "sort");
        let Some((_, value)) = values.next() else {
            return Ok(Vec::new());
        };
        if values.next().is_some() {
            return Err(crate::Error::Validation(
                "Parameter 'sort' must not appear more than once".to_string(),
            ));
        }
        Ok(SortField::parse_list(value)?)
    }
}
