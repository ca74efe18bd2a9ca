//! Query builder: merges the free-text query and the structured filter.

use crate::ast::FilterNode;
use crate::error::{Error, Result};
use crate::parser::FilterParser;
use crate::tokenizer::{interpret, tokenize};
use serde_json::Value as JsonValue;

/// Collects the searchable parts of a list request and compiles them.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Option<String>,
    filters: Option<JsonValue>,
    parser: FilterParser,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `q` and `filter` from ordered request items.
    ///
    /// `filter` must be a JSON document; an undecodable one is an error, while
    /// malformed elements inside it are handled by the parser policy. Each of
    /// `q` and `filter` may appear at most once.
    pub fn from_params(items: &[(String, String)]) -> Result<Self> {
        for name in ["q", "filter"] {
            if items.iter().filter(|(k, _)| k == name).count() > 1 {
                return Err(Error::InvalidFilter(format!(
                    "parameter '{}' must not appear more than once",
                    name
                )));
            }
        }

        let mut builder = Self::new();
        for (key, value) in items {
            match key.as_str() {
                "q" => builder.set_query(value.clone()),
                "filter" => {
                    let decoded: JsonValue = serde_json::from_str(value).map_err(|e| {
                        Error::InvalidFilter(format!("filter is not valid JSON: {}", e))
                    })?;
                    builder.set_filters(decoded);
                }
                _ => {}
            }
        }
        Ok(builder)
    }

    /// Blank text counts as no query.
    pub fn set_query(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.query = if text.trim().is_empty() {
            None
        } else {
            Some(text)
        };
    }

    /// An empty list counts as no filter.
    pub fn set_filters(&mut self, filters: JsonValue) {
        let empty = match &filters {
            JsonValue::Null => true,
            JsonValue::Array(items) => items.is_empty(),
            _ => false,
        };
        self.filters = if empty { None } else { Some(filters) };
    }

    pub fn with_query(mut self, text: impl Into<String>) -> Self {
        self.set_query(text);
        self
    }

    pub fn with_filters(mut self, filters: JsonValue) -> Self {
        self.set_filters(filters);
        self
    }

    pub fn with_parser(mut self, parser: FilterParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn filters(&self) -> Option<&JsonValue> {
        self.filters.as_ref()
    }

    /// True when there is anything for the search index to do.
    pub fn is_active(&self) -> bool {
        self.query.is_some() || self.filters.is_some()
    }

    /// Compiles the text clause and the structured clause into one tree.
    pub fn compile(&self, text_fields: &[String]) -> Result<Option<FilterNode>> {
        let text_clause = self
            .query
            .as_deref()
            .and_then(|q| interpret(&tokenize(q), text_fields));

        let structured_clause = match &self.filters {
            Some(filters) => self.parser.parse(filters)?,
            None => None,
        };

        let compiled = FilterNode::combine_optionals([text_clause, structured_clause])
            .map(FilterNode::simplify);

        if let Some(node) = &compiled {
            tracing::debug!(filter = %node, "Compiled search filter");
        }
        Ok(compiled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields() -> Vec<String> {
        vec!["short_name".to_string(), "serial_number".to_string()]
    }

    fn items(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn inactive_without_query_or_filter() {
        assert!(!QueryBuilder::new().is_active());
        assert!(!QueryBuilder::new().with_query("   ").is_active());
        assert!(!QueryBuilder::new().with_filters(json!([])).is_active());
        assert!(QueryBuilder::new().with_query("abc").is_active());
        assert!(QueryBuilder::new()
            .with_filters(json!([{"model": "x"}]))
            .is_active());
    }

    #[test]
    fn compile_combines_text_and_filters() {
        let builder = QueryBuilder::new()
            .with_query("abc")
            .with_filters(json!([{"name": "model", "op": "eq", "val": "CS655"}]));
        assert_eq!(
            builder.compile(&fields()).unwrap(),
            Some(FilterNode::And(vec![
                FilterNode::phrase("abc", &fields()),
                FilterNode::term("model", "CS655"),
            ]))
        );
    }

    #[test]
    fn compile_with_only_text() {
        let builder = QueryBuilder::new().with_query("abc");
        assert_eq!(
            builder.compile(&fields()).unwrap(),
            Some(FilterNode::phrase("abc", &fields()))
        );
    }

    #[test]
    fn compile_keyword_only_query_is_empty() {
        let builder = QueryBuilder::new().with_query("AND");
        assert!(builder.is_active());
        assert_eq!(builder.compile(&fields()).unwrap(), None);
    }

    #[test]
    fn from_params_reads_query_and_filter() {
        let builder = QueryBuilder::from_params(&items(&[
            ("q", "probe"),
            ("filter", r#"[{"name":"model","op":"eq","val":"CS655"}]"#),
            ("page[size]", "10"),
        ]))
        .unwrap();
        assert_eq!(builder.query(), Some("probe"));
        assert_eq!(
            builder.filters(),
            Some(&json!([{"name": "model", "op": "eq", "val": "CS655"}]))
        );
    }

    #[test]
    fn from_params_rejects_undecodable_filter() {
        let err = QueryBuilder::from_params(&items(&[("filter", "[{")])).unwrap_err();
        assert!(matches!(err, Error::InvalidFilter(_)));
    }

    #[test]
    fn from_params_rejects_repeated_filter() {
        let err = QueryBuilder::from_params(&items(&[
            ("filter", r#"[{"is_public": false}]"#),
            ("filter", r#"[{"model": "CS655"}]"#),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::InvalidFilter(_)));
        assert!(err.to_string().contains("'filter'"));
    }

    #[test]
    fn from_params_rejects_repeated_query() {
        let err = QueryBuilder::from_params(&items(&[("q", "logger"), ("q", "sensor")])).unwrap_err();
        assert!(err.to_string().contains("'q'"));
    }

    #[test]
    fn strict_parser_propagates_errors() {
        let builder = QueryBuilder::new()
            .with_filters(json!([{"op": "eq"}]))
            .with_parser(FilterParser::strict());
        assert!(builder.compile(&fields()).is_err());
    }
}
