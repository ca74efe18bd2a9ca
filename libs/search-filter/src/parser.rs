//! Structured filter parser.
//!
//! Accepts the decoded `filter` request parameter, a list of elements shaped
//! like one of:
//!
//! ```text
//! {"name": <field>, "op": "eq"|"in_"|"any"|"ne", "val": <value or list>}
//! {"or": [<element>, ...]}
//! {"and": [<element>, ...]}
//! {<field>: <value>}
//! ```
//!
//! Elements that match none of these shapes are dropped in lenient mode and
//! rejected in strict mode.

use crate::ast::FilterNode;
use crate::error::{Error, Result};
use serde_json::{Map, Value as JsonValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterOp {
    Eq,
    In,
    Any,
    Ne,
}

impl FilterOp {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "eq" => Some(Self::Eq),
            "in_" => Some(Self::In),
            "any" => Some(Self::Any),
            "ne" => Some(Self::Ne),
            _ => None,
        }
    }
}

/// Parser for structured filter descriptions.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterParser {
    strict: bool,
}

impl FilterParser {
    /// Drops malformed elements.
    pub fn lenient() -> Self {
        Self { strict: false }
    }

    /// Fails on the first malformed element.
    pub fn strict() -> Self {
        Self { strict: true }
    }

    /// Parses a list of filter elements into one conjunction.
    ///
    /// A non-array input is treated as a one-element list. Returns `Ok(None)`
    /// when the list is empty or every element was dropped.
    pub fn parse(&self, filters: &JsonValue) -> Result<Option<FilterNode>> {
        match filters {
            JsonValue::Array(items) => self.parse_list(items),
            other => self.parse_list(std::slice::from_ref(other)),
        }
    }

    fn parse_list(&self, items: &[JsonValue]) -> Result<Option<FilterNode>> {
        let mut nodes = Vec::with_capacity(items.len());
        for item in items {
            if let Some(node) = self.parse_element(item)? {
                nodes.push(node);
            }
        }
        Ok(FilterNode::all(nodes))
    }

    fn parse_element(&self, element: &JsonValue) -> Result<Option<FilterNode>> {
        let Some(obj) = element.as_object() else {
            return self.malformed(element, "filter element must be an object");
        };

        if let Some(members) = obj.get("or") {
            return self.parse_group(element, members, FilterNode::any);
        }
        if let Some(members) = obj.get("and") {
            return self.parse_group(element, members, FilterNode::all);
        }

        if let Some(op) = obj.get("op") {
            return self.parse_operation(element, obj, op);
        }

        if obj.len() == 1 {
            if let Some((field, value)) = obj.iter().next() {
                if !is_field_path(field) {
                    return self.malformed(element, "field name has an empty segment");
                }
                let node = build_eq(field, value);
                return Ok(Some(FilterNode::nested(field, node)));
            }
        }

        self.malformed(element, "expected 'or', 'and', 'op' or a single field")
    }

    fn parse_group(
        &self,
        element: &JsonValue,
        members: &JsonValue,
        combine: fn(Vec<FilterNode>) -> Option<FilterNode>,
    ) -> Result<Option<FilterNode>> {
        let Some(members) = members.as_array() else {
            return self.malformed(element, "'or'/'and' must hold a list");
        };

        let mut nodes = Vec::with_capacity(members.len());
        for member in members {
            if let Some(node) = self.parse_element(member)? {
                nodes.push(node);
            }
        }
        Ok(combine(nodes))
    }

    fn parse_operation(
        &self,
        element: &JsonValue,
        obj: &Map<String, JsonValue>,
        op: &JsonValue,
    ) -> Result<Option<FilterNode>> {
        let Some(op) = op.as_str().and_then(FilterOp::parse) else {
            return self.malformed(element, "unsupported 'op'");
        };
        let Some(field) = obj.get("name").and_then(JsonValue::as_str) else {
            return self.malformed(element, "missing 'name'");
        };
        if !is_field_path(field) {
            return self.malformed(element, "field name has an empty segment");
        }
        let Some(value) = obj.get("val") else {
            return self.malformed(element, "missing 'val'");
        };

        let node = match op {
            FilterOp::Eq => build_eq(field, value),
            FilterOp::Ne => build_ne(field, value),
            FilterOp::Any => FilterNode::term_any(field, value.clone()),
            FilterOp::In => {
                let Some(values) = value.as_array() else {
                    return self.malformed(element, "'in_' expects a list value");
                };
                FilterNode::term_in(field, values.clone())
            }
        };

        Ok(Some(FilterNode::nested(field, node)))
    }

    fn malformed(&self, element: &JsonValue, reason: &str) -> Result<Option<FilterNode>> {
        if self.strict {
            return Err(Error::InvalidFilter(format!("{}: {}", reason, element)));
        }
        tracing::debug!(%element, reason, "Dropping malformed filter element");
        Ok(None)
    }
}

/// `a.b.c`, but not `a..c`, `.a` or an empty name.
fn is_field_path(field: &str) -> bool {
    field.split('.').all(|segment| !segment.is_empty())
}

/// Null means the field must be absent.
fn build_eq(field: &str, value: &JsonValue) -> FilterNode {
    if value.is_null() {
        FilterNode::not(FilterNode::exists(field))
    } else {
        FilterNode::term(field, value.clone())
    }
}

/// Null means the field must be present.
fn build_ne(field: &str, value: &JsonValue) -> FilterNode {
    if value.is_null() {
        FilterNode::exists(field)
    } else {
        FilterNode::not(FilterNode::term(field, value.clone()))
    }
}

/// Parses with the default lenient policy.
pub fn parse_filters(filters: &JsonValue) -> Option<FilterNode> {
    // Lenient parsing never returns an error.
    FilterParser::lenient().parse(filters).ok().flatten()
}
