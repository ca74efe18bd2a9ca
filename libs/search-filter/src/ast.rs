//! Filter tree and its rendering to the search index query language.
//!
//! A `FilterNode` is a plain value: it carries field names and JSON values only
//! and knows nothing about the relational store. Every node renders itself to
//! the boolean-query grammar of the search engine via [`FilterNode::render`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::fmt;

/// How a multi-field text match is analyzed by the search engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    BestFields,
    Phrase,
}

impl MatchType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BestFields => "best_fields",
            Self::Phrase => "phrase",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    /// Exact match on one field.
    TermEquals { field: String, value: JsonValue },
    /// Array field contains the value.
    TermAny { field: String, value: JsonValue },
    MultiFieldMatch {
        text: String,
        match_type: MatchType,
        fields: Vec<String>,
    },
    MultiFieldWildcard {
        pattern: String,
        fields: Vec<String>,
    },
    Not(Box<FilterNode>),
    Exists { field: String },
    /// Matches no document; what an empty `in_` list means.
    MatchNone,
    And(Vec<FilterNode>),
    Or(Vec<FilterNode>),
    /// Scopes `inner` to the nested sub-object at `path`.
    Nested {
        path: String,
        inner: Box<FilterNode>,
    },
}

impl FilterNode {
    pub fn term(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self::TermEquals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Exact match on any of `values`, as an `Or` of terms.
    ///
    /// One value is a plain term; no values match nothing.
    pub fn term_in(field: impl Into<String>, values: Vec<JsonValue>) -> Self {
        let field = field.into();
        let terms = values
            .into_iter()
            .map(|value| Self::term(field.as_str(), value))
            .collect();
        Self::any(terms).unwrap_or(Self::MatchNone)
    }

    pub fn term_any(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self::TermAny {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn exists(field: impl Into<String>) -> Self {
        Self::Exists {
            field: field.into(),
        }
    }

    pub fn phrase(text: impl Into<String>, fields: &[String]) -> Self {
        Self::MultiFieldMatch {
            text: text.into(),
            match_type: MatchType::Phrase,
            fields: fields.to_vec(),
        }
    }

    pub fn wildcard(pattern: impl Into<String>, fields: &[String]) -> Self {
        Self::MultiFieldWildcard {
            pattern: pattern.into(),
            fields: fields.to_vec(),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: FilterNode) -> Self {
        Self::Not(Box::new(inner))
    }

    /// Conjunction of `children`; a single child is returned as is.
    pub fn all(mut children: Vec<FilterNode>) -> Option<Self> {
        match children.len() {
            0 => None,
            1 => children.pop(),
            _ => Some(Self::And(children)),
        }
    }

    /// Disjunction of `children`; a single child is returned as is.
    pub fn any(mut children: Vec<FilterNode>) -> Option<Self> {
        match children.len() {
            0 => None,
            1 => children.pop(),
            _ => Some(Self::Or(children)),
        }
    }

    /// ANDs together whatever is present. Returns `None` when nothing is.
    pub fn combine_optionals<I>(parts: I) -> Option<Self>
    where
        I: IntoIterator<Item = Option<FilterNode>>,
    {
        Self::all(parts.into_iter().flatten().collect())
    }

    /// Wraps `inner` in one nested scope per dotted prefix of `field`.
    ///
    /// `a.b.c` becomes `nested(a, nested(a.b, inner))`; a plain field name
    /// leaves `inner` untouched.
    pub fn nested(field: &str, inner: FilterNode) -> Self {
        let segments: Vec<&str> = field.split('.').collect();
        let mut node = inner;
        for depth in (1..segments.len()).rev() {
            node = Self::Nested {
                path: segments[..depth].join("."),
                inner: Box::new(node),
            };
        }
        node
    }

    /// Collapses single-child `And`/`Or` nodes throughout the tree.
    pub fn simplify(self) -> Self {
        match self {
            Self::And(children) => {
                let mut children: Vec<_> = children.into_iter().map(Self::simplify).collect();
                if children.len() == 1 {
                    children.remove(0)
                } else {
                    Self::And(children)
                }
            }
            Self::Or(children) => {
                let mut children: Vec<_> = children.into_iter().map(Self::simplify).collect();
                if children.len() == 1 {
                    children.remove(0)
                } else {
                    Self::Or(children)
                }
            }
            Self::Not(inner) => Self::Not(Box::new(inner.simplify())),
            Self::Nested { path, inner } => Self::Nested {
                path,
                inner: Box::new(inner.simplify()),
            },
            leaf => leaf,
        }
    }

    /// Renders the node to the search engine's JSON query grammar.
    pub fn render(&self) -> JsonValue {
        match self {
            Self::TermEquals { field, value } | Self::TermAny { field, value } => {
                render_term(field, value)
            }
            // `should: []` would match everything.
            Self::MatchNone => json!({ "bool": { "must_not": [{ "match_all": {} }] } }),
            Self::MultiFieldMatch {
                text,
                match_type,
                fields,
            } => json!({
                "multi_match": {
                    "query": text,
                    "type": match_type.as_str(),
                    "fields": fields,
                }
            }),
            Self::MultiFieldWildcard { pattern, fields } => {
                let should: Vec<JsonValue> = fields
                    .iter()
                    .map(|field| json!({ "wildcard": { field.as_str(): { "value": pattern } } }))
                    .collect();
                json!({ "bool": { "should": should } })
            }
            Self::Not(inner) => json!({ "bool": { "must_not": [inner.render()] } }),
            Self::Exists { field } => json!({ "exists": { "field": field } }),
            Self::And(children) => {
                let must: Vec<JsonValue> = children.iter().map(Self::render).collect();
                json!({ "bool": { "must": must } })
            }
            Self::Or(children) => {
                let should: Vec<JsonValue> = children.iter().map(Self::render).collect();
                json!({ "bool": { "should": should } })
            }
            Self::Nested { path, inner } => json!({
                "nested": {
                    "path": path,
                    "query": inner.render(),
                }
            }),
        }
    }
}

fn render_term(field: &str, value: &JsonValue) -> JsonValue {
    json!({ "term": { field: { "value": value } } })
}

fn write_children(f: &mut fmt::Formatter<'_>, name: &str, children: &[FilterNode]) -> fmt::Result {
    write!(f, "{}(", name)?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", child)?;
    }
    write!(f, ")")
}

impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TermEquals { field, value } => write!(f, "term({}={})", field, value),
            Self::MatchNone => write!(f, "none"),
            Self::TermAny { field, value } => write!(f, "any({}={})", field, value),
            Self::MultiFieldMatch {
                text,
                match_type,
                fields,
            } => write!(
                f,
                "match[{}]({:?} in {})",
                match_type.as_str(),
                text,
                fields.join("|")
            ),
            Self::MultiFieldWildcard { pattern, fields } => {
                write!(f, "wildcard({:?} in {})", pattern, fields.join("|"))
            }
            Self::Not(inner) => write!(f, "not({})", inner),
            Self::Exists { field } => write!(f, "exists({})", field),
            Self::And(children) => write_children(f, "and", children),
            Self::Or(children) => write_children(f, "or", children),
            Self::Nested { path, inner } => write!(f, "nested[{}]({})", path, inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> Vec<String> {
        vec!["short_name".to_string(), "description".to_string()]
    }

    #[test]
    fn single_child_groups_simplify_to_the_child() {
        let x = FilterNode::term("manufacturer_name", "Campbell");
        assert_eq!(FilterNode::And(vec![x.clone()]).simplify(), x);
        assert_eq!(FilterNode::Or(vec![x.clone()]).simplify(), x);
    }

    #[test]
    fn simplify_recurses_into_not_and_nested() {
        let x = FilterNode::exists("contact.email");
        let tree = FilterNode::Nested {
            path: "contact".to_string(),
            inner: Box::new(FilterNode::not(FilterNode::Or(vec![FilterNode::And(vec![
                x.clone(),
            ])]))),
        };
        let expected = FilterNode::Nested {
            path: "contact".to_string(),
            inner: Box::new(FilterNode::not(x)),
        };
        assert_eq!(tree.simplify(), expected);
    }

    #[test]
    fn combine_optionals_drops_missing_parts() {
        let x = FilterNode::term("a", 1);
        let y = FilterNode::term("b", 2);
        assert_eq!(FilterNode::combine_optionals([None, None]), None);
        assert_eq!(
            FilterNode::combine_optionals([Some(x.clone()), None]),
            Some(x.clone())
        );
        assert_eq!(
            FilterNode::combine_optionals([Some(x.clone()), Some(y.clone())]),
            Some(FilterNode::And(vec![x, y]))
        );
    }

    #[test]
    fn nested_wraps_every_dotted_prefix() {
        let inner = FilterNode::term("a.b.c", "v");
        let expected = FilterNode::Nested {
            path: "a".to_string(),
            inner: Box::new(FilterNode::Nested {
                path: "a.b".to_string(),
                inner: Box::new(inner.clone()),
            }),
        };
        assert_eq!(FilterNode::nested("a.b.c", inner), expected);
    }

    #[test]
    fn nested_leaves_plain_fields_alone() {
        let inner = FilterNode::term("serial_number", "42");
        assert_eq!(FilterNode::nested("serial_number", inner.clone()), inner);
    }

    #[test]
    fn term_any_renders_like_term() {
        assert_eq!(
            FilterNode::term_any("keywords", "soil").render(),
            FilterNode::term("keywords", "soil").render()
        );
    }

    #[test]
    fn empty_term_in_matches_nothing() {
        assert_eq!(
            FilterNode::term_in("model", Vec::new()).render(),
            json!({ "bool": { "must_not": [{ "match_all": {} }] } })
        );
    }

    #[test]
    fn term_in_is_an_or_of_terms() {
        assert_eq!(
            FilterNode::term_in("model", vec![json!("CS655")]),
            FilterNode::term("model", "CS655")
        );
        assert_eq!(
            FilterNode::term_in("model", vec![json!("CS655"), json!("CS616")]),
            FilterNode::Or(vec![
                FilterNode::term("model", "CS655"),
                FilterNode::term("model", "CS616"),
            ])
        );
        assert_eq!(FilterNode::term_in("model", Vec::new()), FilterNode::MatchNone);
    }

    #[test]
    fn wildcard_renders_one_clause_per_field() {
        assert_eq!(
            FilterNode::wildcard("abc*", &fields()).render(),
            json!({
                "bool": {
                    "should": [
                        { "wildcard": { "short_name": { "value": "abc*" } } },
                        { "wildcard": { "description": { "value": "abc*" } } },
                    ]
                }
            })
        );
    }

    #[test]
    fn not_and_exists_render_as_must_not() {
        assert_eq!(
            FilterNode::not(FilterNode::exists("archived_at")).render(),
            json!({ "bool": { "must_not": [{ "exists": { "field": "archived_at" } }] } })
        );
    }

    #[test]
    fn phrase_match_renders_multi_match() {
        assert_eq!(
            FilterNode::phrase("soil moisture", &fields()).render(),
            json!({
                "multi_match": {
                    "query": "soil moisture",
                    "type": "phrase",
                    "fields": ["short_name", "description"],
                }
            })
        );
    }

    #[test]
    fn display_is_compact() {
        let node = FilterNode::And(vec![
            FilterNode::term("a", "x"),
            FilterNode::not(FilterNode::exists("b")),
        ]);
        assert_eq!(node.to_string(), r#"and(term(a="x"), not(exists(b)))"#);
    }
}
