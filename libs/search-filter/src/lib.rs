//! Filter-expression compiler for the instrument metadata search index.
//!
//! Turns a free-text query (`abc OR "soil moisture" -broken`) and a structured
//! filter list (`[{"name": "model", "op": "eq", "val": "CS655"}]`) into one
//! [`FilterNode`] tree, and renders that tree to the boolean-query JSON of an
//! Elasticsearch/OpenSearch index.
//!
//! ```
//! use instrumeta_filter::QueryBuilder;
//! use serde_json::json;
//!
//! let fields = vec!["short_name".to_string(), "description".to_string()];
//! let builder = QueryBuilder::new()
//!     .with_query("abc*")
//!     .with_filters(json!([{"name": "manufacturer_name", "op": "eq", "val": "Campbell"}]));
//!
//! let query = builder.compile(&fields).unwrap().unwrap().render();
//! assert!(query["bool"]["must"].is_array());
//! ```
#![forbid(unsafe_code)]

mod ast;
mod builder;
mod error;
mod pagination;
mod parser;
mod sort;
mod tokenizer;

pub use ast::{FilterNode, MatchType};
pub use builder::QueryBuilder;
pub use error::{Error, Result};
pub use pagination::Pagination;
pub use parser::{parse_filters, FilterParser};
pub use sort::{render_sort, SortField};
pub use tokenizer::{interpret, tokenize};
