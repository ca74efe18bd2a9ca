//! Collaborator contracts for list requests

use crate::entities::EntityDescriptor;
use crate::services::ListRequest;
use crate::visibility::RequestUser;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

/// A rendered query plus paging, ready for the search index.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: JsonValue,
    /// One-based page number.
    pub page: usize,
    pub per_page: usize,
    /// `[{field: "asc"|"desc"}, ...]`
    pub sort: Vec<JsonValue>,
}

impl SearchRequest {
    pub fn from(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }

    /// Request body for a `_search` call.
    pub fn to_body(&self) -> JsonValue {
        let mut body = json!({
            "query": self.query,
            "from": self.from(),
            "size": self.per_page,
            "track_total_hits": true,
        });
        if !self.sort.is_empty() {
            body["sort"] = JsonValue::Array(self.sort.clone());
        }
        body
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub source: JsonValue,
}

impl SearchHit {
    /// The indexed document, with `id` filled in when the source lacks it.
    pub fn into_document(self) -> JsonValue {
        match self.source {
            JsonValue::Object(mut map) => {
                map.entry("id").or_insert(JsonValue::String(self.id));
                JsonValue::Object(map)
            }
            _ => json!({ "id": self.id }),
        }
    }
}

/// Result handle of one search call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHits {
    pub total: u64,
    pub hits: Vec<SearchHit>,
}

/// One page of a collection and the total number of matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionPage {
    pub total: u64,
    pub items: Vec<JsonValue>,
}

/// Executes a rendered query against one entity index.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, index: &str, request: &SearchRequest) -> Result<SearchHits>;
}

/// The existing relational listing path, used whenever search is not.
#[async_trait]
pub trait RelationalFallback: Send + Sync {
    async fn list(
        &self,
        resource: &str,
        request: &ListRequest,
        user: &RequestUser,
    ) -> Result<CollectionPage>;
}

/// Loads related data for search hits before they are returned.
#[async_trait]
pub trait EagerLoader: Send + Sync {
    async fn load(&self, entity: &EntityDescriptor, hits: SearchHits) -> Result<Vec<JsonValue>>;
}
