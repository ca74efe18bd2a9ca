//! In-memory collaborators for collection adapter tests

use async_trait::async_trait;
use instrumeta::config::SearchConfig;
use instrumeta::entities::EntityDescriptor;
use instrumeta::search::{
    CollectionPage, EagerLoader, RelationalFallback, SearchBackend, SearchHit, SearchHits,
    SearchRequest,
};
use instrumeta::{
    CollectionAdapter, EntityRegistry, Error, ListRequest, RequestUser, Result, VisibilityRegistry,
};
use serde_json::{json, Value as JsonValue};
use std::sync::{Arc, Mutex};

/// Search backend that records every call and answers with fixed hits.
#[derive(Default)]
pub struct RecordingSearch {
    pub calls: Mutex<Vec<(String, SearchRequest)>>,
    hits: Vec<SearchHit>,
    fail: bool,
}

impl RecordingSearch {
    pub fn with_hits(ids: &[&str]) -> Self {
        Self {
            hits: ids
                .iter()
                .map(|id| SearchHit {
                    id: id.to_string(),
                    source: json!({ "short_name": format!("device {}", id) }),
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, SearchRequest)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchBackend for RecordingSearch {
    async fn search(&self, index: &str, request: &SearchRequest) -> Result<SearchHits> {
        self.calls
            .lock()
            .unwrap()
            .push((index.to_string(), request.clone()));
        if self.fail {
            return Err(Error::Search("index unavailable".to_string()));
        }
        Ok(SearchHits {
            total: self.hits.len() as u64,
            hits: self.hits.clone(),
        })
    }
}

/// Relational store that records every call and returns one marker row.
#[derive(Default)]
pub struct RecordingRelational {
    pub calls: Mutex<Vec<(String, ListRequest, RequestUser)>>,
}

impl RecordingRelational {
    pub fn calls(&self) -> Vec<(String, ListRequest, RequestUser)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RelationalFallback for RecordingRelational {
    async fn list(
        &self,
        resource: &str,
        request: &ListRequest,
        user: &RequestUser,
    ) -> Result<CollectionPage> {
        self.calls
            .lock()
            .unwrap()
            .push((resource.to_string(), request.clone(), user.clone()));
        Ok(CollectionPage {
            total: 1,
            items: vec![json!({ "id": "relational", "resource": resource })],
        })
    }
}

/// Eager loader that tags each hit with the entity it was loaded for.
pub struct TaggingLoader;

#[async_trait]
impl EagerLoader for TaggingLoader {
    async fn load(&self, entity: &EntityDescriptor, hits: SearchHits) -> Result<Vec<JsonValue>> {
        Ok(hits
            .hits
            .into_iter()
            .map(|hit| json!({ "id": hit.id, "loaded_for": entity.resource() }))
            .collect())
    }
}

pub struct TestAdapter {
    pub adapter: CollectionAdapter,
    pub search: Arc<RecordingSearch>,
    pub relational: Arc<RecordingRelational>,
}

impl TestAdapter {
    pub fn new(search: RecordingSearch, visibility: VisibilityRegistry) -> Self {
        let search = Arc::new(search);
        let relational = Arc::new(RecordingRelational::default());
        let adapter = CollectionAdapter::new(
            SearchConfig {
                default_page_size: 20,
                max_page_size: 100,
                ..SearchConfig::default()
            },
            Arc::new(EntityRegistry::new()),
            Arc::new(visibility),
            relational.clone(),
        )
        .with_search_backend(search.clone());
        Self {
            adapter,
            search,
            relational,
        }
    }

    pub fn with_hits(ids: &[&str]) -> Self {
        Self::new(RecordingSearch::with_hits(ids), VisibilityRegistry::new())
    }
}
