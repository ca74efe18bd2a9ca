//! Collection adapter - list requests served from the search index
//!
//! Decides per request whether the search index or the relational store
//! answers a list call, and for the search path:
//! - compiles `q` and `filter` into one filter tree
//! - ANDs it with the user's visibility filter
//! - applies pagination and sort, executes, and post-processes hits

use crate::{
    config::{Config, SearchConfig},
    entities::{EntityDescriptor, EntityRegistry, SearchTarget},
    search::{
        CollectionPage, EagerLoader, ElasticsearchBackend, RelationalFallback, SearchBackend,
        SearchHit, SearchRequest,
    },
    services::ListRequest,
    visibility::{RequestUser, VisibilityRegistry},
    Error, Result,
};
use instrumeta_filter::{render_sort, FilterNode, QueryBuilder, SortField};
use serde_json::json;
use std::sync::Arc;

/// Everything needed to run one search call.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPlan {
    /// Index name without the configured prefix.
    pub index: String,
    pub request: SearchRequest,
}

enum Route<'a> {
    Relational(&'static str),
    Search {
        entity: &'a EntityDescriptor,
        index: &'a str,
        backend: &'a dyn SearchBackend,
        builder: QueryBuilder,
    },
}

/// List endpoint adapter shared by all collection resources.
pub struct CollectionAdapter {
    config: SearchConfig,
    entities: Arc<EntityRegistry>,
    visibility: Arc<VisibilityRegistry>,
    search: Option<Arc<dyn SearchBackend>>,
    relational: Arc<dyn RelationalFallback>,
    eager_loader: Option<Arc<dyn EagerLoader>>,
}

impl CollectionAdapter {
    /// Adapter without a search backend; every request is relational until
    /// one is attached.
    pub fn new(
        config: SearchConfig,
        entities: Arc<EntityRegistry>,
        visibility: Arc<VisibilityRegistry>,
        relational: Arc<dyn RelationalFallback>,
    ) -> Self {
        Self {
            config,
            entities,
            visibility,
            search: None,
            relational,
            eager_loader: None,
        }
    }

    /// Adapter for the loaded configuration, with an Elasticsearch backend
    /// when `search.url` is set.
    pub fn from_config(
        config: &Config,
        entities: Arc<EntityRegistry>,
        visibility: Arc<VisibilityRegistry>,
        relational: Arc<dyn RelationalFallback>,
    ) -> Result<Self> {
        let adapter = Self::new(config.search.clone(), entities, visibility, relational);
        if !config.search.is_enabled() {
            tracing::info!("Search index not configured, list requests use the relational store");
            return Ok(adapter);
        }
        let backend = ElasticsearchBackend::new(&config.search)?;
        Ok(adapter.with_search_backend(Arc::new(backend)))
    }

    pub fn with_search_backend(mut self, backend: Arc<dyn SearchBackend>) -> Self {
        self.search = Some(backend);
        self
    }

    pub fn with_eager_loader(mut self, loader: Arc<dyn EagerLoader>) -> Self {
        self.eager_loader = Some(loader);
        self
    }

    pub fn search_enabled(&self) -> bool {
        self.search.is_some()
    }

    /// One page of `resource` for `user`.
    ///
    /// Falls back to the relational store when there is no search backend,
    /// the resource is not indexed, or the request has neither `q` nor
    /// `filter`. Once the search path is taken, its errors propagate as-is.
    pub async fn list(
        &self,
        resource: &str,
        request: &ListRequest,
        user: &RequestUser,
    ) -> Result<CollectionPage> {
        let (entity, index, backend, builder) = match self.route(resource, request)? {
            Route::Relational(reason) => {
                tracing::debug!(resource, reason, "Listing from relational store");
                return self.relational.list(resource, request, user).await;
            }
            Route::Search {
                entity,
                index,
                backend,
                builder,
            } => (entity, index, backend, builder),
        };

        let plan = self.plan_for(entity, index, &builder, request, user)?;
        tracing::info!(
            resource,
            index = %plan.index,
            page = plan.request.page,
            per_page = plan.request.per_page,
            "Listing from search index"
        );

        let hits = backend.search(&plan.index, &plan.request).await?;
        let total = hits.total;
        let items = match &self.eager_loader {
            Some(loader) => loader.load(entity, hits).await?,
            None => hits.hits.into_iter().map(SearchHit::into_document).collect(),
        };

        tracing::debug!(resource, total, returned = items.len(), "Search complete");
        Ok(CollectionPage { total, items })
    }

    /// The search call `list` would make, or `None` when it would take the
    /// relational path.
    pub fn plan(
        &self,
        resource: &str,
        request: &ListRequest,
        user: &RequestUser,
    ) -> Result<Option<SearchPlan>> {
        match self.route(resource, request)? {
            Route::Relational(_) => Ok(None),
            Route::Search {
                entity,
                index,
                builder,
                ..
            } => self.plan_for(entity, index, &builder, request, user).map(Some),
        }
    }

    fn route<'a>(&'a self, resource: &str, request: &ListRequest) -> Result<Route<'a>> {
        let Some(backend) = self.search.as_deref() else {
            return Ok(Route::Relational("search index not configured"));
        };
        let SearchTarget::Index { entity, index } = self.entities.resolve(resource) else {
            return Ok(Route::Relational("resource is not indexed"));
        };
        let builder = request.query_builder()?;
        if !builder.is_active() {
            return Ok(Route::Relational("no query or filter"));
        }
        Ok(Route::Search {
            entity,
            index,
            backend,
            builder,
        })
    }

    fn plan_for(
        &self,
        entity: &EntityDescriptor,
        index: &str,
        builder: &QueryBuilder,
        request: &ListRequest,
        user: &RequestUser,
    ) -> Result<SearchPlan> {
        let compiled = builder.compile(&entity.text_fields)?;
        let visible = self.visibility.filter_for(entity.kind, user);
        let combined = FilterNode::combine_optionals([compiled, visible]).map(FilterNode::simplify);

        let page = request.pagination(self.config.default_page_size)?;
        if page.size > self.config.max_page_size {
            return Err(Error::TooCostly(format!(
                "page size {} exceeds the maximum of {}",
                page.size, self.config.max_page_size
            )));
        }

        let sort: Vec<SortField> = request
            .sort()?
            .into_iter()
            .map(|s| SortField {
                field: entity.sort_field(&s.field).to_string(),
                ascending: s.ascending,
            })
            .collect();

        let query = combined
            .map(|node| node.render())
            .unwrap_or_else(|| json!({"match_all": {}}));

        Ok(SearchPlan {
            index: index.to_string(),
            request: SearchRequest {
                query,
                page: page.number,
                per_page: page.size,
                sort: render_sort(&sort),
            },
        })
    }
}

impl std::fmt::Debug for CollectionAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionAdapter")
            .field("config", &self.config)
            .field("entities", &self.entities)
            .field("visibility", &self.visibility)
            .field("search_enabled", &self.search.is_some())
            .field("eager_loading", &self.eager_loader.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::EntityKind;
    use crate::search::SearchHits;
    use async_trait::async_trait;

    struct NoSearch;

    #[async_trait]
    impl SearchBackend for NoSearch {
        async fn search(&self, _index: &str, _request: &SearchRequest) -> Result<SearchHits> {
            Err(Error::Search("not reachable in these tests".to_string()))
        }
    }

    struct NoRows;

    #[async_trait]
    impl RelationalFallback for NoRows {
        async fn list(
            &self,
            _resource: &str,
            _request: &ListRequest,
            _user: &RequestUser,
        ) -> Result<CollectionPage> {
            Ok(CollectionPage::default())
        }
    }

    fn adapter() -> CollectionAdapter {
        let visibility = VisibilityRegistry::new().with_rule(EntityKind::Device, |_: &RequestUser| {
            Some(FilterNode::term("is_public", true))
        });
        CollectionAdapter::new(
            SearchConfig {
                max_page_size: 100,
                ..SearchConfig::default()
            },
            Arc::new(EntityRegistry::new()),
            Arc::new(visibility),
            Arc::new(NoRows),
        )
        .with_search_backend(Arc::new(NoSearch))
    }

    #[test]
    fn plan_without_search_backend_is_relational() {
        let adapter = CollectionAdapter::new(
            SearchConfig::default(),
            Arc::new(EntityRegistry::new()),
            Arc::new(VisibilityRegistry::new()),
            Arc::new(NoRows),
        );
        let request = ListRequest::new().with("q", "probe");
        assert!(!adapter.search_enabled());
        assert_eq!(
            adapter
                .plan("devices", &request, &RequestUser::anonymous())
                .unwrap(),
            None
        );
    }

    #[test]
    fn plan_ands_visibility_and_maps_sort() {
        let request = ListRequest::new()
            .with("q", "probe")
            .with("sort", "-short_name,created_at")
            .with("page[number]", "2")
            .with("page[size]", "10");
        let plan = adapter()
            .plan("devices", &request, &RequestUser::anonymous())
            .unwrap()
            .unwrap();

        assert_eq!(plan.index, "devices");
        assert_eq!(plan.request.page, 2);
        assert_eq!(plan.request.per_page, 10);
        assert_eq!(
            plan.request.sort,
            vec![
                json!({"short_name.keyword": "desc"}),
                json!({"created_at": "asc"}),
            ]
        );
        let must = plan.request.query["bool"]["must"].as_array().unwrap();
        assert_eq!(must.len(), 2);
        assert_eq!(must[1], json!({"term": {"is_public": {"value": true}}}));
    }

    #[test]
    fn plan_targets_the_registered_index() {
        let mut entities = EntityRegistry::new();
        entities.register(
            EntityDescriptor::new(EntityKind::Site)
                .with_text_fields(&["label"])
                .with_index("sites_v2"),
        );
        let adapter = CollectionAdapter::new(
            SearchConfig::default(),
            Arc::new(entities),
            Arc::new(VisibilityRegistry::new()),
            Arc::new(NoRows),
        )
        .with_search_backend(Arc::new(NoSearch));

        let request = ListRequest::new().with("q", "Lindenberg");
        let plan = adapter
            .plan("sites", &request, &RequestUser::anonymous())
            .unwrap()
            .unwrap();
        assert_eq!(plan.index, "sites_v2");
    }

    #[test]
    fn keyword_only_query_searches_everything_visible() {
        let request = ListRequest::new().with("q", "OR");
        let plan = adapter()
            .plan("sites", &request, &RequestUser::anonymous())
            .unwrap()
            .unwrap();
        assert_eq!(plan.request.query, json!({"match_all": {}}));
    }

    #[test]
    fn oversized_pages_are_too_costly() {
        let request = ListRequest::new()
            .with("q", "probe")
            .with("page[size]", "101");
        let err = adapter()
            .plan("devices", &request, &RequestUser::anonymous())
            .unwrap_err();
        assert!(matches!(err, Error::TooCostly(_)));
    }
}
