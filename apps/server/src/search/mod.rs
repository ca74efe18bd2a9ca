//! Search index collaborators
//!
//! The collection adapter talks to the search index and the relational store
//! only through the traits in [`backend`]; [`elasticsearch`] is the HTTP
//! implementation of the search side.

pub mod backend;
pub mod elasticsearch;

pub use backend::{
    CollectionPage, EagerLoader, RelationalFallback, SearchBackend, SearchHit, SearchHits,
    SearchRequest,
};
pub use elasticsearch::ElasticsearchBackend;
