//! Business logic services

pub mod collection;
pub mod request;

pub use collection::{CollectionAdapter, SearchPlan};
pub use request::ListRequest;
