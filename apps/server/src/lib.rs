//! Instrument metadata service - search-backed collection listing
//!
//! Serves list requests for instrument metadata resources (devices,
//! platforms, configurations, contacts, sites) from a search index when the
//! request carries a free-text query or a structured filter, and from the
//! relational store otherwise.

pub mod config;
pub mod entities;
pub mod error;
pub mod logging;
pub mod search;
pub mod services;
pub mod visibility;

pub use config::Config;
pub use entities::{EntityDescriptor, EntityKind, EntityRegistry, SearchTarget};
pub use error::{Error, Result};
pub use services::{CollectionAdapter, ListRequest, SearchPlan};
pub use visibility::{RequestUser, VisibilityRegistry, VisibilityRule};
