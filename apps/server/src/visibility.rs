//! Visibility rule registry
//!
//! The permission subsystem decides which records a user may see. Here it is
//! consumed only as a filter tree per entity, which the collection adapter
//! ANDs with the user's own filter. The registry is built once at startup and
//! shared read-only.

use crate::entities::EntityKind;
use instrumeta_filter::FilterNode;
use std::collections::HashMap;

/// The caller as far as visibility rules are concerned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestUser {
    pub id: Option<String>,
    pub is_superuser: bool,
    pub groups: Vec<String>,
}

impl RequestUser {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn with_groups(mut self, groups: Vec<String>) -> Self {
        self.groups = groups;
        self
    }

    pub fn superuser(mut self) -> Self {
        self.is_superuser = true;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.id.is_some()
    }
}

/// Produces the filter restricting an entity to what `user` may see.
///
/// `None` means no restriction.
pub trait VisibilityRule: Send + Sync {
    fn filter(&self, user: &RequestUser) -> Option<FilterNode>;
}

impl<F> VisibilityRule for F
where
    F: Fn(&RequestUser) -> Option<FilterNode> + Send + Sync,
{
    fn filter(&self, user: &RequestUser) -> Option<FilterNode> {
        self(user)
    }
}

#[derive(Default)]
pub struct VisibilityRegistry {
    rules: HashMap<EntityKind, Box<dyn VisibilityRule>>,
}

impl VisibilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: EntityKind, rule: impl VisibilityRule + 'static) {
        self.rules.insert(kind, Box::new(rule));
    }

    pub fn with_rule(mut self, kind: EntityKind, rule: impl VisibilityRule + 'static) -> Self {
        self.register(kind, rule);
        self
    }

    /// Superusers are never restricted.
    pub fn filter_for(&self, kind: EntityKind, user: &RequestUser) -> Option<FilterNode> {
        if user.is_superuser {
            return None;
        }
        self.rules.get(&kind).and_then(|rule| rule.filter(user))
    }
}

impl std::fmt::Debug for VisibilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisibilityRegistry")
            .field("entities", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}
