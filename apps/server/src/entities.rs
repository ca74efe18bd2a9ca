//! Searchable entity registry
//!
//! Maps a resource name from the request path (e.g. `devices`) to the
//! descriptor the collection adapter needs: which index to query, which text
//! fields the free-text query runs against, and how sort keys map onto index
//! fields. Resources without an indexed descriptor resolve to the relational
//! fallback.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Device,
    Platform,
    Configuration,
    Contact,
    Site,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Device => "devices",
            Self::Platform => "platforms",
            Self::Configuration => "configurations",
            Self::Contact => "contacts",
            Self::Site => "sites",
        }
    }
}

/// How one entity is laid out in the search index.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDescriptor {
    pub kind: EntityKind,
    /// Index name without the configured prefix. `None` means not indexed.
    pub index: Option<String>,
    /// Analyzed text fields the free-text query is matched against.
    pub text_fields: Vec<String>,
    /// Request sort key to index field, for analyzed fields sorted on a keyword sub-field.
    pub sort_aliases: HashMap<String, String>,
}

impl EntityDescriptor {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            index: Some(kind.as_str().to_string()),
            text_fields: Vec::new(),
            sort_aliases: HashMap::new(),
        }
    }

    pub fn with_text_fields(mut self, fields: &[&str]) -> Self {
        self.text_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Sorts on `<field>.keyword` for each listed text field.
    pub fn with_keyword_sort(mut self, fields: &[&str]) -> Self {
        for field in fields {
            self.sort_aliases
                .insert(field.to_string(), format!("{}.keyword", field));
        }
        self
    }

    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    pub fn without_index(mut self) -> Self {
        self.index = None;
        self
    }

    pub fn resource(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Index field to sort on for a request sort key.
    pub fn sort_field<'a>(&'a self, key: &'a str) -> &'a str {
        self.sort_aliases.get(key).map(String::as_str).unwrap_or(key)
    }
}

/// Where a list request for a resource is served from.
#[derive(Debug, Clone, Copy)]
pub enum SearchTarget<'a> {
    Index {
        entity: &'a EntityDescriptor,
        /// Index name without the configured prefix.
        index: &'a str,
    },
    Relational,
}

/// Lookup table of searchable entities, built once at startup.
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    entities: HashMap<&'static str, EntityDescriptor>,
}

impl EntityRegistry {
    /// Empty registry; every resource resolves to the relational path.
    pub fn empty() -> Self {
        Self {
            entities: HashMap::new(),
        }
    }

    /// Registry with all known instrument metadata entities.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(
            EntityDescriptor::new(EntityKind::Device)
                .with_text_fields(&[
                    "short_name",
                    "long_name",
                    "description",
                    "serial_number",
                    "inventory_number",
                    "manufacturer_name",
                    "model",
                    "device_type_name",
                    "status_name",
                    "keywords",
                ])
                .with_keyword_sort(&["short_name", "long_name", "manufacturer_name", "model"]),
        );
        registry.register(
            EntityDescriptor::new(EntityKind::Platform)
                .with_text_fields(&[
                    "short_name",
                    "long_name",
                    "description",
                    "serial_number",
                    "inventory_number",
                    "manufacturer_name",
                    "model",
                    "platform_type_name",
                    "status_name",
                    "keywords",
                ])
                .with_keyword_sort(&["short_name", "long_name", "manufacturer_name", "model"]),
        );
        registry.register(
            EntityDescriptor::new(EntityKind::Configuration)
                .with_text_fields(&["label", "description", "project", "status", "keywords"])
                .with_keyword_sort(&["label", "project"]),
        );
        registry.register(
            EntityDescriptor::new(EntityKind::Contact)
                .with_text_fields(&[
                    "given_name",
                    "family_name",
                    "email",
                    "website",
                    "organization",
                ])
                .with_keyword_sort(&["given_name", "family_name", "email"]),
        );
        registry.register(
            EntityDescriptor::new(EntityKind::Site)
                .with_text_fields(&["label", "description", "street", "city", "country"])
                .with_keyword_sort(&["label"]),
        );
        registry
    }

    /// Adds or replaces the descriptor for its resource.
    pub fn register(&mut self, descriptor: EntityDescriptor) {
        self.entities.insert(descriptor.resource(), descriptor);
    }

    pub fn get(&self, resource: &str) -> Option<&EntityDescriptor> {
        self.entities.get(resource)
    }

    pub fn resolve(&self, resource: &str) -> SearchTarget<'_> {
        let Some(entity) = self.entities.get(resource) else {
            return SearchTarget::Relational;
        };
        match entity.index.as_deref() {
            Some(index) => SearchTarget::Index { entity, index },
            None => SearchTarget::Relational,
        }
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
