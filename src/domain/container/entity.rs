//! Container entity shared by groups and teams

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::marker::PhantomData;

use super::kind::{ContainerKind, GroupKind, TeamKind};
use super::validation::{validate_name, validate_slug, ContainerValidationError};
use crate::domain::slug::slugify;
use crate::domain::validation::{Validate, ValidationErrors};

/// Identifier of a container of kind `K`; group and team ids do not mix
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerId<K: ContainerKind>(String, PhantomData<K>);

impl<K: ContainerKind> ContainerId<K> {
    pub fn new(id: impl Into<String>) -> Result<Self, ContainerValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ContainerValidationError::Blank);
        }
        Ok(Self(id, PhantomData))
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string(), PhantomData)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<K: ContainerKind> Serialize for ContainerId<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<K: ContainerKind> std::fmt::Display for ContainerId<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named collection of users: a [`Group`] or a [`Team`]
#[derive(Debug, Clone, Serialize)]
#[serde(bound = "")]
pub struct Container<K: ContainerKind> {
    id: ContainerId<K>,
    slug: String,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

pub type Group = Container<GroupKind>;
pub type Team = Container<TeamKind>;

impl<K: ContainerKind> Container<K> {
    /// Create a new container with a slug derived from the name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let now = Utc::now();

        Self {
            id: ContainerId::generate(),
            slug: slugify(&name),
            name,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_id(mut self, id: ContainerId<K>) -> Self {
        self.id = id;
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    /// Restore persisted timestamps
    pub fn with_timestamps(mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.updated_at = updated_at;
        self
    }

    pub fn kind(&self) -> &'static str {
        K::NAME
    }

    pub fn id(&self) -> &ContainerId<K> {
        &self.id
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether `reference` names this container by id or slug
    pub fn is_referenced_by(&self, reference: &str) -> bool {
        self.id.as_str() == reference || self.slug == reference
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    pub fn set_slug(&mut self, slug: impl Into<String>) {
        self.slug = slug.into();
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl<K: ContainerKind> Validate for Container<K> {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.check("slug", validate_slug(&self.slug));
        errors.check("name", validate_name(&self.name));
        errors
    }
}
