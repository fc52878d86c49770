//! Container repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{Container, ContainerId};
use super::kind::ContainerKind;
use crate::domain::list::{ListParams, Page, SortKey};
use crate::domain::membership::Membership;
use crate::domain::DomainError;

/// Unique container attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerField {
    Slug,
    Name,
}

impl ContainerField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Slug => "slug",
            Self::Name => "name",
        }
    }
}

/// Sort columns accepted when listing containers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContainerSort {
    #[default]
    Name,
    Slug,
}

impl SortKey for ContainerSort {
    fn from_param(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "name" => Some(Self::Name),
            "slug" => Some(Self::Slug),
            _ => None,
        }
    }
}

impl ContainerSort {
    pub fn column(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Slug => "slug",
        }
    }

    pub fn compare<K: ContainerKind>(
        &self,
        a: &Container<K>,
        b: &Container<K>,
    ) -> std::cmp::Ordering {
        match self {
            Self::Name => a.name().cmp(b.name()),
            Self::Slug => a.slug().cmp(b.slug()),
        }
    }
}

/// Repository trait for groups or teams
#[async_trait]
pub trait ContainerRepository<K: ContainerKind>: Send + Sync + Debug {
    async fn get(&self, id: &ContainerId<K>) -> Result<Option<Container<K>>, DomainError>;

    /// Find a container by id or slug
    async fn find(&self, reference: &str) -> Result<Option<Container<K>>, DomainError>;

    async fn list(&self, params: &ListParams) -> Result<Page<Container<K>>, DomainError>;

    /// Create a container, inserting `owner` in the same transaction when given
    async fn create(
        &self,
        container: Container<K>,
        owner: Option<Membership<K>>,
    ) -> Result<Container<K>, DomainError>;

    async fn update(&self, container: &Container<K>) -> Result<Container<K>, DomainError>;

    /// Delete a container together with all of its memberships
    async fn delete(&self, id: &ContainerId<K>) -> Result<bool, DomainError>;

    /// Whether `value` is already used for `field` by a container other than `except`
    async fn is_taken(
        &self,
        field: ContainerField,
        value: &str,
        except: Option<&ContainerId<K>>,
    ) -> Result<bool, DomainError>;

    async fn count(&self) -> Result<usize, DomainError>;
}
