//! Membership repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{Member, Membership};
use crate::domain::container::{ContainerId, ContainerKind};
use crate::domain::list::{ListParams, Page};
use crate::domain::permission::Permission;
use crate::domain::user::UserId;
use crate::domain::DomainError;

/// Repository trait for the user/container join relation of kind `K`
///
/// Implementations enforce pair uniqueness atomically: a duplicate
/// [`insert`](MembershipRepository::insert) fails with
/// [`DomainError::AlreadyAssigned`] even when racing another insert.
#[async_trait]
pub trait MembershipRepository<K: ContainerKind>: Send + Sync + Debug {
    /// Insert a new membership; fails with `AlreadyAssigned` on a duplicate pair
    async fn insert(&self, membership: Membership<K>) -> Result<Membership<K>, DomainError>;

    /// Change the permission of an existing membership; fails with `NotAssigned`
    async fn update_permission(
        &self,
        user_id: &UserId,
        container_id: &ContainerId<K>,
        perm: Permission,
    ) -> Result<Membership<K>, DomainError>;

    /// Remove a membership; fails with `NotAssigned` when absent
    async fn delete(
        &self,
        user_id: &UserId,
        container_id: &ContainerId<K>,
    ) -> Result<(), DomainError>;

    async fn find_by_pair(
        &self,
        user_id: &UserId,
        container_id: &ContainerId<K>,
    ) -> Result<Option<Membership<K>>, DomainError>;

    /// Members of a container; search and sort apply to user fields
    async fn list_by_container(
        &self,
        container_id: &ContainerId<K>,
        params: &ListParams,
    ) -> Result<Page<Member<K>>, DomainError>;

    /// Memberships of a user; search and sort apply to container fields
    async fn list_by_user(
        &self,
        user_id: &UserId,
        params: &ListParams,
    ) -> Result<Page<Member<K>>, DomainError>;
}
