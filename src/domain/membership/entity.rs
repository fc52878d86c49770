//! Membership entity

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::container::{Container, ContainerId, ContainerKind};
use crate::domain::permission::Permission;
use crate::domain::user::{User, UserId};

/// Join record between one user and one container, unique per pair
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound = "")]
pub struct Membership<K: ContainerKind> {
    user_id: UserId,
    container_id: ContainerId<K>,
    perm: Permission,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<K: ContainerKind> Membership<K> {
    pub fn new(user_id: UserId, container_id: ContainerId<K>, perm: Permission) -> Self {
        let now = Utc::now();

        Self {
            user_id,
            container_id,
            perm,
            created_at: now,
            updated_at: now,
        }
    }

    /// Restore persisted timestamps
    pub fn with_timestamps(mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.updated_at = updated_at;
        self
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn container_id(&self) -> &ContainerId<K> {
        &self.container_id
    }

    pub fn perm(&self) -> Permission {
        self.perm
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_pair(&self, user_id: &UserId, container_id: &ContainerId<K>) -> bool {
        &self.user_id == user_id && &self.container_id == container_id
    }

    /// Set the permission; setting the current value again still touches
    pub fn set_perm(&mut self, perm: Permission) {
        self.perm = perm;
        self.updated_at = Utc::now();
    }
}

/// A membership joined with snapshots of both endpoints
#[derive(Debug, Clone)]
pub struct Member<K: ContainerKind> {
    pub membership: Membership<K>,
    pub user: User,
    pub container: Container<K>,
}

impl<K: ContainerKind> Member<K> {
    pub fn perm(&self) -> Permission {
        self.membership.perm()
    }
}
