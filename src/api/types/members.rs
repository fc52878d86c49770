//! Membership payloads, shared by the user side and the container side

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use super::containers::ContainerResponse;
use super::users::UserResponse;
use crate::domain::{ContainerKind, Member, Permission};

/// A membership with both endpoints, keyed by the container kind
///
/// ```json
/// {"user_id": "..", "group_id": "..", "user": {..}, "group": {..}, "perm": "owner", ..}
/// ```
#[derive(Debug, Clone)]
pub struct MemberResponse<K: ContainerKind> {
    pub user: UserResponse,
    pub container: ContainerResponse,
    pub perm: Permission,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    kind: PhantomData<K>,
}

impl<K: ContainerKind> From<Member<K>> for MemberResponse<K> {
    fn from(member: Member<K>) -> Self {
        Self {
            user: UserResponse::from(&member.user),
            container: ContainerResponse::from(&member.container),
            perm: member.perm(),
            created_at: member.membership.created_at(),
            updated_at: member.membership.updated_at(),
            kind: PhantomData,
        }
    }
}

impl<K: ContainerKind> Serialize for MemberResponse<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(7))?;
        map.serialize_entry("user_id", &self.user.id)?;
        map.serialize_entry(&format!("{}_id", K::NAME), &self.container.id)?;
        map.serialize_entry("user", &self.user)?;
        map.serialize_entry(K::NAME, &self.container)?;
        map.serialize_entry("perm", self.perm.as_str())?;
        map.serialize_entry("created_at", &self.created_at)?;
        map.serialize_entry("updated_at", &self.updated_at)?;
        map.end()
    }
}

/// Body for `/groups/{id}/users` and `/teams/{id}/users`
#[derive(Debug, Clone, Deserialize)]
pub struct ContainerMemberBody {
    #[serde(default)]
    pub user: String,
    pub perm: Option<String>,
}

/// Body for `/users/{id}/groups` and `/users/{id}/teams`
#[derive(Debug, Clone, Deserialize)]
pub struct UserMemberBody {
    #[serde(default, alias = "group", alias = "team")]
    pub container: String,
    pub perm: Option<String>,
}
