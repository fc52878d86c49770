//! Group and team payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Container, ContainerKind};
use crate::infrastructure::container::{CreateContainerRequest, UpdateContainerRequest};

#[derive(Debug, Clone, Serialize)]
pub struct ContainerResponse {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<K: ContainerKind> From<&Container<K>> for ContainerResponse {
    fn from(container: &Container<K>) -> Self {
        Self {
            id: container.id().to_string(),
            slug: container.slug().to_string(),
            name: container.name().to_string(),
            created_at: container.created_at(),
            updated_at: container.updated_at(),
        }
    }
}

impl<K: ContainerKind> From<Container<K>> for ContainerResponse {
    fn from(container: Container<K>) -> Self {
        Self::from(&container)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateContainerBody {
    #[serde(default)]
    pub name: String,
    pub slug: Option<String>,
}

impl From<CreateContainerBody> for CreateContainerRequest {
    fn from(body: CreateContainerBody) -> Self {
        Self {
            name: body.name,
            slug: body.slug,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateContainerBody {
    pub name: Option<String>,
    pub slug: Option<String>,
}

impl From<UpdateContainerBody> for UpdateContainerRequest {
    fn from(body: UpdateContainerBody) -> Self {
        Self {
            name: body.name,
            slug: body.slug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Team;

    #[test]
    fn test_response_from_container() {
        let team = Team::new("Platform Team");
        let json = serde_json::to_value(ContainerResponse::from(&team)).unwrap();

        assert_eq!(json["id"], team.id().as_str());
        assert_eq!(json["slug"], "platform-team");
        assert_eq!(json["name"], "Platform Team");
    }

    #[test]
    fn test_create_body_slug_is_optional() {
        let body: CreateContainerBody = serde_json::from_str(r#"{"name":"Ops"}"#).unwrap();
        let request = CreateContainerRequest::from(body);

        assert_eq!(request.name, "Ops");
        assert!(request.slug.is_none());
    }
}
