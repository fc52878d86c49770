//! Group and team management

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::container::{
    Container, ContainerField, ContainerId, ContainerKind, ContainerRepository,
    ContainerValidationError,
};
use crate::domain::list::{ListParams, Page};
use crate::domain::membership::Membership;
use crate::domain::permission::Permission;
use crate::domain::slug::{slugify, with_random_suffix};
use crate::domain::user::UserId;
use crate::domain::validation::{Validate, ValidationErrors};
use crate::domain::DomainError;

const SLUG_ATTEMPTS: usize = 8;

/// Request for creating a group or team
#[derive(Debug, Clone, Default)]
pub struct CreateContainerRequest {
    pub name: String,
    /// Derived from the name when absent or empty
    pub slug: Option<String>,
}

/// Partial update of a group or team
#[derive(Debug, Clone, Default)]
pub struct UpdateContainerRequest {
    pub name: Option<String>,
    /// An empty slug is derived again from the name
    pub slug: Option<String>,
}

/// CRUD over containers of kind `K`
#[derive(Debug)]
pub struct ContainerService<K: ContainerKind> {
    repository: Arc<dyn ContainerRepository<K>>,
}

impl<K: ContainerKind> Clone for ContainerService<K> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<K: ContainerKind> ContainerService<K> {
    pub fn new(repository: Arc<dyn ContainerRepository<K>>) -> Self {
        Self { repository }
    }

    /// Create a container; `owner` is attached with `owner` permission atomically
    pub async fn create(
        &self,
        request: CreateContainerRequest,
        owner: Option<&UserId>,
    ) -> Result<Container<K>, DomainError> {
        let mut container = Container::<K>::new(request.name);

        let explicit_slug = request.slug.filter(|s| !s.trim().is_empty());
        let derived = explicit_slug.is_none();
        container = match explicit_slug {
            Some(slug) => container.with_slug(slug),
            None => {
                let slug = self.available_slug(container.slug(), None).await?;
                container.with_slug(slug)
            }
        };

        let mut errors = container.validate();
        self.check_taken(&container, derived, &mut errors).await?;
        errors.into_result()?;

        let owner = owner.map(|user_id| {
            Membership::new(user_id.clone(), container.id().clone(), Permission::Owner)
        });

        let container = self.repository.create(container, owner).await?;
        info!(
            kind = K::NAME,
            container_id = %container.id(),
            name = %container.name(),
            "Created container"
        );

        Ok(container)
    }

    pub async fn update(
        &self,
        reference: &str,
        request: UpdateContainerRequest,
    ) -> Result<Container<K>, DomainError> {
        let mut container = self.find(reference).await?;

        if let Some(name) = request.name {
            container.set_name(name);
        }

        let derived = match request.slug {
            Some(slug) if slug.trim().is_empty() => {
                let slug = self
                    .available_slug(&slugify(container.name()), Some(container.id()))
                    .await?;
                container.set_slug(slug);
                true
            }
            Some(slug) => {
                container.set_slug(slug);
                false
            }
            None => false,
        };

        let mut errors = container.validate();
        self.check_taken(&container, derived, &mut errors).await?;
        errors.into_result()?;

        let container = self.repository.update(&container).await?;
        debug!(kind = K::NAME, container_id = %container.id(), "Updated container");

        Ok(container)
    }

    pub async fn get(&self, id: &ContainerId<K>) -> Result<Container<K>, DomainError> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| DomainError::container_not_found(K::NAME, id.as_str()))
    }

    /// Resolve a container by id or slug
    pub async fn find(&self, reference: &str) -> Result<Container<K>, DomainError> {
        self.repository
            .find(reference)
            .await?
            .ok_or_else(|| DomainError::container_not_found(K::NAME, reference))
    }

    pub async fn list(&self, params: &ListParams) -> Result<Page<Container<K>>, DomainError> {
        self.repository.list(params).await
    }

    pub async fn count(&self) -> Result<usize, DomainError> {
        self.repository.count().await
    }

    /// Delete a container together with its memberships
    pub async fn delete(&self, reference: &str) -> Result<(), DomainError> {
        let container = self.find(reference).await?;

        if !self.repository.delete(container.id()).await? {
            return Err(DomainError::container_not_found(K::NAME, reference));
        }

        info!(kind = K::NAME, container_id = %container.id(), "Deleted container");
        Ok(())
    }

    async fn available_slug(
        &self,
        base: &str,
        except: Option<&ContainerId<K>>,
    ) -> Result<String, DomainError> {
        if base.is_empty()
            || !self
                .repository
                .is_taken(ContainerField::Slug, base, except)
                .await?
        {
            return Ok(base.to_string());
        }

        for _ in 0..SLUG_ATTEMPTS {
            let candidate = with_random_suffix(base);
            if !self
                .repository
                .is_taken(ContainerField::Slug, &candidate, except)
                .await?
            {
                return Ok(candidate);
            }
        }

        Err(DomainError::validation(
            "slug",
            ContainerValidationError::Taken.to_string(),
        ))
    }

    async fn check_taken(
        &self,
        container: &Container<K>,
        slug_checked: bool,
        errors: &mut ValidationErrors,
    ) -> Result<(), DomainError> {
        let mut fields = Vec::with_capacity(2);
        if !slug_checked {
            fields.push((ContainerField::Slug, container.slug()));
        }
        fields.push((ContainerField::Name, container.name()));

        for (field, value) in fields {
            if errors.has_field(field.as_str()) {
                continue;
            }

            if self
                .repository
                .is_taken(field, value, Some(container.id()))
                .await?
            {
                errors.add(field.as_str(), ContainerValidationError::Taken.to_string());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::container::{GroupKind, TeamKind};
    use crate::domain::membership::MembershipRepository;
    use crate::domain::User;
    use crate::domain::UserRepository;
    use crate::infrastructure::storage::InMemoryDatabase;

    fn request(name: &str) -> CreateContainerRequest {
        CreateContainerRequest {
            name: name.to_string(),
            slug: None,
        }
    }

    #[tokio::test]
    async fn test_create_derives_slug() {
        let db = InMemoryDatabase::new();
        let service = ContainerService::<GroupKind>::new(Arc::new(db.containers::<GroupKind>()));

        let group = service.create(request("Site Reliability"), None).await.unwrap();

        assert_eq!(group.slug(), "site-reliability");
        assert_eq!(group.kind(), "group");
    }

    #[tokio::test]
    async fn test_create_attaches_owner() {
        let db = InMemoryDatabase::new();
        let user = db
            .users()
            .create(User::new("jdoe", "jdoe@example.com", "hash"))
            .await
            .unwrap();
        let service = ContainerService::<TeamKind>::new(Arc::new(db.containers::<TeamKind>()));

        let team = service
            .create(request("Platform"), Some(user.id()))
            .await
            .unwrap();

        let membership = db
            .memberships::<TeamKind>()
            .find_by_pair(user.id(), team.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(membership.perm(), Permission::Owner);
    }

    #[tokio::test]
    async fn test_create_with_unknown_owner_fails() {
        let db = InMemoryDatabase::new();
        let service = ContainerService::<GroupKind>::new(Arc::new(db.containers::<GroupKind>()));

        let err = service
            .create(request("Platform"), Some(&UserId::generate()))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::SubjectNotFound { .. }));
        assert_eq!(service.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_name_is_validation_error() {
        let db = InMemoryDatabase::new();
        let service = ContainerService::<GroupKind>::new(Arc::new(db.containers::<GroupKind>()));
        service.create(request("Platform"), None).await.unwrap();

        let err = service.create(request("Platform"), None).await.unwrap_err();

        match err {
            DomainError::Validation(errors) => {
                assert!(errors.has_field("name"));
                assert!(!errors.has_field("slug"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_and_delete_by_slug() {
        let db = InMemoryDatabase::new();
        let service = ContainerService::<GroupKind>::new(Arc::new(db.containers::<GroupKind>()));
        let group = service.create(request("Platform"), None).await.unwrap();

        let updated = service
            .update(
                "platform",
                UpdateContainerRequest {
                    name: Some("Platform Ops".to_string()),
                    slug: Some(String::new()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.id(), group.id());
        assert_eq!(updated.slug(), "platform-ops");

        service.delete("platform-ops").await.unwrap();
        let err = service.find(group.id().as_str()).await.unwrap_err();
        assert!(matches!(err, DomainError::ContainerNotFound { kind: "group", .. }));
    }
}
