//! User service for authentication and user management

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::list::{ListParams, Page};
use crate::domain::slug::{slugify, with_random_suffix};
use crate::domain::user::{
    validate_password, User, UserField, UserId, UserRepository, UserValidationError,
};
use crate::domain::validation::{Validate, ValidationErrors};
use crate::domain::DomainError;

use super::password::PasswordHasher;

/// Attempts at a random slug suffix before giving up
const SLUG_ATTEMPTS: usize = 8;

/// Request for creating a new user
#[derive(Debug, Clone, Default)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub fullname: Option<String>,
    /// Derived from the username when absent or empty
    pub slug: Option<String>,
    pub active: bool,
    pub admin: bool,
}

/// Partial update of a user; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    /// An empty slug is derived again from the username
    pub slug: Option<String>,
    pub email: Option<String>,
    pub fullname: Option<String>,
    pub password: Option<String>,
    pub active: Option<bool>,
    pub admin: Option<bool>,
}

impl UpdateUserRequest {
    /// Drop the fields a user may not change about themselves
    pub fn for_profile(mut self) -> Self {
        self.active = None;
        self.admin = None;
        self
    }
}

/// User service for authentication and management
#[derive(Debug, Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { repository, hasher }
    }

    /// Create a new user
    pub async fn create(&self, request: CreateUserRequest) -> Result<User, DomainError> {
        let mut user = User::new(&request.username, &request.email, String::new())
            .with_fullname(request.fullname.unwrap_or_default())
            .with_flags(request.active, request.admin);

        let explicit_slug = request.slug.filter(|s| !s.trim().is_empty());
        let derived = explicit_slug.is_none();
        if let Some(slug) = explicit_slug {
            user = user.with_slug(slug);
        } else {
            let slug = self.available_slug(user.slug(), None).await?;
            user = user.with_slug(slug);
        }

        let mut errors = user.validate();
        errors.check("password", validate_password(&request.password));
        self.check_taken(&user, derived, &mut errors).await?;
        errors.into_result()?;

        user.set_password_hash(self.hasher.hash(&request.password)?);

        let user = self.repository.create(user).await?;
        info!(user_id = %user.id(), username = %user.username(), "Created user");

        Ok(user)
    }

    /// Apply a partial update to the user identified by `reference`
    pub async fn update(
        &self,
        reference: &str,
        request: UpdateUserRequest,
    ) -> Result<User, DomainError> {
        let mut user = self.find(reference).await?;

        if let Some(username) = request.username {
            user.set_username(username);
        }
        if let Some(email) = request.email {
            user.set_email(email);
        }
        if let Some(fullname) = request.fullname {
            user.set_fullname(fullname);
        }
        if let Some(active) = request.active {
            user.set_active(active);
        }
        if let Some(admin) = request.admin {
            user.set_admin(admin);
        }

        let derived = match request.slug {
            Some(slug) if slug.trim().is_empty() => {
                let slug = self
                    .available_slug(&slugify(user.username()), Some(user.id()))
                    .await?;
                user.set_slug(slug);
                true
            }
            Some(slug) => {
                user.set_slug(slug);
                false
            }
            None => false,
        };

        let mut errors = user.validate();

        let password = request.password.filter(|p| !p.is_empty());
        if let Some(password) = &password {
            errors.check("password", validate_password(password));
        }

        self.check_taken(&user, derived, &mut errors).await?;
        errors.into_result()?;

        if let Some(password) = password {
            user.set_password_hash(self.hasher.hash(&password)?);
        }

        let user = self.repository.update(&user).await?;
        debug!(user_id = %user.id(), "Updated user");

        Ok(user)
    }

    /// Authenticate a user with username and password
    ///
    /// Unknown users, wrong passwords and inactive accounts are
    /// indistinguishable to the caller.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, DomainError> {
        let user = self
            .repository
            .get_by_username(username)
            .await?
            .ok_or_else(|| DomainError::unauthorized("Wrong username or password"))?;

        if !self.hasher.verify(password, user.password_hash()) {
            return Err(DomainError::unauthorized("Wrong username or password"));
        }

        if !user.is_active() {
            return Err(DomainError::unauthorized("Wrong username or password"));
        }

        Ok(user)
    }

    /// Get a user by ID
    pub async fn get(&self, id: &UserId) -> Result<User, DomainError> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| DomainError::subject_not_found(id.as_str()))
    }

    /// Resolve a user by id, slug or username
    pub async fn find(&self, reference: &str) -> Result<User, DomainError> {
        self.repository
            .find(reference)
            .await?
            .ok_or_else(|| DomainError::subject_not_found(reference))
    }

    pub async fn list(&self, params: &ListParams) -> Result<Page<User>, DomainError> {
        self.repository.list(params).await
    }

    pub async fn count(&self) -> Result<usize, DomainError> {
        self.repository.count().await
    }

    /// Delete a user together with all of their memberships
    pub async fn delete(&self, reference: &str) -> Result<(), DomainError> {
        let user = self.find(reference).await?;

        if !self.repository.delete(user.id()).await? {
            return Err(DomainError::subject_not_found(reference));
        }

        info!(user_id = %user.id(), "Deleted user");
        Ok(())
    }

    /// Make sure an active admin with the given credentials exists
    pub async fn ensure_admin(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<User, DomainError> {
        match self.repository.get_by_username(username).await? {
            Some(existing) => {
                let request = UpdateUserRequest {
                    email: Some(email.to_string()),
                    password: Some(password.to_string()),
                    active: Some(true),
                    admin: Some(true),
                    ..Default::default()
                };

                let user = self.update(existing.id().as_str(), request).await?;
                info!(username = %user.username(), "Updated initial admin user");
                Ok(user)
            }
            None => {
                let request = CreateUserRequest {
                    username: username.to_string(),
                    password: password.to_string(),
                    email: email.to_string(),
                    fullname: Some("Admin".to_string()),
                    slug: None,
                    active: true,
                    admin: true,
                };

                let user = self.create(request).await?;
                info!(username = %user.username(), "Created initial admin user");
                Ok(user)
            }
        }
    }

    /// First free slug among `base` and suffixed variants of it
    async fn available_slug(
        &self,
        base: &str,
        except: Option<&UserId>,
    ) -> Result<String, DomainError> {
        if base.is_empty() || !self.repository.is_taken(UserField::Slug, base, except).await? {
            return Ok(base.to_string());
        }

        for _ in 0..SLUG_ATTEMPTS {
            let candidate = with_random_suffix(base);
            if !self
                .repository
                .is_taken(UserField::Slug, &candidate, except)
                .await?
            {
                return Ok(candidate);
            }
        }

        Err(DomainError::validation(
            "slug",
            UserValidationError::Taken.to_string(),
        ))
    }

    /// Probe the unique fields that passed format validation
    async fn check_taken(
        &self,
        user: &User,
        slug_checked: bool,
        errors: &mut ValidationErrors,
    ) -> Result<(), DomainError> {
        let mut fields = vec![
            (UserField::Username, user.username()),
            (UserField::Email, user.email()),
        ];
        if !slug_checked {
            fields.push((UserField::Slug, user.slug()));
        }

        for (field, value) in fields {
            if errors.has_field(field.as_str()) {
                continue;
            }

            if self.repository.is_taken(field, value, Some(user.id())).await? {
                errors.add(field.as_str(), UserValidationError::Taken.to_string());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::InMemoryDatabase;
    use crate::infrastructure::user::password::MockPasswordHasher;

    fn create_service() -> UserService {
        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_hash()
            .returning(|password| Ok(format!("hashed:{}", password)));
        hasher
            .expect_verify()
            .returning(|password, hash| hash == format!("hashed:{}", password));

        UserService::new(Arc::new(InMemoryDatabase::new().users()), Arc::new(hasher))
    }

    fn request(username: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            password: "supersecret".to_string(),
            email: format!("{}@example.com", username),
            active: true,
            ..Default::default()
        }
    }

    fn validation_fields(err: DomainError) -> Vec<String> {
        match err {
            DomainError::Validation(errors) => errors.iter().map(|e| e.field.clone()).collect(),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_hashes_password_and_derives_slug() {
        let service = create_service();

        let user = service.create(request("Jane.Doe")).await.unwrap();

        assert_eq!(user.slug(), "jane-doe");
        assert_eq!(user.password_hash(), "hashed:supersecret");
        assert!(user.is_active());
        assert!(!user.is_admin());
    }

    #[tokio::test]
    async fn test_create_collects_all_field_errors() {
        let service = create_service();

        let err = service
            .create(CreateUserRequest {
                username: "jd".to_string(),
                password: "short".to_string(),
                email: "not-an-email".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert_eq!(
            validation_fields(err),
            vec!["username", "slug", "email", "password"]
        );
    }

    #[tokio::test]
    async fn test_create_reports_taken_fields() {
        let service = create_service();
        service.create(request("jdoe")).await.unwrap();

        let err = service.create(request("jdoe")).await.unwrap_err();

        assert_eq!(validation_fields(err), vec!["username", "email"]);
    }

    #[tokio::test]
    async fn test_derived_slug_gets_suffix_on_collision() {
        let service = create_service();
        service.create(request("jdoe")).await.unwrap();

        let mut second = request("JDoe!");
        second.email = "other@example.com".to_string();
        let user = service.create(second).await.unwrap();

        assert!(user.slug().starts_with("jdoe-"));
        assert_eq!(user.slug().len(), "jdoe-".len() + 6);
    }

    #[tokio::test]
    async fn test_explicit_slug_collision_is_validation_error() {
        let service = create_service();
        service.create(request("jdoe")).await.unwrap();

        let mut second = request("other");
        second.slug = Some("jdoe".to_string());
        let err = service.create(second).await.unwrap_err();

        assert_eq!(validation_fields(err), vec!["slug"]);
    }

    #[tokio::test]
    async fn test_update_keeps_own_values_free() {
        let service = create_service();
        let user = service.create(request("jdoe")).await.unwrap();

        let updated = service
            .update(
                user.id().as_str(),
                UpdateUserRequest {
                    username: Some("jdoe".to_string()),
                    fullname: Some("John Doe".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.fullname(), "John Doe");
        assert!(updated.updated_at() >= user.updated_at());
    }

    #[tokio::test]
    async fn test_profile_update_cannot_escalate() {
        let service = create_service();
        let user = service.create(request("jdoe")).await.unwrap();

        let request = UpdateUserRequest {
            admin: Some(true),
            ..Default::default()
        }
        .for_profile();
        let updated = service.update(user.slug(), request).await.unwrap();

        assert!(!updated.is_admin());
    }

    #[tokio::test]
    async fn test_authenticate() {
        let service = create_service();
        let user = service.create(request("jdoe")).await.unwrap();

        let found = service.authenticate("jdoe", "supersecret").await.unwrap();
        assert_eq!(found.id(), user.id());

        let err = service.authenticate("jdoe", "wrongpass").await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized { .. }));

        let err = service.authenticate("nobody", "supersecret").await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_inactive_user() {
        let service = create_service();
        let mut inactive = request("jdoe");
        inactive.active = false;
        service.create(inactive).await.unwrap();

        let err = service.authenticate("jdoe", "supersecret").await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_delete_and_find() {
        let service = create_service();
        let user = service.create(request("jdoe")).await.unwrap();

        assert_eq!(service.find("jdoe").await.unwrap().id(), user.id());

        service.delete("jdoe").await.unwrap();

        let err = service.find(user.id().as_str()).await.unwrap_err();
        assert!(matches!(err, DomainError::SubjectNotFound { .. }));
    }

    #[tokio::test]
    async fn test_ensure_admin_creates_then_promotes() {
        let service = create_service();

        let admin = service
            .ensure_admin("admin", "adminpass", "admin@example.com")
            .await
            .unwrap();
        assert!(admin.is_admin());
        assert_eq!(admin.fullname(), "Admin");

        service
            .update(
                "admin",
                UpdateUserRequest {
                    admin: Some(false),
                    active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let again = service
            .ensure_admin("admin", "adminpass", "admin@example.com")
            .await
            .unwrap();
        assert_eq!(again.id(), admin.id());
        assert!(again.is_admin());
        assert!(again.is_active());
        assert_eq!(service.count().await.unwrap(), 1);
    }
}
