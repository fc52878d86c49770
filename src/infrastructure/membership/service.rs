//! Membership engine
//!
//! Attaches users to groups or teams, changes their permission and detaches
//! them again. Pair uniqueness is left to the store, which rejects a racing
//! duplicate with [`DomainError::AlreadyAssigned`].
//!
//! Per pair the lifecycle is `absent -> attached -> (re-permitted)* -> absent`:
//!
//! | operation | absent           | attached           |
//! |-----------|------------------|--------------------|
//! | attach    | attached         | `AlreadyAssigned`  |
//! | permit    | `NotAssigned`    | attached, touched  |
//! | drop      | `NotAssigned`    | absent             |

use std::sync::Arc;

use tracing::{error, info};

use crate::domain::container::{Container, ContainerKind, ContainerRepository};
use crate::domain::list::{ListParams, Page};
use crate::domain::membership::{Member, Membership, MembershipRepository};
use crate::domain::permission::Permission;
use crate::domain::user::{User, UserRepository, UserValidationError};
use crate::domain::{DomainError, ErrorKind};
use crate::infrastructure::observability::record_membership_operation;

#[derive(Debug)]
pub struct MembershipService<K: ContainerKind> {
    users: Arc<dyn UserRepository>,
    containers: Arc<dyn ContainerRepository<K>>,
    memberships: Arc<dyn MembershipRepository<K>>,
}

impl<K: ContainerKind> Clone for MembershipService<K> {
    fn clone(&self) -> Self {
        Self {
            users: Arc::clone(&self.users),
            containers: Arc::clone(&self.containers),
            memberships: Arc::clone(&self.memberships),
        }
    }
}

impl<K: ContainerKind> MembershipService<K> {
    pub fn new(
        users: Arc<dyn UserRepository>,
        containers: Arc<dyn ContainerRepository<K>>,
        memberships: Arc<dyn MembershipRepository<K>>,
    ) -> Self {
        Self {
            users,
            containers,
            memberships,
        }
    }

    /// Attach a user to a container, `user` permission when `perm` is absent
    ///
    /// Unknown references and an existing pair are reported before a bad
    /// `perm` value.
    pub async fn attach(
        &self,
        user_ref: &str,
        container_ref: &str,
        perm: Option<&str>,
    ) -> Result<Member<K>, DomainError> {
        let perm = Permission::parse(perm.filter(|p| !p.trim().is_empty()))
            .map(Option::unwrap_or_default);
        let (user, container) = self.resolve(user_ref, container_ref).await?;

        if self
            .memberships
            .find_by_pair(user.id(), container.id())
            .await?
            .is_some()
        {
            return Err(DomainError::already_assigned(K::NAME));
        }
        let perm = perm?;

        let membership = Membership::new(user.id().clone(), container.id().clone(), perm);
        let result = self.memberships.insert(membership).await;
        let membership = observe("attach", &user, &container, result)?;

        info!(
            action = "attach",
            kind = K::NAME,
            user_id = %user.id(),
            container_id = %container.id(),
            perm = %perm,
            "Attached user"
        );

        Ok(Member {
            membership,
            user,
            container,
        })
    }

    /// Change the permission of an existing membership
    ///
    /// Re-applying the current permission succeeds and bumps `updated_at`.
    /// A missing pair is reported before a bad or missing `perm`.
    pub async fn permit(
        &self,
        user_ref: &str,
        container_ref: &str,
        perm: Option<&str>,
    ) -> Result<Member<K>, DomainError> {
        let perm = Permission::parse(perm).map_err(DomainError::from).and_then(|perm| {
            perm.ok_or_else(|| {
                DomainError::validation("perm", UserValidationError::Blank.to_string())
            })
        });
        let (user, container) = self.resolve(user_ref, container_ref).await?;

        if self
            .memberships
            .find_by_pair(user.id(), container.id())
            .await?
            .is_none()
        {
            return Err(DomainError::not_assigned(K::NAME));
        }
        let perm = perm?;

        let result = self
            .memberships
            .update_permission(user.id(), container.id(), perm)
            .await;
        let membership = observe("permit", &user, &container, result)?;

        info!(
            action = "permit",
            kind = K::NAME,
            user_id = %user.id(),
            container_id = %container.id(),
            perm = %perm,
            "Updated permission"
        );

        Ok(Member {
            membership,
            user,
            container,
        })
    }

    /// Detach a user; a second drop of the same pair fails with `NotAssigned`
    pub async fn drop(&self, user_ref: &str, container_ref: &str) -> Result<(), DomainError> {
        let (user, container) = self.resolve(user_ref, container_ref).await?;

        let result = self.memberships.delete(user.id(), container.id()).await;
        observe("drop", &user, &container, result)?;

        info!(
            action = "drop",
            kind = K::NAME,
            user_id = %user.id(),
            container_id = %container.id(),
            "Dropped user"
        );

        Ok(())
    }

    /// Members of one container, searched over username, email and fullname
    pub async fn list_members(
        &self,
        container_ref: &str,
        params: &ListParams,
    ) -> Result<Page<Member<K>>, DomainError> {
        let container = self.container(container_ref).await?;
        self.memberships
            .list_by_container(container.id(), params)
            .await
    }

    /// Containers one user belongs to, searched over name and slug
    pub async fn list_for_user(
        &self,
        user_ref: &str,
        params: &ListParams,
    ) -> Result<Page<Member<K>>, DomainError> {
        let user = self.user(user_ref).await?;
        self.memberships.list_by_user(user.id(), params).await
    }

    async fn resolve(
        &self,
        user_ref: &str,
        container_ref: &str,
    ) -> Result<(User, Container<K>), DomainError> {
        let user = self.user(user_ref).await?;
        let container = self.container(container_ref).await?;
        Ok((user, container))
    }

    async fn user(&self, reference: &str) -> Result<User, DomainError> {
        self.users
            .find(reference)
            .await?
            .ok_or_else(|| DomainError::subject_not_found(reference))
    }

    async fn container(&self, reference: &str) -> Result<Container<K>, DomainError> {
        self.containers
            .find(reference)
            .await?
            .ok_or_else(|| DomainError::container_not_found(K::NAME, reference))
    }
}

/// Count the outcome and log failures the caller cannot act on
fn observe<K: ContainerKind, T>(
    action: &'static str,
    user: &User,
    container: &Container<K>,
    result: Result<T, DomainError>,
) -> Result<T, DomainError> {
    record_membership_operation(K::NAME, action, result.is_ok());

    if let Err(err) = &result {
        if err.kind() == ErrorKind::Internal {
            error!(
                action = action,
                kind = K::NAME,
                user_id = %user.id(),
                container_id = %container.id(),
                error = %err,
                "Membership operation failed"
            );
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::container::{GroupKind, TeamKind};
    use crate::domain::list::SortOrder;
    use crate::infrastructure::storage::InMemoryDatabase;

    struct Fixture {
        db: InMemoryDatabase,
        groups: MembershipService<GroupKind>,
        teams: MembershipService<TeamKind>,
    }

    impl Fixture {
        async fn new() -> Self {
            let db = InMemoryDatabase::new();
            let users = Arc::new(db.users());

            let people = [
                ("alice", "Alice Liddell"),
                ("bob", "Bob Builder"),
                ("carol", "Carol Danvers"),
            ];
            for (name, fullname) in people {
                users
                    .create(
                        User::new(name, format!("{}@example.com", name), "hash")
                            .with_fullname(fullname),
                    )
                    .await
                    .unwrap();
            }

            let groups = Arc::new(db.containers::<GroupKind>());
            groups.create(Container::new("Admins"), None).await.unwrap();
            let teams = Arc::new(db.containers::<TeamKind>());
            teams.create(Container::new("Admins"), None).await.unwrap();

            Self {
                groups: MembershipService::new(
                    users.clone(),
                    groups,
                    Arc::new(db.memberships::<GroupKind>()),
                ),
                teams: MembershipService::new(users, teams, Arc::new(db.memberships::<TeamKind>())),
                db,
            }
        }
    }

    #[tokio::test]
    async fn test_attach_permit_drop_scenario() {
        let fixture = Fixture::new().await;
        let service = &fixture.groups;

        let member = service.attach("alice", "admins", Some("user")).await.unwrap();
        assert_eq!(member.perm(), Permission::User);
        assert_eq!(member.user.username(), "alice");
        assert_eq!(member.container.slug(), "admins");

        let err = service.attach("alice", "admins", Some("admin")).await.unwrap_err();
        assert!(matches!(err, DomainError::AlreadyAssigned { kind: "group" }));
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let member = service.permit("alice", "admins", Some("owner")).await.unwrap();
        assert_eq!(member.perm(), Permission::Owner);

        service.drop("alice", "admins").await.unwrap();

        let err = service.drop("alice", "admins").await.unwrap_err();
        assert!(matches!(err, DomainError::NotAssigned { kind: "group" }));
        assert_eq!(err.kind(), ErrorKind::Precondition);

        let err = service.permit("alice", "admins", Some("user")).await.unwrap_err();
        assert!(matches!(err, DomainError::NotAssigned { .. }));
    }

    #[tokio::test]
    async fn test_attach_defaults_to_user_permission() {
        let fixture = Fixture::new().await;

        let member = fixture.groups.attach("bob", "admins", None).await.unwrap();
        assert_eq!(member.perm(), Permission::User);

        let member = fixture.teams.attach("bob", "admins", Some("")).await.unwrap();
        assert_eq!(member.perm(), Permission::User);
    }

    #[tokio::test]
    async fn test_invalid_permission_is_field_error() {
        let fixture = Fixture::new().await;
        fixture.groups.attach("carol", "admins", None).await.unwrap();

        for result in [
            fixture.groups.attach("bob", "admins", Some("root")).await,
            fixture.groups.permit("carol", "admins", None).await,
            fixture.groups.permit("carol", "admins", Some("root")).await,
        ] {
            match result.unwrap_err() {
                DomainError::Validation(errors) => assert!(errors.has_field("perm")),
                other => panic!("expected validation error, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_pair_state_reported_before_bad_permission() {
        let fixture = Fixture::new().await;
        let service = &fixture.groups;

        let err = service.permit("alice", "admins", Some("bogus")).await.unwrap_err();
        assert!(matches!(err, DomainError::NotAssigned { kind: "group" }));

        let err = service.permit("alice", "admins", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);

        let err = service.attach("nobody", "admins", Some("bogus")).await.unwrap_err();
        assert!(matches!(err, DomainError::SubjectNotFound { .. }));

        let err = service.attach("alice", "nothing", Some("bogus")).await.unwrap_err();
        assert!(matches!(err, DomainError::ContainerNotFound { .. }));

        let err = service.permit("nobody", "admins", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        service.attach("alice", "admins", None).await.unwrap();
        let err = service.attach("alice", "admins", Some("bogus")).await.unwrap_err();
        assert!(matches!(err, DomainError::AlreadyAssigned { kind: "group" }));
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = service.permit("alice", "admins", Some("bogus")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let member = service.permit("alice", "admins", Some("admin")).await.unwrap();
        assert_eq!(member.perm(), Permission::Admin);
    }

    #[tokio::test]
    async fn test_unknown_references() {
        let fixture = Fixture::new().await;

        let err = fixture.groups.attach("nobody", "admins", None).await.unwrap_err();
        assert!(matches!(err, DomainError::SubjectNotFound { .. }));

        let err = fixture.groups.attach("alice", "nothing", None).await.unwrap_err();
        assert!(matches!(err, DomainError::ContainerNotFound { kind: "group", .. }));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_repermit_same_value_touches() {
        let fixture = Fixture::new().await;

        let first = fixture.groups.attach("alice", "admins", Some("admin")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = fixture.groups.permit("alice", "admins", Some("admin")).await.unwrap();

        assert_eq!(second.perm(), Permission::Admin);
        assert!(second.membership.updated_at() > first.membership.updated_at());
        assert_eq!(second.membership.created_at(), first.membership.created_at());
    }

    #[tokio::test]
    async fn test_groups_and_teams_are_separate() {
        let fixture = Fixture::new().await;

        fixture.groups.attach("alice", "admins", None).await.unwrap();
        fixture.teams.attach("alice", "admins", None).await.unwrap();

        fixture.groups.drop("alice", "admins").await.unwrap();

        let teams = fixture
            .teams
            .list_for_user("alice", &ListParams::default())
            .await
            .unwrap();
        assert_eq!(teams.total, 1);
    }

    #[tokio::test]
    async fn test_concurrent_attach_has_one_winner() {
        let fixture = Fixture::new().await;
        let service = Arc::new(fixture.groups.clone());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.attach("carol", "admins", None).await })
            })
            .collect();

        let mut created = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(DomainError::AlreadyAssigned { .. }) => conflicts += 1,
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(conflicts, 15);
    }

    #[tokio::test]
    async fn test_list_members_search_sort_paginate() {
        let fixture = Fixture::new().await;
        for name in ["alice", "bob", "carol"] {
            fixture.groups.attach(name, "admins", None).await.unwrap();
        }

        let page = fixture
            .groups
            .list_members("admins", &ListParams::default().with_sort("username", SortOrder::Desc))
            .await
            .unwrap();
        let names: Vec<_> = page.records.iter().map(|m| m.user.username().to_string()).collect();
        assert_eq!(page.total, 3);
        assert_eq!(names, vec!["carol", "bob", "alice"]);

        let page = fixture
            .groups
            .list_members("admins", &ListParams::default().with_search("BUILDER"))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.records[0].user.username(), "bob");

        let page = fixture
            .groups
            .list_members("admins", &ListParams::default().with_page(1, 1))
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].user.username(), "bob");
    }

    #[tokio::test]
    async fn test_deleting_user_removes_memberships() {
        let fixture = Fixture::new().await;
        fixture.groups.attach("alice", "admins", None).await.unwrap();

        let alice = fixture.db.users().find("alice").await.unwrap().unwrap();
        fixture.db.users().delete(alice.id()).await.unwrap();

        let page = fixture
            .groups
            .list_members("admins", &ListParams::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }
}
