//! In-memory storage implementation
//!
//! All tables live behind one `RwLock`, so every write (including the
//! membership uniqueness check and cascading deletes) happens atomically.
//! Useful for testing and development. Data is lost when the process terminates.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::container::{
    Container, ContainerField, ContainerId, ContainerKind, ContainerRepository, ContainerSort,
    GroupKind, TeamKind,
};
use crate::domain::list::{ListParams, Page, SortOrder};
use crate::domain::membership::{Member, Membership, MembershipRepository};
use crate::domain::permission::Permission;
use crate::domain::user::{User, UserField, UserId, UserRepository, UserSort};
use crate::domain::DomainError;

const TAKEN: &str = "is already taken";

/// Containers and memberships of one kind
#[derive(Debug, Default)]
pub struct KindTable<K: ContainerKind> {
    containers: HashMap<String, Container<K>>,
    memberships: Vec<Membership<K>>,
}

#[derive(Debug, Default)]
pub struct Tables {
    users: HashMap<String, User>,
    groups: KindTable<GroupKind>,
    teams: KindTable<TeamKind>,
}

impl Tables {
    fn delete_user(&mut self, id: &UserId) -> bool {
        let removed = self.users.remove(id.as_str()).is_some();
        self.groups.memberships.retain(|m| m.user_id() != id);
        self.teams.memberships.retain(|m| m.user_id() != id);
        removed
    }
}

/// Selects the table of a container kind
pub trait StoredKind: ContainerKind {
    fn table(tables: &Tables) -> &KindTable<Self>;
    fn table_mut(tables: &mut Tables) -> &mut KindTable<Self>;
}

impl StoredKind for GroupKind {
    fn table(tables: &Tables) -> &KindTable<Self> {
        &tables.groups
    }

    fn table_mut(tables: &mut Tables) -> &mut KindTable<Self> {
        &mut tables.groups
    }
}

impl StoredKind for TeamKind {
    fn table(tables: &Tables) -> &KindTable<Self> {
        &tables.teams
    }

    fn table_mut(tables: &mut Tables) -> &mut KindTable<Self> {
        &mut tables.teams
    }
}

/// Shared in-memory database handed to every in-memory repository
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryUserRepository { db: self.clone() }
    }

    pub fn containers<K: StoredKind>(&self) -> InMemoryContainerRepository<K> {
        InMemoryContainerRepository {
            db: self.clone(),
            _kind: std::marker::PhantomData,
        }
    }

    pub fn memberships<K: StoredKind>(&self) -> InMemoryMembershipRepository<K> {
        InMemoryMembershipRepository {
            db: self.clone(),
            _kind: std::marker::PhantomData,
        }
    }
}

fn ordered<T>(
    mut records: Vec<T>,
    order: SortOrder,
    cmp: impl Fn(&T, &T) -> std::cmp::Ordering,
) -> Vec<T> {
    records.sort_by(|a, b| {
        let ordering = cmp(a, b);
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
    records
}

fn user_matches(params: &ListParams, user: &User) -> bool {
    params.matches([user.username(), user.email(), user.fullname()])
}

fn container_matches<K: ContainerKind>(params: &ListParams, container: &Container<K>) -> bool {
    params.matches([container.name(), container.slug()])
}

fn user_value<'a>(user: &'a User, field: UserField) -> &'a str {
    match field {
        UserField::Slug => user.slug(),
        UserField::Username => user.username(),
        UserField::Email => user.email(),
    }
}

fn container_value<K: ContainerKind>(container: &Container<K>, field: ContainerField) -> &str {
    match field {
        ContainerField::Slug => container.slug(),
        ContainerField::Name => container.name(),
    }
}

fn check_user_unique(tables: &Tables, user: &User) -> Result<(), DomainError> {
    for field in [UserField::Username, UserField::Slug, UserField::Email] {
        let value = user_value(user, field);
        let taken = tables
            .users
            .values()
            .any(|u| u.id() != user.id() && user_value(u, field) == value);

        if taken {
            return Err(DomainError::validation(field.as_str(), TAKEN));
        }
    }
    Ok(())
}

fn check_container_unique<K: ContainerKind>(
    table: &KindTable<K>,
    container: &Container<K>,
) -> Result<(), DomainError> {
    for field in [ContainerField::Slug, ContainerField::Name] {
        let value = container_value(container, field);
        let taken = table
            .containers
            .values()
            .any(|c| c.id() != container.id() && container_value(c, field) == value);

        if taken {
            return Err(DomainError::validation(field.as_str(), TAKEN));
        }
    }
    Ok(())
}

/// In-memory user repository
#[derive(Debug, Clone)]
pub struct InMemoryUserRepository {
    db: InMemoryDatabase,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let tables = self.db.tables.read().await;
        Ok(tables.users.get(id.as_str()).cloned())
    }

    async fn find(&self, reference: &str) -> Result<Option<User>, DomainError> {
        let tables = self.db.tables.read().await;
        if let Some(user) = tables.users.get(reference) {
            return Ok(Some(user.clone()));
        }
        Ok(tables
            .users
            .values()
            .find(|u| u.is_referenced_by(reference))
            .cloned())
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        let tables = self.db.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username() == username)
            .cloned())
    }

    async fn list(&self, params: &ListParams) -> Result<Page<User>, DomainError> {
        let tables = self.db.tables.read().await;
        let sort: UserSort = params.sort_column();

        let matching: Vec<User> = tables
            .users
            .values()
            .filter(|u| user_matches(params, u))
            .cloned()
            .collect();
        let total = matching.len();

        let sorted = ordered(matching, params.order, |a, b| {
            sort.compare(a, b).then_with(|| a.id().as_str().cmp(b.id().as_str()))
        });

        Ok(Page::new(params.paginate(sorted), total))
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut tables = self.db.tables.write().await;

        if tables.users.contains_key(user.id().as_str()) {
            return Err(DomainError::conflict(format!(
                "User with ID '{}' already exists",
                user.id()
            )));
        }
        check_user_unique(&tables, &user)?;

        tables
            .users
            .insert(user.id().as_str().to_string(), user.clone());
        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let mut tables = self.db.tables.write().await;

        if !tables.users.contains_key(user.id().as_str()) {
            return Err(DomainError::subject_not_found(user.id().as_str()));
        }
        check_user_unique(&tables, user)?;

        tables
            .users
            .insert(user.id().as_str().to_string(), user.clone());
        Ok(user.clone())
    }

    async fn delete(&self, id: &UserId) -> Result<bool, DomainError> {
        let mut tables = self.db.tables.write().await;
        Ok(tables.delete_user(id))
    }

    async fn is_taken(
        &self,
        field: UserField,
        value: &str,
        except: Option<&UserId>,
    ) -> Result<bool, DomainError> {
        let tables = self.db.tables.read().await;
        Ok(tables
            .users
            .values()
            .any(|u| Some(u.id()) != except && user_value(u, field) == value))
    }

    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.db.tables.read().await.users.len())
    }
}

/// In-memory group or team repository
#[derive(Debug, Clone)]
pub struct InMemoryContainerRepository<K: StoredKind> {
    db: InMemoryDatabase,
    _kind: std::marker::PhantomData<K>,
}

#[async_trait]
impl<K: StoredKind> ContainerRepository<K> for InMemoryContainerRepository<K> {
    async fn get(&self, id: &ContainerId<K>) -> Result<Option<Container<K>>, DomainError> {
        let tables = self.db.tables.read().await;
        Ok(K::table(&tables).containers.get(id.as_str()).cloned())
    }

    async fn find(&self, reference: &str) -> Result<Option<Container<K>>, DomainError> {
        let tables = self.db.tables.read().await;
        Ok(K::table(&tables)
            .containers
            .values()
            .find(|c| c.is_referenced_by(reference))
            .cloned())
    }

    async fn list(&self, params: &ListParams) -> Result<Page<Container<K>>, DomainError> {
        let tables = self.db.tables.read().await;
        let sort: ContainerSort = params.sort_column();

        let matching: Vec<Container<K>> = K::table(&tables)
            .containers
            .values()
            .filter(|c| container_matches(params, c))
            .cloned()
            .collect();
        let total = matching.len();

        let sorted = ordered(matching, params.order, |a, b| {
            sort.compare(a, b).then_with(|| a.id().as_str().cmp(b.id().as_str()))
        });

        Ok(Page::new(params.paginate(sorted), total))
    }

    async fn create(
        &self,
        container: Container<K>,
        owner: Option<Membership<K>>,
    ) -> Result<Container<K>, DomainError> {
        let mut tables = self.db.tables.write().await;

        if let Some(owner) = &owner {
            if !tables.users.contains_key(owner.user_id().as_str()) {
                return Err(DomainError::subject_not_found(owner.user_id().as_str()));
            }
        }

        let table = K::table_mut(&mut tables);
        if table.containers.contains_key(container.id().as_str()) {
            return Err(DomainError::conflict(format!(
                "{} with ID '{}' already exists",
                K::NAME,
                container.id()
            )));
        }
        check_container_unique(table, &container)?;

        table
            .containers
            .insert(container.id().as_str().to_string(), container.clone());
        if let Some(owner) = owner {
            table.memberships.push(owner);
        }

        Ok(container)
    }

    async fn update(&self, container: &Container<K>) -> Result<Container<K>, DomainError> {
        let mut tables = self.db.tables.write().await;
        let table = K::table_mut(&mut tables);

        if !table.containers.contains_key(container.id().as_str()) {
            return Err(DomainError::container_not_found(
                K::NAME,
                container.id().as_str(),
            ));
        }
        check_container_unique(table, container)?;

        table
            .containers
            .insert(container.id().as_str().to_string(), container.clone());
        Ok(container.clone())
    }

    async fn delete(&self, id: &ContainerId<K>) -> Result<bool, DomainError> {
        let mut tables = self.db.tables.write().await;
        let table = K::table_mut(&mut tables);

        let removed = table.containers.remove(id.as_str()).is_some();
        table.memberships.retain(|m| m.container_id() != id);
        Ok(removed)
    }

    async fn is_taken(
        &self,
        field: ContainerField,
        value: &str,
        except: Option<&ContainerId<K>>,
    ) -> Result<bool, DomainError> {
        let tables = self.db.tables.read().await;
        Ok(K::table(&tables)
            .containers
            .values()
            .any(|c| Some(c.id()) != except && container_value(c, field) == value))
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let tables = self.db.tables.read().await;
        Ok(K::table(&tables).containers.len())
    }
}

/// In-memory membership repository for one container kind
#[derive(Debug, Clone)]
pub struct InMemoryMembershipRepository<K: StoredKind> {
    db: InMemoryDatabase,
    _kind: std::marker::PhantomData<K>,
}

#[async_trait]
impl<K: StoredKind> MembershipRepository<K> for InMemoryMembershipRepository<K> {
    async fn insert(&self, membership: Membership<K>) -> Result<Membership<K>, DomainError> {
        let mut tables = self.db.tables.write().await;

        if !tables.users.contains_key(membership.user_id().as_str()) {
            return Err(DomainError::subject_not_found(membership.user_id().as_str()));
        }

        let table = K::table_mut(&mut tables);
        if !table
            .containers
            .contains_key(membership.container_id().as_str())
        {
            return Err(DomainError::container_not_found(
                K::NAME,
                membership.container_id().as_str(),
            ));
        }

        let exists = table
            .memberships
            .iter()
            .any(|m| m.is_pair(membership.user_id(), membership.container_id()));
        if exists {
            return Err(DomainError::already_assigned(K::NAME));
        }

        table.memberships.push(membership.clone());
        Ok(membership)
    }

    async fn update_permission(
        &self,
        user_id: &UserId,
        container_id: &ContainerId<K>,
        perm: Permission,
    ) -> Result<Membership<K>, DomainError> {
        let mut tables = self.db.tables.write().await;

        let membership = K::table_mut(&mut tables)
            .memberships
            .iter_mut()
            .find(|m| m.is_pair(user_id, container_id))
            .ok_or_else(|| DomainError::not_assigned(K::NAME))?;

        membership.set_perm(perm);
        Ok(membership.clone())
    }

    async fn delete(
        &self,
        user_id: &UserId,
        container_id: &ContainerId<K>,
    ) -> Result<(), DomainError> {
        let mut tables = self.db.tables.write().await;
        let memberships = &mut K::table_mut(&mut tables).memberships;

        let position = memberships
            .iter()
            .position(|m| m.is_pair(user_id, container_id))
            .ok_or_else(|| DomainError::not_assigned(K::NAME))?;

        memberships.remove(position);
        Ok(())
    }

    async fn find_by_pair(
        &self,
        user_id: &UserId,
        container_id: &ContainerId<K>,
    ) -> Result<Option<Membership<K>>, DomainError> {
        let tables = self.db.tables.read().await;
        Ok(K::table(&tables)
            .memberships
            .iter()
            .find(|m| m.is_pair(user_id, container_id))
            .cloned())
    }

    async fn list_by_container(
        &self,
        container_id: &ContainerId<K>,
        params: &ListParams,
    ) -> Result<Page<Member<K>>, DomainError> {
        let tables = self.db.tables.read().await;
        let table = K::table(&tables);
        let sort: UserSort = params.sort_column();

        let Some(container) = table.containers.get(container_id.as_str()) else {
            return Ok(Page::new(Vec::new(), 0));
        };

        let matching: Vec<Member<K>> = table
            .memberships
            .iter()
            .filter(|m| m.container_id() == container_id)
            .filter_map(|m| {
                tables.users.get(m.user_id().as_str()).map(|user| Member {
                    membership: m.clone(),
                    user: user.clone(),
                    container: container.clone(),
                })
            })
            .filter(|member| user_matches(params, &member.user))
            .collect();
        let total = matching.len();

        let sorted = ordered(matching, params.order, |a, b| {
            sort.compare(&a.user, &b.user)
                .then_with(|| a.user.id().as_str().cmp(b.user.id().as_str()))
        });

        Ok(Page::new(params.paginate(sorted), total))
    }

    async fn list_by_user(
        &self,
        user_id: &UserId,
        params: &ListParams,
    ) -> Result<Page<Member<K>>, DomainError> {
        let tables = self.db.tables.read().await;
        let table = K::table(&tables);
        let sort: ContainerSort = params.sort_column();

        let Some(user) = tables.users.get(user_id.as_str()) else {
            return Ok(Page::new(Vec::new(), 0));
        };

        let matching: Vec<Member<K>> = table
            .memberships
            .iter()
            .filter(|m| m.user_id() == user_id)
            .filter_map(|m| {
                table
                    .containers
                    .get(m.container_id().as_str())
                    .map(|container| Member {
                        membership: m.clone(),
                        user: user.clone(),
                        container: container.clone(),
                    })
            })
            .filter(|member| container_matches(params, &member.container))
            .collect();
        let total = matching.len();

        let sorted = ordered(matching, params.order, |a, b| {
            sort.compare(&a.container, &b.container)
                .then_with(|| a.container.id().as_str().cmp(b.container.id().as_str()))
        });

        Ok(Page::new(params.paginate(sorted), total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::container::{Group, Team};
    use crate::domain::ErrorKind;

    fn user(name: &str) -> User {
        User::new(name, format!("{}@example.com", name), "hash")
    }

    async fn seed() -> (InMemoryDatabase, User, Group) {
        let db = InMemoryDatabase::new();
        let user = db.users().create(user("jdoe")).await.unwrap();
        let group = db
            .containers::<GroupKind>()
            .create(Group::new("Platform"), None)
            .await
            .unwrap();
        (db, user, group)
    }

    #[tokio::test]
    async fn test_user_uniqueness_is_validation_shaped() {
        let db = InMemoryDatabase::new();
        let users = db.users();

        users.create(user("jdoe")).await.unwrap();
        let err = users
            .create(User::new("jdoe", "other@example.com", "hash"))
            .await
            .unwrap_err();

        match err {
            DomainError::Validation(errors) => assert!(errors.has_field("username")),
            other => panic!("unexpected error: {other:?}"),
        }

        let err = users
            .create(User::new("jane", "jdoe@example.com", "hash"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_find_by_reference() {
        let (db, user, group) = seed().await;

        let by_slug = db.users().find("jdoe").await.unwrap().unwrap();
        assert_eq!(by_slug.id(), user.id());

        let by_id = db
            .containers::<GroupKind>()
            .find(group.id().as_str())
            .await
            .unwrap();
        assert!(by_id.is_some());
        assert!(db.containers::<GroupKind>().find("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_already_assigned() {
        let (db, user, group) = seed().await;
        let members = db.memberships::<GroupKind>();

        members
            .insert(Membership::new(user.id().clone(), group.id().clone(), Permission::User))
            .await
            .unwrap();
        let err = members
            .insert(Membership::new(user.id().clone(), group.id().clone(), Permission::Owner))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::AlreadyAssigned { kind: "group" }));
    }

    #[tokio::test]
    async fn test_groups_and_teams_are_separate() {
        let (db, user, group) = seed().await;

        db.memberships::<GroupKind>()
            .insert(Membership::new(user.id().clone(), group.id().clone(), Permission::User))
            .await
            .unwrap();

        let teams = db.memberships::<TeamKind>();
        let team_id = ContainerId::<TeamKind>::new(group.id().as_str()).unwrap();
        let err = teams
            .insert(Membership::new(user.id().clone(), team_id, Permission::User))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ContainerNotFound { kind: "team", .. }));
    }

    #[tokio::test]
    async fn test_update_and_delete_require_membership() {
        let (db, user, group) = seed().await;
        let members = db.memberships::<GroupKind>();

        let err = members
            .update_permission(user.id(), group.id(), Permission::Admin)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);

        let err = members.delete(user.id(), group.id()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
    }

    #[tokio::test]
    async fn test_deleting_user_cascades_memberships() {
        let (db, user, group) = seed().await;
        let team = db
            .containers::<TeamKind>()
            .create(Team::new("Backend"), None)
            .await
            .unwrap();

        db.memberships::<GroupKind>()
            .insert(Membership::new(user.id().clone(), group.id().clone(), Permission::User))
            .await
            .unwrap();
        db.memberships::<TeamKind>()
            .insert(Membership::new(user.id().clone(), team.id().clone(), Permission::User))
            .await
            .unwrap();

        assert!(db.users().delete(user.id()).await.unwrap());

        let page = db
            .memberships::<GroupKind>()
            .list_by_container(group.id(), &ListParams::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);
        assert!(db
            .memberships::<TeamKind>()
            .find_by_pair(user.id(), team.id())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_deleting_container_cascades_memberships() {
        let (db, user, group) = seed().await;

        db.memberships::<GroupKind>()
            .insert(Membership::new(user.id().clone(), group.id().clone(), Permission::User))
            .await
            .unwrap();
        assert!(db.containers::<GroupKind>().delete(group.id()).await.unwrap());

        let page = db
            .memberships::<GroupKind>()
            .list_by_user(user.id(), &ListParams::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_create_with_owner() {
        let db = InMemoryDatabase::new();
        let owner = db.users().create(user("owner")).await.unwrap();
        let group = Group::new("Platform");

        let membership = Membership::new(owner.id().clone(), group.id().clone(), Permission::Owner);
        let group = db
            .containers::<GroupKind>()
            .create(group, Some(membership))
            .await
            .unwrap();

        let found = db
            .memberships::<GroupKind>()
            .find_by_pair(owner.id(), group.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.perm(), Permission::Owner);
    }

    #[tokio::test]
    async fn test_list_members_search_sort_paginate() {
        let (db, _, group) = seed().await;
        let members = db.memberships::<GroupKind>();

        for name in ["carol", "alice", "bob"] {
            let u = db.users().create(user(name)).await.unwrap();
            members
                .insert(Membership::new(u.id().clone(), group.id().clone(), Permission::User))
                .await
                .unwrap();
        }

        let page = members
            .list_by_container(group.id(), &ListParams::default())
            .await
            .unwrap();
        let names: Vec<_> = page.records.iter().map(|m| m.user.username()).collect();
        assert_eq!(page.total, 3);
        assert_eq!(names, vec!["alice", "bob", "carol"]);

        let params = ListParams::default()
            .with_sort("username", SortOrder::Desc)
            .with_page(1, 1);
        let page = members.list_by_container(group.id(), &params).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].user.username(), "bob");

        let params = ListParams::default().with_search("ALI");
        let page = members.list_by_container(group.id(), &params).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.records[0].user.username(), "alice");
    }
}
