//! Application state for shared services

use std::sync::Arc;

use crate::domain::{ContainerKind, GroupKind, TeamKind};
use crate::infrastructure::auth::TokenService;
use crate::infrastructure::container::ContainerService;
use crate::infrastructure::membership::MembershipService;
use crate::infrastructure::observability::PrometheusMetrics;
use crate::infrastructure::storage::Repositories;
use crate::infrastructure::user::{PasswordHasher, UserService};

/// Services shared by every request handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub users: UserService,
    pub groups: ContainerService<GroupKind>,
    pub teams: ContainerService<TeamKind>,
    pub group_members: MembershipService<GroupKind>,
    pub team_members: MembershipService<TeamKind>,
    pub tokens: Arc<TokenService>,
    pub metrics: Option<PrometheusMetrics>,
}

impl AppState {
    pub fn new(
        repositories: Repositories,
        hasher: Arc<dyn PasswordHasher>,
        tokens: TokenService,
    ) -> Self {
        let Repositories {
            users,
            groups,
            teams,
            group_members,
            team_members,
        } = repositories;

        Self {
            users: UserService::new(Arc::clone(&users), hasher),
            groups: ContainerService::new(Arc::clone(&groups)),
            teams: ContainerService::new(Arc::clone(&teams)),
            group_members: MembershipService::new(Arc::clone(&users), groups, group_members),
            team_members: MembershipService::new(users, teams, team_members),
            tokens: Arc::new(tokens),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Option<PrometheusMetrics>) -> Self {
        self.metrics = metrics;
        self
    }
}

/// Picks the services of one container kind out of the state
pub trait KindServices: ContainerKind {
    fn containers(state: &AppState) -> &ContainerService<Self>;
    fn members(state: &AppState) -> &MembershipService<Self>;
}

impl KindServices for GroupKind {
    fn containers(state: &AppState) -> &ContainerService<Self> {
        &state.groups
    }

    fn members(state: &AppState) -> &MembershipService<Self> {
        &state.group_members
    }
}

impl KindServices for TeamKind {
    fn containers(state: &AppState) -> &ContainerService<Self> {
        &state.teams
    }

    fn members(state: &AppState) -> &MembershipService<Self> {
        &state.team_members
    }
}
