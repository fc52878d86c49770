//! Domain layer - Core business logic and entities

pub mod container;
pub mod error;
pub mod list;
pub mod membership;
pub mod permission;
pub mod slug;
pub mod user;
pub mod validation;

pub use container::{
    Container, ContainerField, ContainerId, ContainerKind, ContainerRepository, ContainerSort,
    Group, GroupKind, Team, TeamKind,
};
pub use error::{DomainError, ErrorKind};
pub use list::{ListParams, Page, SortKey, SortOrder};
pub use membership::{Member, Membership, MembershipRepository};
pub use permission::{Permission, PermissionError};
pub use user::{User, UserField, UserId, UserRepository, UserSort};
pub use validation::{FieldError, Validate, ValidationErrors};
