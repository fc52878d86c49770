//! Container domain
//!
//! Groups and teams share one entity and repository contract, told apart
//! by a [`ContainerKind`] marker type.

mod entity;
mod kind;
mod repository;
mod validation;

pub use entity::{Container, ContainerId, Group, Team};
pub use kind::{ContainerKind, GroupKind, TeamKind};
pub use repository::{ContainerField, ContainerRepository, ContainerSort};
pub use validation::{validate_name, validate_slug, ContainerValidationError};
