//! Membership domain

mod entity;
mod repository;

pub use entity::{Member, Membership};
pub use repository::MembershipRepository;
