//! Membership infrastructure module

mod service;

pub use service::MembershipService;
