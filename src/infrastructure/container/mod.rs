//! Container infrastructure module

mod service;

pub use service::{ContainerService, CreateContainerRequest, UpdateContainerRequest};
