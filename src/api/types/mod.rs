//! Request and response payloads of the identity API

pub mod auth;
pub mod containers;
pub mod error;
pub mod json;
pub mod list;
pub mod members;
pub mod users;

pub use auth::{LoginBody, VerifyResponse};
pub use containers::{ContainerResponse, CreateContainerBody, UpdateContainerBody};
pub use error::{ApiError, Notification};
pub use json::Json;
pub use list::{ListQuery, ListResponse};
pub use members::{ContainerMemberBody, MemberResponse, UserMemberBody};
pub use users::{
    gravatar_url, CreateUserBody, UpdateProfileBody, UpdateUserBody, UserResponse,
};
