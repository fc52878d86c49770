//! Authentication infrastructure module
//!
//! This module provides signed bearer tokens for user authentication.

mod token;

pub use token::{Claims, IssuedToken, TokenError, TokenKind, TokenService};
