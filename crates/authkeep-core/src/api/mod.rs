//! Identity provider API module.
//!
//! This module provides the `IdentityEndpoint` trait that SessionManager
//! talks to, and `IdentityClient`, its HTTP implementation for a Google
//! Identity Toolkit compatible service.
//!
//! The API exchanges an email and password for a bearer token with a
//! validity window in seconds.

pub mod client;
pub mod endpoint;
pub mod error;

pub use client::IdentityClient;
pub use endpoint::{AuthGrant, IdentityEndpoint};
pub use error::ApiError;
