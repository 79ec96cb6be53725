//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `Session`: the authenticated identity, bearer token and expiry instant
//! - `SessionManager`: login/signup, persistence, restore and timed logout
//! - `AuthError`: the fixed set of user-facing failure messages
//!
//! Sessions are persisted under the `userData` store key and end
//! automatically when the token's validity window elapses.

pub mod error;
pub mod manager;
pub mod session;

pub use error::AuthError;
pub use manager::SessionManager;
pub use session::{Session, SESSION_KEY};
