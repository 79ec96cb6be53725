//! authkeep core - a client-side session keeper for password-based identity
//! providers.
//!
//! `SessionManager` signs in (or signs up) against an `IdentityEndpoint`,
//! persists the resulting session to a `KeyValueStore`, publishes it through
//! a watch channel and logs out on its own when the token expires.

pub mod api;
pub mod auth;
pub mod config;
pub mod navigator;
pub mod store;
pub mod time;

pub use api::{ApiError, AuthGrant, IdentityClient, IdentityEndpoint};
pub use auth::{AuthError, Session, SessionManager, SESSION_KEY};
pub use config::Config;
pub use navigator::{Navigator, NoopNavigator, LOGIN_ROUTE};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use time::{Clock, Scheduler, SystemClock, TimerHandle, TokioScheduler};
