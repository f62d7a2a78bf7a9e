//! Credential lifecycle management.
//!
//! This module provides:
//! - `TokenStore`: durable storage for the access/refresh token pair
//! - `claims`: fail-closed JWT expiry checks
//! - `RefreshCoordinator`: single-flight access-token renewal
//! - `SessionTerminator`: session teardown with a re-authentication signal
//!
//! Access tokens are short-lived (~30 minutes); the refresh token mints
//! new ones until it expires itself (~7 days), at which point the session
//! is terminated and the application must log in again.

pub mod claims;
pub mod error;
pub mod refresh;
pub mod session;
pub mod store;

pub use error::{AuthError, StoreError};
pub use refresh::RefreshCoordinator;
pub use session::{SessionTerminator, UnauthenticatedHook};
pub use store::TokenStore;
