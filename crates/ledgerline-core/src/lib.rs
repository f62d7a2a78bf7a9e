//! Core library for ledgerline, a budget-tracker client.
//!
//! The interesting part lives in [`auth`]: a credential lifecycle manager
//! that holds a short-lived access token and a long-lived refresh token,
//! renews the access token transparently (serializing concurrent renewals
//! into a single network call), and tears the session down when renewal
//! is no longer possible. [`api`] wraps the server's REST endpoints around
//! that lifecycle; [`models`] and [`config`] are the supporting cast.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthError, RefreshCoordinator, SessionTerminator, TokenStore, UnauthenticatedHook};
pub use config::Config;
