//! REST API client module for the budget-tracker server.
//!
//! This module provides the `ApiClient` for the authentication and
//! transaction endpoints. The API uses JWT bearer authentication with a
//! short-lived access token that the client renews transparently through
//! the refresh endpoint.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
