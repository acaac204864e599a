//! REST API client module for the Matkahuolto web service.
//!
//! This module provides the `ApiClient` for logging in and fetching the
//! user's shipments. The service authenticates with an access token that
//! is sent as the raw `Authorization` header value.

pub mod client;
pub mod error;

pub use client::{
    ApiClient, ClientSettings, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_SHIPMENTS_PATH, DEFAULT_USER_AGENT,
};
pub use error::ApiError;
