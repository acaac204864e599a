//! Authentication state for the Matkahuolto web service.
//!
//! This module provides:
//! - `Credentials`: username, password and language code, fixed at startup
//! - `Session`: the access token from the last login, with expiry tracking
//!
//! Tokens never leave the `ApiClient`; callers only see its fetch results.

pub mod credentials;
pub(crate) mod session;

pub use credentials::Credentials;
