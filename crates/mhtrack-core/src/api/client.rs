//! API client for the Matkahuolto web service.
//!
//! `ApiClient` logs in with the configured credentials and fetches the
//! user's shipment list. An expired token is renewed transparently: a 401
//! from the shipments endpoint triggers one login and one retried request.

use std::time::Duration;

use reqwest::{header, Client, StatusCode};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::auth::session::{AuthResponse, Session};
use crate::auth::Credentials;
use crate::models::ShipmentsResponse;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL of the Matkahuolto web service
pub const DEFAULT_BASE_URL: &str = "https://wwwservice.matkahuolto.fi";

/// Shipments endpoint; the language code is appended to it
pub const DEFAULT_SHIPMENTS_PATH: &str = "/user/shipments/";

/// User agent sent with login requests
pub const DEFAULT_USER_AGENT: &str = concat!("mhtrack/", env!("CARGO_PKG_VERSION"));

/// HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;

/// Logins allowed per fetch after the provider rejects the token.
const MAX_REAUTH_ATTEMPTS: u32 = 1;

/// Endpoint settings. Everything here is fixed for the lifetime of a client.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub shipments_path: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            shipments_path: DEFAULT_SHIPMENTS_PATH.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

#[derive(Serialize)]
struct AuthRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// API client for the Matkahuolto web service.
pub struct ApiClient {
    client: Client,
    settings: ClientSettings,
    credentials: Credentials,
    session: Session,
}

impl ApiClient {
    /// Create a new API client. No request is made until the first call.
    pub fn new(credentials: Credentials, settings: ClientSettings) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(settings.timeout).build()?;

        Ok(Self {
            client,
            settings,
            credentials,
            session: Session::default(),
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Log in and store the returned access token.
    pub async fn authenticate(&mut self) -> Result<(), ApiError> {
        let url = format!("{}/user/auth", self.settings.base_url.trim_end_matches('/'));
        debug!(username = self.credentials.username(), "Authenticating");

        let body = AuthRequest {
            username: self.credentials.username(),
            password: self.credentials.password(),
        };

        let response = self
            .client
            .post(&url)
            .header(header::USER_AGENT, self.settings.user_agent.as_str())
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(status = status.as_u16(), "Authentication rejected");
            return Err(ApiError::from_status(status));
        }

        let text = response.text().await?;
        let auth: AuthResponse = serde_json::from_str(&text)
            .map_err(|e| ApiError::invalid_body(format!("failed to parse auth response: {}", e), &text))?;

        let tokens = auth.authentication_result;
        info!(
            username = self.credentials.username(),
            token_type = tokens.token_type.as_deref().unwrap_or("unknown"),
            expires_in = ?tokens.expires_in,
            has_refresh_token = tokens.refresh_token.is_some(),
            "Authenticated"
        );
        self.session.update(tokens);
        Ok(())
    }

    fn shipments_url(&self) -> String {
        format!(
            "{}{}{}",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.shipments_path,
            self.credentials.language()
        )
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = self.session.access_token() {
            // The provider expects the bare token, without a "Bearer" scheme
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(token).map_err(|_| ApiError::InvalidToken)?,
            );
        }
        Ok(headers)
    }

    /// Fetch the shipment list, logging in again once if the token is rejected.
    pub async fn fetch_shipments(&mut self) -> Result<ShipmentsResponse, ApiError> {
        if self.session.needs_login() {
            debug!("No valid token, logging in before fetch");
            self.authenticate().await?;
        }

        let url = self.shipments_url();
        let mut reauth_attempts = 0;

        loop {
            let response = self
                .client
                .get(&url)
                .headers(self.auth_headers()?)
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED && reauth_attempts < MAX_REAUTH_ATTEMPTS {
                reauth_attempts += 1;
                info!(attempt = reauth_attempts, "Token rejected, re-authenticating");
                self.authenticate().await?;
                continue;
            }
            if status != StatusCode::OK {
                warn!(status = status.as_u16(), url = %url, "Shipment fetch failed");
                return Err(ApiError::from_status(status));
            }

            let text = response.text().await?;
            if text.trim().is_empty() {
                debug!("Empty shipments body");
                return Ok(ShipmentsResponse::default());
            }

            let parsed: ShipmentsResponse = serde_json::from_str(&text).map_err(|e| {
                ApiError::invalid_body(format!("failed to parse shipments response: {}", e), &text)
            })?;
            debug!(count = parsed.shipments.len(), "Shipments fetched");
            return Ok(parsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with(settings: ClientSettings) -> ApiClient {
        ApiClient::new(Credentials::new("user", "pw", "sv"), settings).expect("client builds")
    }

    #[test]
    fn test_shipments_url_appends_language() {
        let client = client_with(ClientSettings {
            base_url: "https://example.test/".to_string(),
            ..ClientSettings::default()
        });
        assert_eq!(client.shipments_url(), "https://example.test/user/shipments/sv");
    }

    #[test]
    fn test_no_authorization_header_before_login() {
        let client = client_with(ClientSettings::default());
        let headers = client.auth_headers().expect("headers build");
        assert!(headers.get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_default_settings() {
        let settings = ClientSettings::default();
        assert_eq!(settings.timeout, Duration::from_secs(20));
        assert!(settings.user_agent.starts_with("mhtrack/"));
    }
}
