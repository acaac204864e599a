use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// Tokens returned in the `AuthenticationResult` object of a login response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct AuthTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Token lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    #[serde(rename = "AuthenticationResult")]
    pub authentication_result: AuthTokens,
}

/// Buffer before the advertised expiry at which a token is treated as spent.
const TOKEN_EXPIRY_BUFFER_SECS: i64 = 30;

/// Current login state of an `ApiClient`. Replaced wholesale on every login.
#[derive(Debug, Default)]
pub(crate) struct Session {
    data: Option<SessionData>,
}

#[derive(Debug)]
struct SessionData {
    tokens: AuthTokens,
    obtained_at: DateTime<Utc>,
}

impl SessionData {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.tokens.expires_in {
            Some(secs) => {
                let expiry = self.obtained_at + Duration::seconds(secs - TOKEN_EXPIRY_BUFFER_SECS);
                now >= expiry
            }
            // Without a lifetime we only learn about expiry from a 401
            None => false,
        }
    }
}

impl Session {
    pub fn update(&mut self, tokens: AuthTokens) {
        self.update_at(tokens, Utc::now());
    }

    fn update_at(&mut self, tokens: AuthTokens, obtained_at: DateTime<Utc>) {
        self.data = Some(SessionData {
            tokens,
            obtained_at,
        });
    }

    pub fn access_token(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.tokens.access_token.as_str())
    }

    /// Whether a login is required before the next request.
    pub fn needs_login(&self) -> bool {
        self.needs_login_at(Utc::now())
    }

    fn needs_login_at(&self, now: DateTime<Utc>) -> bool {
        self.data.as_ref().map(|d| d.is_expired(now)).unwrap_or(true)
    }
}
