use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Timeout error")]
    Timeout,

    #[error("Communication error: {0}")]
    Network(String),

    #[error("Communication error: {0} is not valid")]
    Status(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Access token is not a valid header value")]
    InvalidToken,
}

/// Maximum length for response bodies quoted in error messages
const MAX_ERROR_BODY_LENGTH: usize = 200;

impl ApiError {
    /// True for the failures a poller is expected to ride out between
    /// refreshes: timeouts, transport errors and unexpected status codes.
    pub fn is_communication(&self) -> bool {
        matches!(
            self,
            ApiError::Timeout | ApiError::Network(_) | ApiError::Status(_)
        )
    }

    pub fn from_status(status: reqwest::StatusCode) -> Self {
        ApiError::Status(status.as_u16())
    }

    /// Build an `InvalidResponse`, quoting at most the start of the body.
    pub fn invalid_body(reason: impl std::fmt::Display, body: &str) -> Self {
        let quoted: String = body.chars().take(MAX_ERROR_BODY_LENGTH).collect();
        if quoted.len() < body.len() {
            ApiError::InvalidResponse(format!(
                "{} (body: {}... {} total bytes)",
                reason,
                quoted,
                body.len()
            ))
        } else {
            ApiError::InvalidResponse(format!("{} (body: {})", reason, quoted))
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if let Some(status) = err.status() {
            ApiError::Status(status.as_u16())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}
