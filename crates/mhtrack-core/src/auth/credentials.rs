use std::fmt;

/// Login details for the Matkahuolto web service.
///
/// The language code is not used for login; it selects the language of the
/// event descriptions returned by the shipments endpoint.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
    language: String,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            language: language.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("language", &self.language)
            .finish()
    }
}
