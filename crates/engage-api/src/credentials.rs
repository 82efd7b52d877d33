// Credential tuples for the two authentication flows.
//
// Pure data, no behavior. Each provider owns its credentials; replacing
// them invalidates that provider's cached token or session only.

use secrecy::SecretString;

/// Credentials for the OAuth `refresh_token` grant (REST surface).
#[derive(Debug, Clone)]
pub struct OauthCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
    pub refresh_token: SecretString,
}

impl OauthCredentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::from(client_secret.into()),
            refresh_token: SecretString::from(refresh_token.into()),
        }
    }
}

/// Username/password pair for the legacy XML login.
#[derive(Debug, Clone)]
pub struct SessionCredentials {
    pub username: String,
    pub password: SecretString,
}

impl SessionCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}
