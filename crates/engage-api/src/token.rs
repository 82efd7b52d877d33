// OAuth access-token acquisition and proactive refresh.
//
// The token cache lives behind an async mutex: at most one exchange is in
// flight for a provider, and a call waiting on it never observes a
// half-replaced token.

use chrono::{DateTime, TimeDelta, Utc};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;
use url::Url;

use crate::credentials::OauthCredentials;
use crate::error::Error;

/// Slack before `expires_at` at which a token counts as hard-expired,
/// allowing for communication delay.
const EXPIRY_BUFFER_SECS: i64 = 5;

/// Tokens within this window of expiry are re-exchanged pre-emptively on the
/// next [`TokenProvider::access_token`] call.
const REFRESH_WINDOW_SECS: i64 = 600;

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_LIFETIME_SECS: i64 = 14_400;

/// OAuth bearer credential with a server-declared lifetime.
///
/// `expires_at == None` means the token never expires (seeded/manual tokens).
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Hard-expiry check with a 5-second buffer.
    pub fn is_expired(&self) -> bool {
        self.expires_within(EXPIRY_BUFFER_SECS)
    }

    fn needs_refresh(&self) -> bool {
        self.expires_within(REFRESH_WINDOW_SECS)
    }

    fn expires_within(&self, buffer_secs: i64) -> bool {
        self.expires_at
            .is_some_and(|exp| Utc::now() + TimeDelta::seconds(buffer_secs) >= exp)
    }
}

/// Shape of the token endpoint's JSON reply. Everything is optional so a
/// server error body still parses and can be reported verbatim.
#[derive(Debug, Default, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Default)]
struct TokenState {
    credentials: Option<OauthCredentials>,
    token: Option<AccessToken>,
}

/// Owns the OAuth `refresh_token` grant exchange and the cached access token
/// for the REST surface.
pub struct TokenProvider {
    http: reqwest::Client,
    token_url: Url,
    state: Mutex<TokenState>,
}

impl TokenProvider {
    /// Create a provider for `{base_url}/oauth/token` with no credentials.
    ///
    /// Seed a token with [`set_access_token`](Self::set_access_token) or
    /// supply credentials with [`set_credentials`](Self::set_credentials)
    /// before the first [`access_token`](Self::access_token) call.
    pub fn new(http: reqwest::Client, base_url: &Url) -> Result<Self, Error> {
        let token_url = base_url.join("oauth/token").map_err(Error::InvalidUrl)?;
        Ok(Self {
            http,
            token_url,
            state: Mutex::new(TokenState::default()),
        })
    }

    /// Create a provider that will exchange the given credentials on demand.
    pub fn with_credentials(
        http: reqwest::Client,
        base_url: &Url,
        credentials: OauthCredentials,
    ) -> Result<Self, Error> {
        let token_url = base_url.join("oauth/token").map_err(Error::InvalidUrl)?;
        Ok(Self {
            http,
            token_url,
            state: Mutex::new(TokenState {
                credentials: Some(credentials),
                token: None,
            }),
        })
    }

    /// Supply credentials without authenticating. Any cached token is
    /// dropped: new credentials invalidate the old token's provenance.
    pub async fn set_credentials(&self, credentials: OauthCredentials) {
        let mut state = self.state.lock().await;
        state.credentials = Some(credentials);
        state.token = None;
    }

    /// Seed a pre-existing token, bypassing the exchange. Pass
    /// `expires_at = None` for a token that never expires.
    ///
    /// Supply credentials *before* seeding when a later forced refresh
    /// should succeed — [`set_credentials`](Self::set_credentials) drops any
    /// cached token.
    pub async fn set_access_token(&self, value: impl Into<String>, expires_at: Option<DateTime<Utc>>) {
        let mut state = self.state.lock().await;
        state.token = Some(AccessToken {
            value: value.into(),
            expires_at,
        });
    }

    /// Drop the cached token; the next call re-exchanges.
    pub async fn invalidate(&self) {
        self.state.lock().await.token = None;
    }

    /// The cached token when it is present and not hard-expired. Never
    /// touches the network — this is the facade's availability probe and the
    /// XML client's bearer lookup.
    pub async fn live_token(&self) -> Option<String> {
        let state = self.state.lock().await;
        state
            .token
            .as_ref()
            .filter(|token| !token.is_expired())
            .map(|token| token.value.clone())
    }

    /// A bearer token for the next request: the cached value unless it is
    /// inside the refresh window, otherwise a fresh `refresh_token` grant
    /// exchange. Fails with [`Error::Authentication`] when credentials are
    /// missing or the exchange fails — a stale token is never returned.
    pub async fn access_token(&self) -> Result<String, Error> {
        let mut state = self.state.lock().await;
        if let Some(token) = &state.token {
            if !token.needs_refresh() {
                return Ok(token.value.clone());
            }
        }

        let Some(credentials) = state.credentials.clone() else {
            return Err(Error::Authentication {
                message: "no OAuth credentials configured".to_owned(),
            });
        };

        let token = self.exchange(&credentials).await?;
        let value = token.value.clone();
        state.token = Some(token);
        Ok(value)
    }

    async fn exchange(&self, credentials: &OauthCredentials) -> Result<AccessToken, Error> {
        debug!("exchanging refresh token at {}", self.token_url);

        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.expose_secret()),
            ("refresh_token", credentials.refresh_token.expose_secret()),
        ];

        let resp = self
            .http
            .post(self.token_url.clone())
            .form(&params)
            .send()
            .await
            .map_err(Error::Transport)?;

        let body = resp.text().await.map_err(Error::Transport)?;
        let parsed: TokenResponse = serde_json::from_str(&body).unwrap_or_default();

        let Some(value) = parsed.access_token.filter(|v| !v.is_empty()) else {
            return Err(Error::Authentication {
                message: parsed.error_description.unwrap_or(body),
            });
        };

        let lifetime = parsed.expires_in.unwrap_or(DEFAULT_LIFETIME_SECS);
        debug!("access token refreshed, expires in {lifetime}s");

        Ok(AccessToken {
            value,
            expires_at: Some(Utc::now() + TimeDelta::seconds(lifetime)),
        })
    }
}
