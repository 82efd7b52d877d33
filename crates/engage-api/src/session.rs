// Legacy XML session management.
//
// Login is expensive and server-session-limited, so a session id is acquired
// once and reused until the server rejects it (fault code 145). The server
// gives no expiry hint; expiry is only ever discovered by a failed call, so
// there is no client-side expiry tracking to do.

use secrecy::ExposeSecret;
use tokio::sync::Mutex;
use tracing::debug;
use url::Url;

use crate::credentials::SessionCredentials;
use crate::error::Error;
use crate::xml::envelope::{ResponseEnvelope, wrap_request};
use crate::xml::writer::XmlBuilder;

#[derive(Default)]
struct SessionState {
    credentials: Option<SessionCredentials>,
    session_id: Option<String>,
}

/// Owns XML session-id acquisition and reactive re-authentication.
///
/// State lives behind an async mutex so one login resolves before any
/// dependent call proceeds, and a session id is replaced as a unit.
pub struct SessionProvider {
    http: reqwest::Client,
    endpoint: Url,
    state: Mutex<SessionState>,
}

impl SessionProvider {
    /// Create a provider for `{base_url}/XMLAPI` with no credentials.
    pub fn new(http: reqwest::Client, base_url: &Url) -> Result<Self, Error> {
        let endpoint = base_url.join("XMLAPI").map_err(Error::InvalidUrl)?;
        Ok(Self {
            http,
            endpoint,
            state: Mutex::new(SessionState::default()),
        })
    }

    /// Supply login credentials without authenticating. Any cached session
    /// is dropped.
    pub async fn set_credentials(&self, credentials: SessionCredentials) {
        let mut state = self.state.lock().await;
        state.credentials = Some(credentials);
        state.session_id = None;
    }

    /// Seed a pre-existing, unexpired session id to avoid re-authenticating.
    pub async fn set_session_id(&self, session_id: impl Into<String>) {
        self.state.lock().await.session_id = Some(session_id.into());
    }

    /// The cached session id, if any. Never authenticates.
    pub async fn session_id(&self) -> Option<String> {
        self.state.lock().await.session_id.clone()
    }

    /// Drop the cached session id. Used by the expiry-retry path and on
    /// explicit logout.
    pub async fn invalidate(&self) {
        self.state.lock().await.session_id = None;
    }

    /// The cached session id, or the result of logging in with the stored
    /// credentials. Fails with [`Error::Authentication`] when no session
    /// exists and no credentials are configured.
    pub async fn ensure_session(&self) -> Result<String, Error> {
        let mut state = self.state.lock().await;
        if let Some(id) = &state.session_id {
            return Ok(id.clone());
        }

        let Some(credentials) = state.credentials.clone() else {
            return Err(Error::Authentication {
                message: "no session and no XML credentials configured".to_owned(),
            });
        };

        let id = self.login(&credentials).await?;
        state.session_id = Some(id.clone());
        Ok(id)
    }

    /// End the current session. A no-op when no session is active; the
    /// cached id is cleared even when the logout request itself fails.
    pub async fn logout(&self) {
        let mut state = self.state.lock().await;
        let Some(session_id) = state.session_id.take() else {
            return;
        };
        drop(state);

        debug!("logging out at {}", self.endpoint);
        let envelope = wrap_request("<Logout/>");
        let url = format!("{};jsessionid={session_id}", self.endpoint);
        let sent = self
            .http
            .post(url)
            .form(&[("xml", envelope.as_str())])
            .send()
            .await;

        // best effort: the session is gone locally either way
        match sent {
            Ok(resp) => {
                if let Ok(body) = resp.text().await {
                    if let Err(err) = ResponseEnvelope::parse(&body) {
                        debug!("logout response discarded: {err}");
                    }
                }
            }
            Err(err) => debug!("logout request failed: {err}"),
        }
    }

    async fn login(&self, credentials: &SessionCredentials) -> Result<String, Error> {
        debug!("logging in at {}", self.endpoint);

        let mut builder = XmlBuilder::new("Login");
        builder
            .text_element("USERNAME", &credentials.username)
            .text_element("PASSWORD", credentials.password.expose_secret());
        let envelope = wrap_request(&builder.finish());

        let resp = self
            .http
            .post(self.endpoint.clone())
            .form(&[("xml", envelope.as_str())])
            .send()
            .await
            .map_err(Error::Transport)?;

        let body = resp.text().await.map_err(Error::Transport)?;
        // a login fault is a failed credential exchange, not an API failure
        let validated = match ResponseEnvelope::parse(&body) {
            Ok(envelope) => envelope,
            Err(Error::Api { message, .. }) => {
                return Err(Error::Authentication { message });
            }
            Err(other) => return Err(other),
        };
        let session_id = validated.require_text("SESSIONID")?;

        debug!("login successful");
        Ok(session_id)
    }
}
