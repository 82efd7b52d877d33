// Legacy XML API client.
//
// Drives the per-call state machine: ensure a credential, wrap the action's
// XML in the envelope, POST it form-encoded as a single `xml` field,
// validate the response, and retry exactly once when the server reports the
// session id expired. OAuth can authenticate XML calls too — a live access
// token takes precedence over the session id at the transport level.

use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::credentials::SessionCredentials;
use crate::error::Error;
use crate::session::SessionProvider;
use crate::token::TokenProvider;
use crate::transport::TransportConfig;
use crate::xml::actions::lists::{ExportJob, ExportList, GetLists, Visibility};
use crate::xml::actions::XmlAction;
use crate::xml::dom::XmlNode;
use crate::xml::envelope::{ResponseEnvelope, SESSION_EXPIRED_CODE, wrap_request};

/// Client for the legacy `/XMLAPI` surface.
pub struct XmlClient {
    http: reqwest::Client,
    endpoint: Url,
    date_format: String,
    session: SessionProvider,
    tokens: Option<Arc<TokenProvider>>,
}

impl XmlClient {
    /// Create a client for `{base_url}/XMLAPI` from a `TransportConfig`.
    pub fn new(base_url: &Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let session = SessionProvider::new(http.clone(), base_url)?;
        let endpoint = base_url.join("XMLAPI").map_err(Error::InvalidUrl)?;
        Ok(Self {
            http,
            endpoint,
            date_format: transport.date_format.clone(),
            session,
            tokens: None,
        })
    }

    /// Share a token provider so a live OAuth token authenticates XML calls
    /// in place of the session id.
    pub fn with_token_provider(mut self, tokens: Arc<TokenProvider>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// The session provider, for seeding or inspecting the session id.
    pub fn session(&self) -> &SessionProvider {
        &self.session
    }

    /// Store credentials and log in immediately. A session id already in
    /// the cache is reused without a login round trip.
    pub async fn authenticate(&self, credentials: SessionCredentials) -> Result<(), Error> {
        if self.session.session_id().await.is_none() {
            self.session.set_credentials(credentials).await;
        }
        self.session.ensure_session().await?;
        Ok(())
    }

    /// Best-effort logout, freeing the server-side session slot.
    pub async fn logout(&self) {
        self.session.logout().await;
    }

    /// Execute one operation through the envelope state machine.
    ///
    /// When the server rejects the session id (fault code 145), the session
    /// is invalidated, re-authentication runs, and the send is retried
    /// exactly once. Any other failure — or a second expiry — propagates
    /// unmodified.
    pub async fn execute<A: XmlAction>(&self, action: &A) -> Result<A::Output, Error> {
        let envelope = wrap_request(&action.build_request());
        match self.send(&envelope).await {
            Ok(response) => action.parse_response(&response),
            Err(err) if err.api_error_code() == Some(SESSION_EXPIRED_CODE) => {
                debug!("session expired (code {SESSION_EXPIRED_CODE}); re-authenticating");
                self.session.invalidate().await;
                let response = self.send(&envelope).await?;
                action.parse_response(&response)
            }
            Err(err) => Err(err),
        }
    }

    /// Queue a list export, applying the configured transport date format.
    pub async fn export_list(&self, action: ExportList) -> Result<ExportJob, Error> {
        let action = action.list_date_format(self.date_format.clone());
        self.execute(&action).await
    }

    /// Lists visible to the account: the private and shared scopes are
    /// queried separately and merged, preserving scope order.
    pub async fn get_lists(&self, fields: &[(String, String)]) -> Result<Vec<XmlNode>, Error> {
        let mut lists = Vec::new();
        for visibility in [Visibility::Private, Visibility::Shared] {
            let mut action = GetLists::new(visibility);
            for (name, value) in fields {
                action = action.field(name.clone(), value.clone());
            }
            lists.extend(self.execute(&action).await?);
        }
        Ok(lists)
    }

    async fn send(&self, envelope: &str) -> Result<ResponseEnvelope, Error> {
        let bearer = match &self.tokens {
            Some(tokens) => tokens.live_token().await,
            None => None,
        };

        // Without OAuth, the session id rides as a URL matrix parameter.
        let url = if bearer.is_some() {
            self.endpoint.clone()
        } else {
            let session_id = self.session.ensure_session().await?;
            Url::parse(&format!("{};jsessionid={session_id}", self.endpoint))
                .map_err(Error::InvalidUrl)?
        };

        debug!("POST {url}");

        let mut request = self.http.post(url).form(&[("xml", envelope)]);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await.map_err(Error::Transport)?;
        let body = resp.text().await.map_err(Error::Transport)?;
        ResponseEnvelope::parse(&body)
    }
}
