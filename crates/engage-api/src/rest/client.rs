// REST API client.
//
// Every call fetches a token from the provider immediately before sending
// (cheap — the provider caches) and attaches it as a Bearer header. A 401
// invalidates the cached token and the call is retried exactly once with a
// freshly exchanged token, mirroring the legacy session-expiry retry.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::connector::Operation;
use crate::error::Error;
use crate::token::TokenProvider;
use crate::transport::TransportConfig;

/// Event timestamps must carry milliseconds and a zone offset, e.g.
/// `2024-06-15T10:30:00.000+00:00`.
const EVENT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";

/// Attempts made against a data-subject job's fetch URL before giving the
/// caller the still-pending body.
const FETCH_POLL_ATTEMPTS: u32 = 6;

/// Client for the REST JSON surface.
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<TokenProvider>,
}

impl RestClient {
    /// Create a client rooted at `{base_url}/rest/` sharing the given token
    /// provider.
    pub fn new(
        base_url: &Url,
        transport: &TransportConfig,
        tokens: Arc<TokenProvider>,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url: base_url.clone(),
            tokens,
        })
    }

    /// The shared token provider.
    pub fn token_provider(&self) -> &Arc<TokenProvider> {
        &self.tokens
    }

    /// Whether this connector defines the given logical operation. The
    /// capability table is explicit; routing never probes method existence.
    pub fn supports(operation: Operation) -> bool {
        matches!(
            operation,
            Operation::CreateEvent | Operation::GdprAccess | Operation::GdprErasure
        )
    }

    /// Whether a call routed here could authenticate right now: a cached,
    /// unexpired access token exists. Never touches the network.
    pub async fn is_ready(&self) -> bool {
        self.tokens.live_token().await.is_some()
    }

    /// Build `{base}/rest/{resource}`.
    fn url(&self, resource: &str) -> Url {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/rest/{resource}")).expect("invalid REST resource URL")
    }

    /// POST a JSON body, with the single 401-invalidate-retry.
    pub async fn post<T: DeserializeOwned>(
        &self,
        resource: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        let resp = self.send_json(resource, body).await?;
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            debug!("401 from {resource}; invalidating token and retrying once");
            self.tokens.invalidate().await;
            let retry = self.send_json(resource, body).await?;
            return Self::handle_response(retry).await;
        }
        Self::handle_response(resp).await
    }

    async fn send_json(
        &self,
        resource: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<reqwest::Response, Error> {
        let token = self.tokens.access_token().await?;
        let url = self.url(resource);
        debug!("POST {url}");
        self.http
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)
    }

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            let preview = &body[..body.len().min(200)];
            return Err(Error::Api {
                message: format!("HTTP {status}: {preview}"),
                code: None,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            let preview = &body[..body.len().min(200)];
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    // ── Universal Behavior events ────────────────────────────────────

    /// Submit a Universal Behavior event.
    ///
    /// Preconditions are checked locally before any network call: the type
    /// code must be positive, the timestamp must match
    /// `YYYY-MM-DDThh:mm:ss.000±hh:mm`, and at least one attribute is
    /// required.
    pub async fn create_event(
        &self,
        type_code: i64,
        timestamp: &str,
        attributes: &[(String, String)],
    ) -> Result<Value, Error> {
        if type_code <= 0 {
            return Err(Error::Validation {
                message: format!("event type code '{type_code}' is not a positive number"),
            });
        }
        if chrono::DateTime::parse_from_str(timestamp, EVENT_TIMESTAMP_FORMAT).is_err() {
            return Err(Error::Validation {
                message: format!(
                    "timestamp '{timestamp}' does not match the required format \
                     YYYY-MM-DDThh:mm:ss.000±hh:mm"
                ),
            });
        }
        if attributes.is_empty() {
            return Err(Error::Validation {
                message: "event attributes must not be empty".to_owned(),
            });
        }

        let attributes: Vec<Value> = attributes
            .iter()
            .map(|(name, value)| json!({ "name": name, "value": value }))
            .collect();
        let payload = json!({
            "events": [{
                "eventTypeCode": type_code,
                "eventTimestamp": timestamp,
                "attributes": attributes,
            }]
        });

        self.post("events/submission", &payload).await
    }

    // ── Data-subject (GDPR) bulk operations ──────────────────────────

    /// Submit a data-subject access request for the given lookup rows and
    /// poll for the result.
    pub async fn gdpr_access(
        &self,
        database_id: &str,
        rows: &[Vec<String>],
    ) -> Result<Value, Error> {
        self.post_csv_job(&format!("databases/{database_id}/gdpr_access"), rows)
            .await
    }

    /// Submit a data-subject erasure request for the given lookup rows and
    /// poll for the result.
    pub async fn gdpr_erasure(
        &self,
        database_id: &str,
        rows: &[Vec<String>],
    ) -> Result<Value, Error> {
        self.post_csv_job(&format!("databases/{database_id}/gdpr_erasure"), rows)
            .await
    }

    /// Upload lookup rows as a CSV body, then poll the returned fetch URL
    /// until the response no longer carries a `status` field (bounded
    /// attempts — a still-pending body is returned as-is for the caller to
    /// resume from).
    async fn post_csv_job(&self, resource: &str, rows: &[Vec<String>]) -> Result<Value, Error> {
        if rows.is_empty() {
            return Err(Error::Validation {
                message: "data-subject request requires at least one lookup row".to_owned(),
            });
        }

        let token = self.tokens.access_token().await?;
        let url = self.url(resource);
        debug!("POST {url} (csv, {} rows)", rows.len());

        let resp = self
            .http
            .post(url)
            .bearer_auth(&token)
            .header(reqwest::header::CONTENT_TYPE, "text/csv")
            .body(to_csv(rows))
            .send()
            .await
            .map_err(Error::Transport)?;
        let submitted: Value = Self::handle_response(resp).await?;

        let Some(fetch_url) = submitted
            .pointer("/data/location")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned)
        else {
            return Err(Error::Deserialization {
                message: "submission response missing data.location fetch URL".to_owned(),
                body: submitted.to_string(),
            });
        };

        let mut body = Value::Null;
        for attempt in 0..FETCH_POLL_ATTEMPTS {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
            debug!("GET {fetch_url} (attempt {attempt})");
            let resp = self
                .http
                .get(&fetch_url)
                .bearer_auth(&token)
                .send()
                .await
                .map_err(Error::Transport)?;
            body = Self::handle_response(resp).await?;
            if body.pointer("/data/status").is_none() {
                return Ok(body);
            }
        }
        Ok(body)
    }
}

/// Minimal CSV encoding for lookup rows: fields containing a comma, quote,
/// or newline are quoted with doubled inner quotes.
fn to_csv(rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    for row in rows {
        let mut first = true;
        for field in row {
            if !first {
                out.push(',');
            }
            first = false;
            if field.contains([',', '"', '\n', '\r']) {
                out.push('"');
                out.push_str(&field.replace('"', "\"\""));
                out.push('"');
            } else {
                out.push_str(field);
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::to_csv;

    #[test]
    fn csv_rows_are_joined_and_terminated() {
        let rows = vec![
            vec!["Email".to_owned(), "a@example.com".to_owned()],
            vec!["Email".to_owned(), "b@example.com".to_owned()],
        ];
        assert_eq!(to_csv(&rows), "Email,a@example.com\nEmail,b@example.com\n");
    }

    #[test]
    fn csv_quotes_fields_with_separators() {
        let rows = vec![vec!["Name".to_owned(), "Doe, \"Jo\"".to_owned()]];
        assert_eq!(to_csv(&rows), "Name,\"Doe, \"\"Jo\"\"\"\n");
    }
}
