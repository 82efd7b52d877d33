// Shared transport configuration for building reqwest::Client instances.
//
// Both the REST and XML clients share timeout and redirect settings through
// this value object, avoiding a shared base-class hierarchy. The transport
// itself (pooling, TLS) belongs to reqwest; this module only configures it.

use std::time::Duration;

use url::Url;

use crate::error::Error;

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    /// Date format passed through to legacy list exports (`LIST_DATE_FORMAT`).
    pub date_format: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            date_format: "MM/dd/yyyy".to_owned(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    ///
    /// Redirects are capped at 3 hops, matching the server's documented
    /// redirect behavior for the legacy endpoint.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .redirect(reqwest::redirect::Policy::limited(3))
            .user_agent(concat!("engage-api/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Transport)
    }

    /// Normalize a base URL, prepending a scheme when one is missing.
    ///
    /// SSL is preferred; pilot hosts (`api.pilot.*`) only speak plain HTTP.
    pub fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let with_scheme = if raw.starts_with("http://") || raw.starts_with("https://") {
            raw.to_owned()
        } else {
            let scheme = if raw.contains("api.pilot") { "http" } else { "https" };
            format!("{scheme}://{raw}")
        };
        Url::parse(&with_scheme).map_err(Error::InvalidUrl)
    }
}

#[cfg(test)]
mod tests {
    use super::TransportConfig;

    #[test]
    fn normalize_adds_https_by_default() {
        let url = TransportConfig::normalize_base_url("api-campaign-us-1.goacoustic.com")
            .expect("valid host");
        assert_eq!(url.as_str(), "https://api-campaign-us-1.goacoustic.com/");
    }

    #[test]
    fn normalize_keeps_explicit_scheme() {
        let url = TransportConfig::normalize_base_url("http://example.com").expect("valid url");
        assert_eq!(url.scheme(), "http");
    }

    #[test]
    fn normalize_uses_plain_http_for_pilot_hosts() {
        let url =
            TransportConfig::normalize_base_url("api.pilot.silverpop.com").expect("valid host");
        assert_eq!(url.scheme(), "http");
    }
}
