use std::fmt;

use thiserror::Error;

/// Which part of the legacy envelope contract a response violated.
///
/// A response is well-formed only if it parses as XML and contains
/// `Body.RESULT.SUCCESS`; each missing layer is reported distinctly so a
/// broken proxy can be told apart from a broken server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// The body did not parse as XML at all.
    InvalidXml,
    /// No `<Body>` element on the envelope.
    MissingBody,
    /// No `<RESULT>` element under `Body`.
    MissingResult,
    /// No `<SUCCESS>` element under `RESULT`.
    MissingSuccess,
}

impl fmt::Display for ProtocolViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::InvalidXml => "invalid XML",
            Self::MissingBody => "no <Body> element on response",
            Self::MissingResult => "no <RESULT> element on response body",
            Self::MissingSuccess => "no <SUCCESS> element on result",
        };
        f.write_str(text)
    }
}

/// Top-level error type for the `engage-api` crate.
///
/// Covers every failure mode across both API surfaces: configuration,
/// credential exchange, transport, envelope-contract violations, and
/// well-formed server faults.
#[derive(Debug, Error)]
pub enum Error {
    // ── Configuration ───────────────────────────────────────────────
    /// No connector or credentials are available for the requested
    /// operation. Surfaced immediately, never retried.
    #[error("Not authenticated: {message}")]
    Configuration { message: String },

    // ── Authentication ──────────────────────────────────────────────
    /// Credential exchange failed or credentials are missing. Carries the
    /// server-supplied detail when one was given.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Legacy protocol ─────────────────────────────────────────────
    /// Malformed legacy response (transport or server contract violation).
    /// The raw payload is attached for diagnosis.
    #[error("Protocol violation: {violation}")]
    Protocol {
        violation: ProtocolViolation,
        raw: String,
    },

    /// Well-formed failure response (`SUCCESS != "true"`). Carries the
    /// server fault message and, when present, the numeric fault code.
    #[error("API request failed: {message}")]
    Api { message: String, code: Option<i32> },

    // ── Caller input ────────────────────────────────────────────────
    /// Caller-supplied arguments failed local precondition checks. Raised
    /// before any network call.
    #[error("Invalid argument: {message}")]
    Validation { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Data ────────────────────────────────────────────────────────
    /// Response deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Shorthand for a [`Error::Protocol`] carrying the raw response.
    pub(crate) fn protocol(violation: ProtocolViolation, raw: &str) -> Self {
        Self::Protocol {
            violation,
            raw: raw.to_owned(),
        }
    }

    /// The numeric fault code from a well-formed failure response, if any.
    pub fn api_error_code(&self) -> Option<i32> {
        match self {
            Self::Api { code, .. } => *code,
            _ => None,
        }
    }

    /// The raw response payload attached to a contract violation, if any.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::Protocol { raw, .. } => Some(raw),
            Self::Deserialization { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Returns `true` if re-authenticating might resolve this error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }
}
