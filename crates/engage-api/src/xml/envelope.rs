// Legacy protocol envelope contract.
//
// Every request and response is wrapped in `<Envelope><Body>...</Body>
// </Envelope>`. A response is well-formed only if it parses as XML and
// contains `Body.RESULT.SUCCESS == "true"`; anything else is reported as a
// distinct contract violation with the raw payload attached.

use crate::error::{Error, ProtocolViolation};
use crate::xml::dom::XmlNode;

/// Fault code the server uses to signal an expired session id.
pub const SESSION_EXPIRED_CODE: i32 = 145;

/// Wrap an operation element for posting to `/XMLAPI`.
pub fn wrap_request(operation_xml: &str) -> String {
    format!("<Envelope><Body>{operation_xml}</Body></Envelope>")
}

/// A response that has passed envelope validation.
#[derive(Debug)]
pub struct ResponseEnvelope {
    root: XmlNode,
    raw: String,
}

impl ResponseEnvelope {
    /// Enforce the envelope contract on a raw response body.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let Some(root) = XmlNode::parse(raw) else {
            return Err(Error::protocol(ProtocolViolation::InvalidXml, raw));
        };
        let Some(body) = root.child("Body") else {
            return Err(Error::protocol(ProtocolViolation::MissingBody, raw));
        };
        let Some(result) = body.child("RESULT") else {
            return Err(Error::protocol(ProtocolViolation::MissingResult, raw));
        };
        let Some(success) = result.child("SUCCESS") else {
            return Err(Error::protocol(ProtocolViolation::MissingSuccess, raw));
        };

        if !success.text.eq_ignore_ascii_case("true") {
            let fault = body.child("Fault");
            let message = fault
                .and_then(|f| f.child_text("FaultString"))
                .filter(|s| !s.is_empty())
                .unwrap_or("request failed")
                .to_owned();
            let code = fault
                .and_then(|f| f.child("detail"))
                .and_then(|d| d.child("error"))
                .and_then(|e| e.child_text("errorid"))
                .and_then(|id| id.parse().ok());
            return Err(Error::Api { message, code });
        }

        Ok(Self {
            root,
            raw: raw.to_owned(),
        })
    }

    /// The validated `Body.RESULT` element.
    pub fn result(&self) -> &XmlNode {
        self.root
            .child("Body")
            .and_then(|b| b.child("RESULT"))
            .expect("validated on parse")
    }

    /// The raw response body, for diagnostics.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The trimmed text of a required `RESULT` child, or a deserialization
    /// error naming the missing element.
    pub fn require_text(&self, name: &str) -> Result<String, Error> {
        self.result()
            .child_text(name)
            .map(ToOwned::to_owned)
            .ok_or_else(|| Error::Deserialization {
                message: format!("response missing <{name}> element"),
                body: self.raw.clone(),
            })
    }
}
