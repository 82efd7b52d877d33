// Legacy XML API modules
//
// Request/response templating for the legacy `/XMLAPI` surface: a minimal
// element tree for responses, an event-based writer for requests, the
// envelope contract, one typed action per operation, and the client that
// drives the session/retry state machine.

pub mod actions;
pub mod client;
pub mod dom;
pub mod envelope;
pub mod writer;

pub use client::XmlClient;
pub use dom::XmlNode;
pub use envelope::ResponseEnvelope;
