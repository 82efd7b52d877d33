// engage-api: Async Rust client for the Acoustic Campaign API (REST + legacy XML)

pub mod connector;
pub mod credentials;
pub mod error;
pub mod rest;
pub mod session;
pub mod token;
pub mod transport;
pub mod xml;

pub use connector::{EngageConnector, Operation, Route};
pub use credentials::{OauthCredentials, SessionCredentials};
pub use error::Error;
pub use rest::RestClient;
pub use session::SessionProvider;
pub use token::{AccessToken, TokenProvider};
pub use transport::TransportConfig;
pub use xml::XmlClient;
