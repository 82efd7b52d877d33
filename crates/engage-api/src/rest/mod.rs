// REST API client modules
//
// JSON surface under `/rest/...`, bearer-authenticated via the OAuth token
// provider, plus the CSV-upload data-subject endpoints.

pub mod client;

pub use client::RestClient;
