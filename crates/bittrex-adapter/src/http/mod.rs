/*
[INPUT]:  HTTP client configuration and API endpoints
[OUTPUT]: HTTP responses and typed API results
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod account;
pub mod client;
pub mod envelope;
pub mod error;
pub mod public;
pub mod signature;
pub mod trade;
pub(crate) mod transport;

pub use envelope::normalize;
pub use error::{BittrexError, Result};
pub use signature::RequestSigner;

pub use client::{BittrexClient, ClientConfig, Credentials};
