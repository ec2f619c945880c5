/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Bittrex adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod http;
pub mod rate;
pub mod types;
pub mod ws;

// Re-export commonly used types from http
pub use http::{
    BittrexClient,
    BittrexError,
    ClientConfig,
    Credentials,
    RequestSigner,
    Result,
};

// Re-export the rate governor surface
pub use rate::{AdmissionOutcome, CategoryLimit, EndpointCategory, RateGovernor, RateLimits};

// Re-export all types
pub use types::*;

// Re-export commonly used types from ws
pub use ws::{
    BittrexWebSocket,
    MarketDelta,
    MarketSubscription,
    StreamConfig,
    StreamState,
    SubscriptionHandle,
};
