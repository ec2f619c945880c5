/*
[INPUT]:  WebSocket configuration and subscription commands
[OUTPUT]: Real-time market delta streams
[POS]:    WebSocket layer - real-time data streams
[UPDATE]: When adding new channels or changing connection logic
*/

pub mod client;
pub mod message;

pub use client::{
    BittrexWebSocket, MarketSubscription, StreamConfig, StreamState, SubscriptionHandle,
};
pub use message::{AckAction, BookDelta, DeltaKind, FillDelta, MarketDelta, StreamMessage};
