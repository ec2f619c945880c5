/*
[INPUT]:  API schema definitions
[OUTPUT]: Typed request/response/model definitions
[POS]:    Data layer - shared types for HTTP and WebSocket layers
[UPDATE]: When API schema changes or new types added
*/

pub mod enums;
pub mod models;
pub mod requests;
pub mod responses;

pub use enums::{BookSide, FillType, OrderSide, OrderStatus, OrderType, TradeSide};
pub use models::{
    AccountBalance, Currency, DepositAddress, Market, MarketSummary, MarketTrade, Order,
    OrderBook, OrderBookEntry, Ticker,
};
pub use requests::{ApiRequest, LimitOrderRequest, WithdrawRequest};
pub use responses::{PlacedOrder, WithdrawalReceipt};
