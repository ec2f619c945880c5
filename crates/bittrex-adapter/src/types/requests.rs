/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust request structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rate::EndpointCategory;

use super::enums::OrderSide;

/// Parameters for a limit order placement.
///
/// The idempotency marker identifies the placement attempt: concurrent
/// placements sharing a marker resolve to a single live order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitOrderRequest {
    pub market: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub rate: Decimal,
    pub marker: Uuid,
}

impl LimitOrderRequest {
    /// Build a placement request with a fresh idempotency marker.
    pub fn new(market: impl Into<String>, side: OrderSide, quantity: Decimal, rate: Decimal) -> Self {
        Self {
            market: market.into(),
            side,
            quantity,
            rate,
            marker: Uuid::new_v4(),
        }
    }

    /// Reuse an existing marker, e.g. when retrying a definite failure.
    pub fn with_marker(mut self, marker: Uuid) -> Self {
        self.marker = marker;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawRequest {
    pub currency: String,
    pub quantity: Decimal,
    pub address: String,
    /// Memo-style routing id used by CryptoNotes-like currencies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
}

/// One wire call: operation path, canonical parameters, admission category.
///
/// Created per facade call and consumed once by the transport. Parameters
/// are kept sorted so the signed URI is canonical.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub path: &'static str,
    pub category: EndpointCategory,
    pub params: Vec<(String, String)>,
    pub auth: bool,
    /// A fired deadline on this operation leaves its effect unknown
    /// (placements, withdrawals). Queries and cancels stay certain.
    pub uncertain_on_timeout: bool,
    pub idempotency: Option<Uuid>,
}

impl ApiRequest {
    fn new(
        path: &'static str,
        category: EndpointCategory,
        auth: bool,
        mut params: Vec<(String, String)>,
    ) -> Self {
        params.sort_by(|a, b| a.0.cmp(&b.0));
        Self {
            path,
            category,
            params,
            auth,
            uncertain_on_timeout: false,
            idempotency: None,
        }
    }

    pub fn public(path: &'static str, params: Vec<(String, String)>) -> Self {
        Self::new(path, EndpointCategory::Public, false, params)
    }

    pub fn market(path: &'static str, params: Vec<(String, String)>) -> Self {
        Self::new(path, EndpointCategory::Market, true, params)
    }

    pub fn account(path: &'static str, params: Vec<(String, String)>) -> Self {
        Self::new(path, EndpointCategory::Account, true, params)
    }

    /// Flag the operation as non-idempotent and bind its marker.
    pub fn idempotent_marker(mut self, marker: Uuid) -> Self {
        self.idempotency = Some(marker);
        self.uncertain_on_timeout = true;
        self
    }

    /// Flag a marker-less operation whose effect is unknown after a timeout.
    pub fn non_idempotent(mut self) -> Self {
        self.uncertain_on_timeout = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_request_sorts_params_canonically() {
        let request = ApiRequest::public(
            "public/getorderbook",
            vec![
                ("type".to_string(), "both".to_string()),
                ("market".to_string(), "BTC-LTC".to_string()),
            ],
        );

        let keys: Vec<&str> = request.params.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["market", "type"]);
    }

    #[test]
    fn marker_flags_timeout_uncertainty() {
        let marker = Uuid::new_v4();
        let request = ApiRequest::market("market/buylimit", Vec::new()).idempotent_marker(marker);

        assert!(request.uncertain_on_timeout);
        assert_eq!(request.idempotency, Some(marker));
    }

    #[test]
    fn limit_order_requests_get_distinct_markers() {
        let quantity: Decimal = "1".parse().expect("quantity");
        let rate: Decimal = "30000".parse().expect("rate");
        let a = LimitOrderRequest::new("BTC-USD", OrderSide::Buy, quantity, rate);
        let b = LimitOrderRequest::new("BTC-USD", OrderSide::Buy, quantity, rate);

        assert_ne!(a.marker, b.marker);
    }
}
