/*
[INPUT]:  Order requests carrying an idempotency marker
[OUTPUT]: Placement acknowledgements and order state
[POS]:    HTTP layer - trading endpoints (require auth + signed URI)
[UPDATE]: When adding new trading endpoints or changing order flow
*/

use rust_decimal::Decimal;
use serde_json::Value;

use crate::http::client::{BittrexClient, require_identifier, require_positive};
use crate::http::error::Result;
use crate::types::{ApiRequest, LimitOrderRequest, Order, OrderSide, PlacedOrder};

impl BittrexClient {
    /// Place a limit order.
    ///
    /// GET /market/buylimit | /market/selllimit
    /// The request's idempotency marker guarantees at most one live order
    /// per marker even across concurrent calls; see `LimitOrderRequest`.
    pub async fn place_limit_order(&self, req: LimitOrderRequest) -> Result<PlacedOrder> {
        require_identifier(&req.market, "market")?;
        require_positive(req.quantity, "quantity")?;
        require_positive(req.rate, "rate")?;

        let path = match req.side {
            OrderSide::Buy => "market/buylimit",
            OrderSide::Sell => "market/selllimit",
        };
        let request = ApiRequest::market(
            path,
            vec![
                ("market".to_string(), req.market.clone()),
                ("quantity".to_string(), req.quantity.to_string()),
                ("rate".to_string(), req.rate.to_string()),
            ],
        )
        .idempotent_marker(req.marker);

        self.place_with_marker(request).await
    }

    /// Buy at a price limit with a fresh idempotency marker
    pub async fn buy_limit(
        &self,
        market: &str,
        quantity: Decimal,
        rate: Decimal,
    ) -> Result<PlacedOrder> {
        self.place_limit_order(LimitOrderRequest::new(market, OrderSide::Buy, quantity, rate))
            .await
    }

    /// Sell at a price limit with a fresh idempotency marker
    pub async fn sell_limit(
        &self,
        market: &str,
        quantity: Decimal,
        rate: Decimal,
    ) -> Result<PlacedOrder> {
        self.place_limit_order(LimitOrderRequest::new(market, OrderSide::Sell, quantity, rate))
            .await
    }

    /// Cancel an open order by its exchange identifier.
    ///
    /// GET /market/cancel?uuid={uuid}
    /// Cancelling twice is harmless, so a timeout here stays certain.
    pub async fn cancel_order(&self, order_uuid: &str) -> Result<()> {
        require_identifier(order_uuid, "order uuid")?;
        let request = ApiRequest::market(
            "market/cancel",
            vec![("uuid".to_string(), order_uuid.to_string())],
        );
        let _ack: Option<Value> = self.execute(request).await?;
        Ok(())
    }

    /// Open orders, optionally filtered to one market
    ///
    /// GET /market/getopenorders?market={market}
    pub async fn get_open_orders(&self, market: Option<&str>) -> Result<Vec<Order>> {
        let mut params = Vec::new();
        if let Some(market) = market {
            require_identifier(market, "market")?;
            params.push(("market".to_string(), market.to_string()));
        }
        self.execute(ApiRequest::market("market/getopenorders", params))
            .await
    }
}

#[cfg(test)]
mod tests {
    use crate::http::client::{BittrexClient, ClientConfig, Credentials};
    use crate::http::error::BittrexError;
    use rust_decimal::Decimal;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> BittrexClient {
        BittrexClient::with_config_and_base_url(
            Some(Credentials::new("test-key", "test-secret")),
            ClientConfig::default(),
            &server.uri(),
        )
        .expect("client init")
    }

    fn qty(value: &str) -> Decimal {
        value.parse().expect("decimal")
    }

    #[tokio::test]
    async fn test_buy_limit_returns_the_order_uuid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/market/buylimit"))
            .and(query_param("market", "BTC-USD"))
            .and(query_param("quantity", "1"))
            .and(query_param("rate", "30000"))
            .and(query_param("apikey", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "",
                "result": { "uuid": "abc" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let placed = client_for(&server)
            .buy_limit("BTC-USD", qty("1"), qty("30000"))
            .await
            .expect("buy_limit");

        assert_eq!(placed.uuid, "abc");
    }

    #[tokio::test]
    async fn test_rejected_placement_surfaces_the_exchange_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/market/buylimit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "message": "INSUFFICIENT_FUNDS",
                "result": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .buy_limit("BTC-USD", qty("1"), qty("30000"))
            .await
            .expect_err("should fail");

        match err {
            BittrexError::Exchange { message, .. } => assert_eq!(message, "INSUFFICIENT_FUNDS"),
            other => panic!("expected Exchange, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_positive_quantity_fails_without_a_network_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/market/buylimit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .buy_limit("BTC-USD", Decimal::ZERO, qty("30000"))
            .await
            .expect_err("should fail locally");

        assert!(matches!(err, BittrexError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_cancel_accepts_a_null_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/market/cancel"))
            .and(query_param("uuid", "09aa5bb6"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "",
                "result": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .cancel_order("09aa5bb6")
            .await
            .expect("cancel_order");
    }

    #[tokio::test]
    async fn test_get_open_orders_without_market_filter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/market/getopenorders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "",
                "result": [
                    {
                        "Uuid": null,
                        "OrderUuid": "09aa5bb6-8232-41aa-9b78-a5a1093e0211",
                        "Exchange": "BTC-LTC",
                        "OrderType": "LIMIT_BUY",
                        "Quantity": 5.0,
                        "QuantityRemaining": 5.0,
                        "Limit": 2e-8,
                        "Price": 0.0,
                        "PricePerUnit": null,
                        "CommissionPaid": 0.0,
                        "Opened": "2014-07-09T03:55:48.77",
                        "Closed": null,
                        "CancelInitiated": false,
                        "ImmediateOrCancel": false
                    }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let orders = client_for(&server)
            .get_open_orders(None)
            .await
            .expect("get_open_orders");

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].exchange, "BTC-LTC");
    }
}
