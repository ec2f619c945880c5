/*
[INPUT]:  Market identifiers and query parameters
[OUTPUT]: Market reference data (markets, currencies, tickers, depth, trades)
[POS]:    HTTP layer - public market data endpoints (no auth required)
[UPDATE]: When adding new public endpoints or changing response format
*/

use crate::http::client::{BittrexClient, require_identifier};
use crate::http::error::{BittrexError, Result};
use crate::types::{
    ApiRequest, BookSide, Currency, Market, MarketSummary, MarketTrade, OrderBook,
    OrderBookEntry, Ticker,
};

impl BittrexClient {
    /// List all tradable markets
    ///
    /// GET /public/getmarkets
    pub async fn get_markets(&self) -> Result<Vec<Market>> {
        self.execute(ApiRequest::public("public/getmarkets", Vec::new()))
            .await
    }

    /// List all supported currencies
    ///
    /// GET /public/getcurrencies
    pub async fn get_currencies(&self) -> Result<Vec<Currency>> {
        self.execute(ApiRequest::public("public/getcurrencies", Vec::new()))
            .await
    }

    /// Current bid/ask/last for one market
    ///
    /// GET /public/getticker?market={market}
    pub async fn get_ticker(&self, market: &str) -> Result<Ticker> {
        require_identifier(market, "market")?;
        let request = ApiRequest::public(
            "public/getticker",
            vec![("market".to_string(), market.to_string())],
        );
        self.execute(request).await
    }

    /// 24h summaries for every market
    ///
    /// GET /public/getmarketsummaries
    pub async fn get_market_summaries(&self) -> Result<Vec<MarketSummary>> {
        self.execute(ApiRequest::public("public/getmarketsummaries", Vec::new()))
            .await
    }

    /// 24h summary for one market
    ///
    /// GET /public/getmarketsummary?market={market}
    /// The exchange wraps the single summary in a one-element array.
    pub async fn get_market_summary(&self, market: &str) -> Result<MarketSummary> {
        require_identifier(market, "market")?;
        let request = ApiRequest::public(
            "public/getmarketsummary",
            vec![("market".to_string(), market.to_string())],
        );
        let rows: Vec<MarketSummary> = self.execute(request).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| BittrexError::malformed("summary result was empty"))
    }

    /// Depth snapshot for one market
    ///
    /// GET /public/getorderbook?market={market}&type={side}
    /// With a single-sided query the exchange returns a bare entry array
    /// instead of the two-sided object.
    pub async fn get_order_book(&self, market: &str, side: BookSide) -> Result<OrderBook> {
        require_identifier(market, "market")?;
        let request = ApiRequest::public(
            "public/getorderbook",
            vec![
                ("market".to_string(), market.to_string()),
                ("type".to_string(), side.as_param().to_string()),
            ],
        );
        match side {
            BookSide::Both => self.execute(request).await,
            BookSide::Buy => {
                let buy: Vec<OrderBookEntry> = self.execute(request).await?;
                Ok(OrderBook { buy, sell: Vec::new() })
            }
            BookSide::Sell => {
                let sell: Vec<OrderBookEntry> = self.execute(request).await?;
                Ok(OrderBook { buy: Vec::new(), sell })
            }
        }
    }

    /// Recent public trades for one market
    ///
    /// GET /public/getmarkethistory?market={market}
    pub async fn get_market_history(&self, market: &str) -> Result<Vec<MarketTrade>> {
        require_identifier(market, "market")?;
        let request = ApiRequest::public(
            "public/getmarkethistory",
            vec![("market".to_string(), market.to_string())],
        );
        self.execute(request).await
    }
}
