/*
[INPUT]:  Market identifier (e.g., "BTC-LTC")
[OUTPUT]: Market data (markets, ticker, depth, history)
[POS]:    Examples - public market data queries
[UPDATE]: When adding new market data endpoints
*/

use bittrex_adapter::*;

/// Example: Query market data (no authentication required)
#[tokio::main]
async fn main() {
    println!("=== Bittrex Market Data Example ===\n");

    let client = match BittrexClient::read_only() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };
    println!("✓ HTTP client created (no auth required for public endpoints)\n");

    let market = "BTC-LTC";

    println!("Listing markets...");
    match client.get_markets().await {
        Ok(markets) => println!("✓ {} markets, first: {:?}", markets.len(), markets.first()),
        Err(e) => println!("✗ Error: {}", e),
    }

    println!("\nQuerying ticker for {}...", market);
    match client.get_ticker(market).await {
        Ok(ticker) => println!("✓ Ticker: {:?}", ticker),
        Err(e) => println!("✗ Error: {}", e),
    }

    println!("\nQuerying order book for {}...", market);
    match client.get_order_book(market, BookSide::Both).await {
        Ok(book) => println!("✓ Depth: {} bids / {} asks", book.buy.len(), book.sell.len()),
        Err(e) => println!("✗ Error: {}", e),
    }

    println!("\nQuerying trade history for {}...", market);
    match client.get_market_history(market).await {
        Ok(trades) => println!("✓ {} recent trades", trades.len()),
        Err(e) => println!("✗ Error: {}", e),
    }

    println!("\n✓ Market data example complete");
}
