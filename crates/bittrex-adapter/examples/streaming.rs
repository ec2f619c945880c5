/*
[INPUT]:  Market identifiers to watch
[OUTPUT]: Live market deltas printed to stdout
[POS]:    Examples - market data stream subscriptions
[UPDATE]: When stream channels change
*/

use bittrex_adapter::*;

/// Example: subscribe to two markets and print a handful of deltas.
///
/// The stream manager reconnects and resubscribes on its own; this
/// program only consumes the ordered per-market feeds.
#[tokio::main]
async fn main() {
    println!("=== Bittrex Streaming Example ===\n");

    let stream = BittrexWebSocket::new();

    let mut btc = match stream.subscribe("BTC-LTC").await {
        Ok(sub) => sub,
        Err(e) => {
            eprintln!("Failed to subscribe: {}", e);
            return;
        }
    };
    let mut eth = match stream.subscribe("BTC-ETH").await {
        Ok(sub) => sub,
        Err(e) => {
            eprintln!("Failed to subscribe: {}", e);
            return;
        }
    };
    println!("✓ Subscribed to {} and {}\n", btc.market(), eth.market());

    for _ in 0..5 {
        tokio::select! {
            delta = btc.recv() => match delta {
                Some(delta) => println!("BTC-LTC delta nonce={} ({} buys, {} sells)",
                    delta.nonce, delta.buys.len(), delta.sells.len()),
                None => break,
            },
            delta = eth.recv() => match delta {
                Some(delta) => println!("BTC-ETH delta nonce={} ({} fills)",
                    delta.nonce, delta.fills.len()),
                None => break,
            },
        }
    }

    let handle = btc.handle().clone();
    if let Err(e) = stream.unsubscribe(&handle).await {
        eprintln!("✗ Error: {}", e);
    }

    stream.shutdown().await;
    println!("\n✓ Streaming example complete");
}
