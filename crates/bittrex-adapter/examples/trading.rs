/*
[INPUT]:  BTX_API_KEY / BTX_SECRET_KEY environment variables
[OUTPUT]: Order placement, status query and cancellation
[POS]:    Examples - authenticated trading flow
[UPDATE]: When adding new trading endpoints or changing order flow
*/

use bittrex_adapter::*;

/// Example: place, inspect and cancel a limit order.
///
/// Requires `BTX_API_KEY` / `BTX_SECRET_KEY` in the environment (a
/// `.env` file works too).
#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    println!("=== Bittrex Trading Example ===\n");

    let client = match BittrexClient::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };
    println!("✓ Authenticated client created\n");

    let quantity: rust_decimal::Decimal = "0.01".parse().expect("quantity");
    let rate: rust_decimal::Decimal = "0.001".parse().expect("rate");

    println!("Placing a limit buy on BTC-LTC...");
    let request = LimitOrderRequest::new("BTC-LTC", OrderSide::Buy, quantity, rate);
    let placed = match client.place_limit_order(request).await {
        Ok(placed) => {
            println!("✓ Order placed: {}", placed.uuid);
            placed
        }
        Err(e) => {
            if e.effect_uncertain() {
                eprintln!("✗ Timed out with effect uncertain - reconcile before retrying: {}", e);
            } else {
                eprintln!("✗ Error: {}", e);
            }
            return;
        }
    };

    println!("\nQuerying the order...");
    match client.get_order(&placed.uuid).await {
        Ok(order) => println!("✓ Status: {:?}", order.status()),
        Err(e) => println!("✗ Error: {}", e),
    }

    println!("\nCancelling the order...");
    match client.cancel_order(&placed.uuid).await {
        Ok(()) => println!("✓ Cancel accepted"),
        Err(e) => println!("✗ Error: {}", e),
    }

    println!("\nOpen orders on BTC-LTC:");
    match client.get_open_orders(Some("BTC-LTC")).await {
        Ok(orders) => {
            for order in orders {
                println!("  {} {:?} {}", order.order_uuid, order.status(), order.exchange);
            }
        }
        Err(e) => println!("✗ Error: {}", e),
    }

    println!("\n✓ Trading example complete");
}
