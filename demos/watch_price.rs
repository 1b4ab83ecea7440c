use price_store::{PriceStore, StoreConfig};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = StoreConfig::from_env()?;
    if std::env::var("PRICE_STORE_POLL_SECS").is_err() {
        config.poll_interval = Duration::from_secs(20);
    }

    println!(
        "Watching {} in {}/{} (every {:?})",
        config.asset_id, config.primary_currency, config.secondary_currency, config.poll_interval
    );
    println!("==================================");

    let store = Arc::new(PriceStore::coingecko(config)?);
    let mut events = store.subscribe_events();
    store.start();

    // Three completed fetches, then stop
    for _ in 0..3 {
        let event = events.recv().await?;
        println!("{event}");

        let state = store.state();
        match state.snapshot {
            Some(snapshot) => println!(
                "  {:<10.2} {:<10.2} (age: {:?}, generation {})",
                snapshot.primary,
                snapshot.secondary,
                snapshot.age(),
                state.generation
            ),
            None => println!("  no snapshot yet"),
        }
        if let Some(error) = state.error {
            println!("  error: {error}");
        }
    }

    store.dispose();

    let metrics = store.fetch_metrics().await;
    println!(
        "\nProvider {}: p50={:.0}ms, p99={:.0}ms, success_rate={:.1}%",
        metrics.provider_name,
        metrics.latency_p50_ms,
        metrics.latency_p99_ms,
        metrics.success_rate * 100.0
    );
    println!("{:?}", store.health_check().status);

    Ok(())
}
