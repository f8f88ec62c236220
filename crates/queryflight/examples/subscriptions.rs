use queryflight::prelude::*;
use std::time::Duration;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cache: QueryCache<String> = QueryCache::new();

    // A channel subscriber receives every successful settle for its key,
    // across entry generations, until it unsubscribes.
    let (subscriber, mut updates) = ChannelSubscriber::<String>::new();

    cache
        .resolve(
            ResolveOpts::new()
                .key("dashboard")
                .stale_time(Duration::from_secs(60))
                .subscriber(subscriber.clone()),
            || async { Ok(Fetched::new("v1".to_string())) },
        )
        .await?;

    // A forced refresh replaces the entry; the subscriber follows along.
    cache
        .resolve(
            ResolveOpts::new().key("dashboard").force_refresh(),
            || async { Ok(Fetched::new("v2".to_string())) },
        )
        .await?;

    for _ in 0..2 {
        let (key, update) = updates.recv().await.expect("update delivered");
        println!("[{}] -> {}", key, update.value);
    }

    cache.unsubscribe("dashboard", &subscriber);
    println!("unsubscribed; stats: {:?}", cache.stats());

    Ok(())
}
