use queryflight::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::sleep;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // 1. Setup cache
    let cache: QueryCache<String> = QueryCache::new();

    // 2. Shared counter to track actual producer runs
    let runs = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    let key = "expensive_data";

    println!("Spawning 10 concurrent resolves for key '{}'...", key);

    // 3. Launch concurrent resolves
    for _ in 0..10 {
        let cache = cache.clone();
        let runs = runs.clone();

        handles.push(tokio::spawn(async move {
            let got = cache
                .resolve(key, move || async move {
                    // Simulate an expensive network call (100ms)
                    sleep(Duration::from_millis(100)).await;

                    let count = runs.fetch_add(1, Ordering::SeqCst) + 1;
                    println!("Producing... (run: {})", count);

                    Ok(Fetched::new("produced_value".to_string()))
                })
                .await
                .unwrap();

            assert_eq!(got.value, "produced_value");
        }));
    }

    // 4. Wait for all to complete
    for h in handles {
        h.await?;
    }

    // 5. Verify coalescing
    let total_runs = runs.load(Ordering::SeqCst);
    let stats = cache.stats();
    println!(
        "Total producer runs: {} (misses: {}, coalesced: {})",
        total_runs, stats.misses, stats.coalesced
    );

    if total_runs != 1 {
        panic!("Coalescing failed! Expected 1 producer run, got {}", total_runs);
    }
    println!("SUCCESS: Request coalescing worked correctly.");

    Ok(())
}
