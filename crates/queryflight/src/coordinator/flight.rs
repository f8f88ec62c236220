//! In-flight producer drive and settle fan-out

use std::future::Future;
use std::sync::Arc;

use tokio::time::Instant;

use queryflight_core::{CacheMetrics, EntryCell, Fetched, Result, Stage};

use super::Shared;

/// Drive one producer run to settlement on its own task
///
/// The task owns its entry handle, so waiters parked on this generation are
/// served even if the store has since evicted or replaced the entry. The
/// task also runs to completion when every waiter stops listening; a shared
/// run is never cancelled on behalf of one caller.
pub(super) fn spawn<V, M, Met, Fut>(
    shared: Arc<Shared<V, M>>,
    metrics: Arc<Met>,
    cell: EntryCell<V, M>,
    key: String,
    producing: Fut,
) where
    V: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
    Met: CacheMetrics,
    Fut: Future<Output = Result<Fetched<V, M>>> + Send + 'static,
{
    tokio::spawn(async move {
        let started = Instant::now();
        match producing.await {
            Ok(settled) => {
                // Snapshot under the lock, fan out without it: a waiter or
                // subscriber re-entering the coordinator must not find the
                // queue mid-drain.
                let (waiters, subscribers) = {
                    let mut entry = cell.lock();
                    entry.stage = Stage::Active;
                    entry.expires_at = Instant::now() + entry.stale_time;
                    entry.result = Some(settled.clone());
                    let waiters = std::mem::take(&mut entry.waiters);
                    let subscribers = entry.subscribers.snapshot();
                    (waiters, subscribers)
                };
                // FIFO drain; a dropped receiver just stopped waiting
                for waiter in waiters {
                    let _ = waiter.send(Ok(settled.clone()));
                }
                // Each subscriber independently; one failure never aborts
                // delivery to the rest
                for subscriber in subscribers {
                    let _ = subscriber.notify(settled.clone(), &key).await;
                }
                metrics.record_settle(&key, true, started.elapsed());
            }
            Err(err) => {
                let waiters = {
                    let mut entry = cell.lock();
                    entry.stage = Stage::Inactive;
                    std::mem::take(&mut entry.waiters)
                };
                // Failures reach only the current batch of waiters, never
                // the subscriber set
                for waiter in waiters {
                    let _ = waiter.send(Err(err.clone()));
                }
                shared.counters.write().failures += 1;
                metrics.record_settle(&key, false, started.elapsed());
            }
        }
    });
}
