use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::Span;

/// Span attached to a long-lived spawned task.
pub fn task_span(name: &'static str) -> Span {
    tracing::info_span!("task", name = %name)
}

/// Awaits `fut` and reports it under the `performance` target when it ran
/// past `max`. Measured on the Tokio clock, so paused time counts.
pub async fn warn_if_slow<F, T>(label: &'static str, max: Duration, fut: F) -> T
where
    F: Future<Output = T>,
{
    let started = Instant::now();
    let out = fut.await;

    let elapsed = started.elapsed();
    if elapsed > max {
        tracing::warn!(
            target: "performance",
            label,
            elapsed_ms = elapsed.as_millis() as u64,
            max_ms = max.as_millis() as u64,
            "slow operation"
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    use super::*;

    #[derive(Clone, Default)]
    struct PerformanceEvents(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for PerformanceEvents {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if event.metadata().target() == "performance" {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_futures_are_reported_on_the_tokio_clock() {
        let seen = PerformanceEvents::default();
        let _guard =
            tracing::subscriber::set_default(tracing_subscriber::registry().with(seen.clone()));

        warn_if_slow(
            "fast",
            Duration::from_secs(1),
            tokio::time::sleep(Duration::from_millis(200)),
        )
        .await;
        assert_eq!(seen.0.load(Ordering::SeqCst), 0);

        let value = warn_if_slow("slow", Duration::from_secs(1), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            7
        })
        .await;
        assert_eq!(value, 7);
        assert_eq!(seen.0.load(Ordering::SeqCst), 1);
    }
}
