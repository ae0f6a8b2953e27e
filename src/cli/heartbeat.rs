// ABOUTME: Keeps the process resident after a successful bind, emitting a heartbeat notice
// ABOUTME: The loop never inspects the session; it only stops when the shutdown future fires

use crate::client::Session;
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{info, warn};

pub const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(100);

/// What the heartbeat loop did before it was stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Heartbeat {
    /// Heartbeat notices emitted
    pub beats: u64,

    /// Delay between entering the loop and the first notice
    pub first_beat: Option<Duration>,
}

/// Idles until `shutdown` completes, then closes `session`.
///
/// Closing waits for the SMSC to acknowledge the unbind. If `force`
/// completes first, the unbind is abandoned and the function returns at once.
/// A session lost in the meantime goes unnoticed here; the session task
/// logs it.
pub async fn idle<F, G>(session: Session, shutdown: F, force: G) -> Heartbeat
where
    F: Future<Output = ()>,
    G: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let started = Instant::now();
    let mut report = Heartbeat::default();

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = sleep(HEARTBEAT_INTERVAL) => {
                report.beats += 1;
                report.first_beat.get_or_insert_with(|| started.elapsed());
                info!("sleep...");
            }
        }
    }

    let addr = session.addr().to_string();
    info!("shutting down, closing session with {}", addr);
    tokio::select! {
        _ = session.close() => {}
        _ = force => warn!("interrupted again, not waiting for unbind from {}", addr),
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::pending;
    use tokio::sync::oneshot;

    /// A session whose task only ends once it is told to shut down.
    fn session(linger: Option<Duration>) -> Session {
        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let _ = rx.await;
            if let Some(linger) = linger {
                sleep(linger).await;
            }
        });
        Session::new("test".to_string(), tx, task)
    }

    #[tokio::test(start_paused = true)]
    async fn beats_every_interval_until_shutdown() {
        let report = idle(session(None), sleep(Duration::from_millis(350)), pending()).await;

        assert_eq!(report.beats, 3);
        let first = report.first_beat.unwrap();
        assert!(first >= HEARTBEAT_INTERVAL && first < 2 * HEARTBEAT_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn first_beat_lands_within_200ms() {
        let report = idle(session(None), sleep(Duration::from_millis(200)), pending()).await;

        let first = report.first_beat.unwrap();
        assert!(first <= Duration::from_millis(200), "first heartbeat after {first:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_shutdown_emits_nothing() {
        let report = idle(session(None), std::future::ready(()), pending()).await;
        assert_eq!(report, Heartbeat::default());
    }

    #[tokio::test(start_paused = true)]
    async fn second_interrupt_abandons_a_slow_close() {
        let started = Instant::now();
        let report = idle(
            session(Some(Duration::from_secs(60))),
            std::future::ready(()),
            sleep(Duration::from_millis(10)),
        )
        .await;

        assert_eq!(report.beats, 0);
        assert!(started.elapsed() < Duration::from_secs(60));
    }
}
