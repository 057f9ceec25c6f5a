//! Bounded concurrent map with per-task failure isolation.
//!
//! Every input runs as its own tokio task behind a shared semaphore, with
//! its own deadline. A task that fails, overruns or panics yields an
//! `Err` in its slot and never disturbs its siblings. Output order always
//! matches input order, whatever order the tasks finish in.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Limits for one fan-out.
#[derive(Debug, Clone, Copy)]
pub struct FanOutLimits {
    /// Tasks in flight at once (at least 1).
    pub concurrency: usize,
    /// Deadline for each task, measured from when it gets a permit.
    pub per_task_timeout: Duration,
}

impl FanOutLimits {
    pub fn new(concurrency: usize, per_task_timeout: Duration) -> Self {
        Self {
            concurrency: concurrency.max(1),
            per_task_timeout,
        }
    }
}

/// Why one fanned-out task produced no value.
#[derive(Debug, Error)]
pub enum TaskFailure<E> {
    #[error("{0}")]
    Failed(E),

    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    #[error("task panicked: {0}")]
    Panicked(String),

    #[error("task was cancelled")]
    Cancelled,
}

/// Run `f` over every input with bounded concurrency.
///
/// Returns one result per input, in input order.
pub async fn fan_out<I, T, E, F, Fut>(
    inputs: Vec<I>,
    limits: FanOutLimits,
    f: F,
) -> Vec<Result<T, TaskFailure<E>>>
where
    I: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let len = inputs.len();
    let f = Arc::new(f);
    let semaphore = Arc::new(Semaphore::new(limits.concurrency.max(1)));
    let mut set = JoinSet::new();

    for (index, input) in inputs.into_iter().enumerate() {
        let f = Arc::clone(&f);
        let semaphore = Arc::clone(&semaphore);
        let timeout = limits.per_task_timeout;

        set.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return (index, Err(TaskFailure::Cancelled));
            };

            let call = AssertUnwindSafe(f(input)).catch_unwind();
            let outcome = match tokio::time::timeout(timeout, call).await {
                Ok(Ok(Ok(value))) => Ok(value),
                Ok(Ok(Err(e))) => Err(TaskFailure::Failed(e)),
                Ok(Err(panic)) => Err(TaskFailure::Panicked(panic_message(panic.as_ref()))),
                Err(_) => Err(TaskFailure::TimedOut(timeout)),
            };
            (index, outcome)
        });
    }

    let mut slots: Vec<Option<Result<T, TaskFailure<E>>>> =
        std::iter::repeat_with(|| None).take(len).collect();

    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, outcome)) => slots[index] = Some(outcome),
            Err(e) => tracing::warn!(error = %e, "Fan-out task did not complete"),
        }
    }

    slots
        .into_iter()
        .map(|slot| slot.unwrap_or(Err(TaskFailure::Cancelled)))
        .collect()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    #[tokio::test]
    async fn test_results_keep_input_order() {
        // Later inputs finish first
        let results = fan_out(
            vec![30u64, 20, 10, 0],
            FanOutLimits::new(4, Duration::from_secs(1)),
            |delay| async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok::<_, String>(delay)
            },
        )
        .await;

        let values: Vec<u64> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(values, vec![30, 20, 10, 0]);
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let results = fan_out(
            vec![1, 2, 3, 4, 5],
            FanOutLimits::new(5, Duration::from_secs(1)),
            |n| async move {
                if n % 2 == 0 {
                    Err(format!("boom {}", n))
                } else {
                    Ok(n)
                }
            },
        )
        .await;

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 3);
        assert!(matches!(&results[1], Err(TaskFailure::Failed(msg)) if msg == "boom 2"));
    }

    #[tokio::test]
    async fn test_timeout_and_panic_become_failures() {
        let results = fan_out(
            vec![0u8, 1, 2],
            FanOutLimits::new(3, Duration::from_millis(50)),
            |n| async move {
                match n {
                    0 => Ok::<_, String>(0),
                    1 => {
                        tokio::time::sleep(Duration::from_secs(5)).await;
                        Ok(1)
                    }
                    _ => panic!("bad input"),
                }
            },
        )
        .await;

        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(TaskFailure::TimedOut(_))));
        assert!(matches!(&results[2], Err(TaskFailure::Panicked(msg)) if msg == "bad input"));
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let (flight, high) = (Arc::clone(&in_flight), Arc::clone(&peak));
        fan_out(
            (0..12).collect(),
            FanOutLimits::new(3, Duration::from_secs(1)),
            move |_: i32| {
                let flight = Arc::clone(&flight);
                let high = Arc::clone(&high);
                async move {
                    let now = flight.fetch_add(1, Ordering::SeqCst) + 1;
                    high.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    flight.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, String>(())
                }
            },
        )
        .await;

        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_wall_clock_tracks_rounds_not_sum() {
        let start = Instant::now();
        fan_out(
            (0..6).collect(),
            FanOutLimits::new(6, Duration::from_secs(2)),
            |_: i32| async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok::<_, String>(())
            },
        )
        .await;
        assert!(start.elapsed() < Duration::from_millis(500));
    }
}
