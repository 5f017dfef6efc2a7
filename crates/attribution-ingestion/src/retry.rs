//! Exponential backoff around a fallible sink write, grounded on
//! `qa-pms-testmo/src/client.rs`'s `with_retry` (fixed attempt count, delay
//! doubling each time).

use std::time::Duration;

/// Runs `attempt` up to `max_attempts` times, doubling `base_delay` after
/// each failure. Returns the last error if every attempt fails.
pub async fn with_retry<T, E, F, Fut>(
    max_attempts: u32,
    base_delay: Duration,
    label: &str,
    mut attempt: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut last_err = None;
    for n in 1..=max_attempts.max(1) {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if n < max_attempts {
                    let delay = base_delay * 2u32.pow(n - 1);
                    tracing::warn!(
                        target = label,
                        attempt = n,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "sink write failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                last_err = Some(err);
            }
        }
    }
    Err(last_err.expect("with_retry always records an error when every attempt fails"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_without_retry_when_first_attempt_works() {
        let calls = AtomicU32::new(0);
        let result: Result<i32, String> = with_retry(3, Duration::from_millis(1), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(7) }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);
        let result: Result<i32, String> = with_retry(3, Duration::from_millis(1), "test", || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err("transient".to_string())
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn returns_last_error_after_exhausting_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<i32, String> = with_retry(3, Duration::from_millis(1), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<i32, _>("permanent".to_string()) }
        })
        .await;
        assert_eq!(result.unwrap_err(), "permanent");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
