use std::{
    future::Future,
    time::Duration,
};

use thiserror::Error;

/// The wrapped operation did not complete before the deadline.
#[derive(Error, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[error("operation timed out")]
pub struct TimedOut;

/// Races `produce_future` against `deadline`, rejecting with [`TimedOut`] if the deadline
/// elapses first.
///
/// On the success path, no timer is left running: `tokio::time::timeout` drops its internal
/// sleep as soon as either branch of the race completes.
pub async fn with_timeout<F, T>(produce_future: F, deadline: Duration) -> Result<T, TimedOut>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(deadline, produce_future)
        .await
        .map_err(|_| TimedOut)
}

#[cfg(test)]
mod with_timeout_test {
    use std::time::Duration;

    use super::{
        TimedOut,
        with_timeout,
    };

    #[tokio::test]
    async fn resolves_when_faster_than_deadline() {
        let result = with_timeout(async { 7 }, Duration::from_millis(50)).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn rejects_when_slower_than_deadline() {
        let result = with_timeout(
            async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                7
            },
            Duration::from_millis(10),
        )
        .await;
        assert_eq!(result, Err(TimedOut));
    }
}
