use std::future::Future;
use std::time::{Duration, Instant};

/// Logs how long a scope took when it ends.
///
/// The duration is logged on drop, so early returns through `?` are timed too.
pub struct Timer {
    description: String,
    start_time: Instant,
}

impl Timer {
    pub fn start(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            start_time: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        tracing::info!("⏱️ {}: {:?}", self.description, self.start_time.elapsed());
    }
}

/// Awaits `future` and returns its output with the time it took.
pub async fn timed<F, T>(description: &str, future: F) -> (T, Duration)
where
    F: Future<Output = T>,
{
    let timer = Timer::start(description);
    let output = future.await;
    let elapsed = timer.elapsed();
    (output, elapsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timed_returns_output_and_duration() {
        let (value, elapsed) = timed("sleep", async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            42
        })
        .await;

        assert_eq!(value, 42);
        assert!(elapsed >= Duration::from_millis(20));
    }

    #[test]
    fn test_timer_elapsed_is_monotonic() {
        let timer = Timer::start("noop");
        let first = timer.elapsed();
        let second = timer.elapsed();
        assert!(second >= first);
    }
}
