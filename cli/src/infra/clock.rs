//! Infrastructure implementation of the `Clock` port backed by `tokio::time`.

use std::time::{Duration, Instant};

use crate::application::ports::Clock;

/// Production clock backed by tokio timers.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
