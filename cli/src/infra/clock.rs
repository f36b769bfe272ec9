//! Wall-clock implementation of the `Sleeper` port.

use std::time::{Duration, Instant};

use crate::application::ports::Sleeper;

pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}
