//! Wall-clock implementation of the `Clock` port.

use std::time::Duration;

use crate::application::ports::Clock;

pub struct TokioClock;

impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
