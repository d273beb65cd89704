//! Run poller: waits for a run to reach a terminal status.
//!
//! Sleeps a fixed interval, ticks the progress callback, re-fetches the run, and
//! repeats while the status is `queued` or `in_progress`. The body always runs at
//! least once. There is no timeout and no backoff: a run the service never finishes
//! keeps the caller waiting.

use std::time::Duration;

use crate::error::GatewayError;
use crate::gateway::AgentGateway;
use crate::model::Run;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy)]
pub struct RunPoller {
    interval: Duration,
}

impl Default for RunPoller {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl RunPoller {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Polls `run` until terminal and returns the final value.
    ///
    /// A failed or cancelled run is returned as `Ok`; only gateway errors are `Err`.
    /// `on_tick` runs once per fetch, before the fetch is issued.
    pub async fn wait(
        &self,
        gateway: &dyn AgentGateway,
        mut run: Run,
        mut on_tick: impl FnMut(),
    ) -> Result<Run, GatewayError> {
        let mut attempt: u64 = 0;
        loop {
            tokio::time::sleep(self.interval).await;
            on_tick();
            attempt += 1;
            run = gateway.get_run(&run.thread_id, &run.id).await?;
            tracing::debug!(run_id = %run.id, status = %run.status, attempt, "run polled");
            if run.status.is_terminal() {
                return Ok(run);
            }
        }
    }
}
