use std::time::Duration;

use crate::exec::RetryPolicy;

/// Tunables shared by every session a [`FlowRunner`](super::FlowRunner)
/// drives.
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    /// Delay between consecutive node executions, giving conversations a
    /// human pace. Zero disables pacing.
    pub pacing_delay: Duration,
    /// How long a session may sit in `WaitingForInput` before it fails.
    /// `None` waits forever.
    pub input_timeout: Option<Duration>,
    /// Maximum node executions per inbound event. Bounds authored cycles.
    pub step_budget: u32,
    /// Retry policy for HTTP and AI transport calls.
    pub retry: RetryPolicy,
    /// Ring-buffer capacity of the event hub.
    pub event_capacity: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            pacing_delay: Duration::from_millis(500),
            input_timeout: Some(Duration::from_secs(300)),
            step_budget: 256,
            retry: RetryPolicy::default(),
            event_capacity: 1024,
        }
    }
}

impl RunnerConfig {
    /// Defaults overridden by `CONVOFLOW_*` environment variables
    /// (`.env` files are honoured).
    ///
    /// - `CONVOFLOW_PACING_MS`: pacing delay in milliseconds
    /// - `CONVOFLOW_INPUT_TIMEOUT_SECS`: input timeout; `0` waits forever
    /// - `CONVOFLOW_STEP_BUDGET`: steps per inbound event
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        if let Some(ms) = read_env("CONVOFLOW_PACING_MS") {
            config.pacing_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = read_env("CONVOFLOW_INPUT_TIMEOUT_SECS") {
            config.input_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(budget) = read_env("CONVOFLOW_STEP_BUDGET") {
            config.step_budget = budget.max(1) as u32;
        }
        config
    }

    #[must_use]
    pub fn with_pacing(mut self, delay: Duration) -> Self {
        self.pacing_delay = delay;
        self
    }

    #[must_use]
    pub fn with_input_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.input_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_step_budget(mut self, budget: u32) -> Self {
        self.step_budget = budget.max(1);
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}

fn read_env(name: &str) -> Option<u64> {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(name, raw, "ignoring unparseable environment override");
                None
            }
        },
        Err(_) => None,
    }
}
