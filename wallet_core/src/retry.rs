//! Bounded polling for upstream calls that may fail transiently.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::WalletError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_interval_ms() -> u64 {
    100
}

fn default_max_attempts() -> u32 {
    50
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl RetryPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval_ms: interval.as_millis() as u64,
            max_attempts,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Run `op` until it succeeds, sleeping `interval` between attempts.
    ///
    /// Gives up with [`WalletError::RetryExhausted`] after `max_attempts`
    /// failures (at least one attempt is always made) and with
    /// [`WalletError::Cancelled`] as soon as `cancel` fires.
    pub async fn run<T, E, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<T, WalletError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let attempts = self.max_attempts.max(1);
        for attempt in 1..=attempts {
            if cancel.is_cancelled() {
                return Err(WalletError::Cancelled);
            }
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::warn!(attempt, max_attempts = attempts, error = %e, "attempt failed");
                }
            }
            if attempt < attempts {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(WalletError::Cancelled),
                    _ = tokio::time::sleep(self.interval()) => {}
                }
            }
        }
        Err(WalletError::RetryExhausted { attempts })
    }
}
