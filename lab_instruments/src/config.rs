use core::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the Qred exchange reacts to a reply that carries only a status word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RetryPolicy {
    /// Pause before the request is sent again
    pub backoff: Duration,
    /// `None` keeps retrying until the device answers
    pub max_retries: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            backoff: Duration::from_secs(1),
            max_retries: None,
        }
    }
}

impl RetryPolicy {
    /// Retry without pausing, mostly useful for tests and simulated devices
    pub fn immediate(max_retries: Option<u32>) -> Self {
        RetryPolicy {
            backoff: Duration::ZERO,
            max_retries,
        }
    }

    pub(crate) fn allows(&self, attempts_made: u32) -> bool {
        self.max_retries.map_or(true, |max| attempts_made < max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QredConfig {
    pub retry: RetryPolicy,
    /// Upper bound passed to every transport read, large enough for a full spectrum
    pub max_rx_len: usize,
}

impl Default for QredConfig {
    fn default() -> Self {
        QredConfig {
            retry: RetryPolicy::default(),
            max_rx_len: 16384,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FreedomConfig {
    /// Pixel count used as a communication check on open, `None` skips the check
    pub expected_pixel_count: Option<u16>,
}

impl Default for FreedomConfig {
    fn default() -> Self {
        FreedomConfig {
            expected_pixel_count: Some(2048),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RockConfig {
    /// Read size for regular command replies
    pub reply_len: usize,
    /// Read size for an ASCII spectrum
    pub spectrum_len: usize,
    /// Empty reads tolerated while waiting for the end-of-capture bell
    pub bell_poll_limit: u32,
}

impl Default for RockConfig {
    fn default() -> Self {
        RockConfig {
            reply_len: 100,
            spectrum_len: 6000,
            bell_poll_limit: 1000,
        }
    }
}
