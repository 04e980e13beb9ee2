/*
[INPUT]:  Failed attempts per wallet type and the retry policy
[OUTPUT]: Retry grants with backoff delays, or denials once the budget is spent
[POS]:    Recovery layer - bounded exponential backoff bookkeeping
[UPDATE]: When retry limits or the backoff curve change
*/

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use walletlink_adapter::WalletType;

pub const MAX_RETRIES: u32 = 3;
pub const BASE_DELAY_MS: u64 = 1500;
pub const MAX_DELAY_MS: u64 = 8000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_delay_ms: BASE_DELAY_MS,
            max_delay_ms: MAX_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    /// `min(base * 2^attempts_so_far, max)`
    pub fn backoff_delay(&self, attempts_so_far: u32) -> Duration {
        let factor = 1u64.checked_shl(attempts_so_far).unwrap_or(u64::MAX);
        let millis = self
            .base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);
        Duration::from_millis(millis)
    }
}

/// A granted retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryTicket {
    pub wallet_type: WalletType,
    /// 1-based retry number
    pub attempt: u32,
    pub max: u32,
    pub delay: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("retry budget exhausted for {wallet_type} after {attempts} retries")]
pub struct RetryDenied {
    pub wallet_type: WalletType,
    pub attempts: u32,
}

/// Per-wallet-type retry counters.
///
/// Counters only reset on a successful connection for that key, so a later
/// manual attempt inherits the previous failure count.
#[derive(Debug, Clone, Default)]
pub struct RetryScheduler {
    policy: RetryPolicy,
    counters: HashMap<WalletType, u32>,
}

impl RetryScheduler {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            counters: HashMap::new(),
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn count(&self, wallet_type: WalletType) -> u32 {
        self.counters.get(&wallet_type).copied().unwrap_or(0)
    }

    pub fn should_retry(&self, wallet_type: WalletType) -> bool {
        self.count(wallet_type) < self.policy.max_retries
    }

    /// Consume one retry from the budget and compute its delay
    pub fn schedule(&mut self, wallet_type: WalletType) -> Result<RetryTicket, RetryDenied> {
        let current = self.count(wallet_type);
        if current >= self.policy.max_retries {
            return Err(RetryDenied {
                wallet_type,
                attempts: current,
            });
        }

        let next = current + 1;
        self.counters.insert(wallet_type, next);
        Ok(RetryTicket {
            wallet_type,
            attempt: next,
            max: self.policy.max_retries,
            delay: self.policy.backoff_delay(current),
        })
    }

    pub fn reset(&mut self, wallet_type: WalletType) {
        self.counters.remove(&wallet_type);
    }
}
