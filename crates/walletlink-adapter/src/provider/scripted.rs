/*
[INPUT]:  A script of connect outcomes and optional artificial latency
[OUTPUT]: Deterministic WalletProvider for tests and simulations
[POS]:    Provider layer - scripted provider implementation
[UPDATE]: When tests need new provider behaviours
*/

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::provider::{ProviderError, WalletProvider};
use crate::types::ProviderAccount;

/// One scripted connect outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    Succeed,
    Fail(ProviderError),
}

/// Provider that replays a script of connect outcomes.
///
/// Once the script is exhausted every connect succeeds.
#[derive(Debug)]
pub struct ScriptedProvider {
    id: String,
    name: String,
    address: String,
    chain_id: Mutex<u64>,
    script: Mutex<VecDeque<ScriptStep>>,
    connect_delay: Duration,
    switch_delay: Duration,
    signature: String,
    sign_error: Option<ProviderError>,
    connect_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
    switch_calls: AtomicUsize,
    sign_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(id: &str, name: &str, address: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            address: address.to_string(),
            chain_id: Mutex::new(137),
            script: Mutex::new(VecDeque::new()),
            connect_delay: Duration::ZERO,
            switch_delay: Duration::ZERO,
            signature: "0xmock_signature".to_string(),
            sign_error: None,
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
            switch_calls: AtomicUsize::new(0),
            sign_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_chain_id(self, chain_id: u64) -> Self {
        *lock(&self.chain_id) = chain_id;
        self
    }

    pub fn with_script(self, steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        lock(&self.script).extend(steps);
        self
    }

    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    pub fn with_switch_delay(mut self, delay: Duration) -> Self {
        self.switch_delay = delay;
        self
    }

    pub fn with_signature(mut self, signature: &str) -> Self {
        self.signature = signature.to_string();
        self
    }

    pub fn with_sign_error(mut self, error: ProviderError) -> Self {
        self.sign_error = Some(error);
        self
    }

    /// Append a step to the remaining script
    pub fn push_step(&self, step: ScriptStep) {
        lock(&self.script).push_back(step);
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }

    pub fn switch_calls(&self) -> usize {
        self.switch_calls.load(Ordering::SeqCst)
    }

    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }

    pub fn chain_id(&self) -> u64 {
        *lock(&self.chain_id)
    }
}

#[async_trait]
impl WalletProvider for ScriptedProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&self) -> Result<ProviderAccount, ProviderError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        let step = lock(&self.script).pop_front().unwrap_or(ScriptStep::Succeed);
        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }

        match step {
            ScriptStep::Succeed => Ok(ProviderAccount::new(
                self.address.clone(),
                Some(self.chain_id()),
            )),
            ScriptStep::Fail(error) => Err(error),
        }
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<u64, ProviderError> {
        self.switch_calls.fetch_add(1, Ordering::SeqCst);
        if !self.switch_delay.is_zero() {
            tokio::time::sleep(self.switch_delay).await;
        }
        *lock(&self.chain_id) = chain_id;
        Ok(chain_id)
    }

    async fn sign_message(&self, _address: &str, _message: &str) -> Result<String, ProviderError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        match &self.sign_error {
            Some(error) => Err(error.clone()),
            None => Ok(self.signature.clone()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
