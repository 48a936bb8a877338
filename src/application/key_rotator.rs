//! API key selection, usage tracking and quota failover

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::provider::{now_unix, ApiKey, ProviderId, RotationMode};

/// Key selection errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RotationError {
    #[error("No active API key for {provider}")]
    NoActiveKey { provider: ProviderId },

    #[error("All API keys for {provider} are exhausted")]
    AllExhausted { provider: ProviderId },
}

/// How keys are chosen and failed over
#[derive(Debug, Clone)]
pub struct RotationPolicy {
    /// Fail over to the next key on a quota signal
    pub auto_switch: bool,
    pub mode: RotationMode,
    /// How long a key that hit its quota is skipped
    pub quota_cooldown: Duration,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            auto_switch: true,
            mode: RotationMode::RoundRobin,
            quota_cooldown: Duration::from_secs(60),
        }
    }
}

/// A key chosen for one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedKey {
    pub index: usize,
    pub secret: String,
    pub label: String,
}

/// Display row for one key; never carries the secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStatus {
    pub label: String,
    pub masked: String,
    pub active: bool,
    pub exhausted: bool,
    pub uses_24h: usize,
}

#[derive(Debug, Default)]
struct KeyPool {
    keys: Vec<ApiKey>,
    exhausted_until: Vec<Option<Instant>>,
    cursor: usize,
}

impl KeyPool {
    fn new(keys: Vec<ApiKey>) -> Self {
        let exhausted_until = vec![None; keys.len()];
        Self {
            keys,
            exhausted_until,
            cursor: 0,
        }
    }

    fn usable(&self, index: usize) -> bool {
        let key = &self.keys[index];
        key.active && key.is_configured()
    }

    fn is_exhausted(&self, index: usize, now: Instant) -> bool {
        matches!(self.exhausted_until[index], Some(until) if until > now)
    }
}

/// Per-provider key pools with a round-robin cursor.
///
/// All mutation goes through `&self` behind a mutex; readers get copies.
#[derive(Debug)]
pub struct ApiKeyRotator {
    pools: Mutex<HashMap<ProviderId, KeyPool>>,
    policy: RotationPolicy,
}

impl ApiKeyRotator {
    pub fn new(policy: RotationPolicy) -> Self {
        Self {
            pools: Mutex::new(HashMap::new()),
            policy,
        }
    }

    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ProviderId, KeyPool>> {
        self.pools.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace a provider's keys, resetting cursor and exhaustion marks
    pub fn update_pool(&self, provider: ProviderId, keys: Vec<ApiKey>) {
        self.lock().insert(provider, KeyPool::new(keys));
    }

    /// Next usable key at or after the cursor.
    ///
    /// Inactive and placeholder keys are skipped, as are keys still inside
    /// their quota cooldown.
    pub fn select_key(&self, provider: ProviderId) -> Result<SelectedKey, RotationError> {
        let mut pools = self.lock();
        let pool = pools
            .get_mut(&provider)
            .ok_or(RotationError::NoActiveKey { provider })?;

        let len = pool.keys.len();
        if !(0..len).any(|i| pool.usable(i)) {
            return Err(RotationError::NoActiveKey { provider });
        }

        let now = Instant::now();
        for offset in 0..len {
            let index = (pool.cursor + offset) % len;
            if !pool.usable(index) {
                continue;
            }
            if pool.is_exhausted(index, now) {
                continue;
            }
            pool.exhausted_until[index] = None;
            pool.cursor = index;

            let key = &pool.keys[index];
            return Ok(SelectedKey {
                index,
                secret: key.key.clone(),
                label: key.display_label(index),
            });
        }

        Err(RotationError::AllExhausted { provider })
    }

    /// Record a successful call: timestamp the key and, in round-robin
    /// mode, move the cursor on
    pub fn record_usage(&self, provider: ProviderId, index: usize) {
        let mut pools = self.lock();
        let Some(pool) = pools.get_mut(&provider) else {
            return;
        };
        let Some(key) = pool.keys.get_mut(index) else {
            return;
        };
        key.record_usage(now_unix());
        debug!(%provider, key = %key.display_label(index), "usage recorded");

        if self.policy.mode == RotationMode::RoundRobin && !pool.keys.is_empty() {
            pool.cursor = (index + 1) % pool.keys.len();
        }
    }

    /// Mark a key exhausted for the cooldown and advance past it.
    ///
    /// The key stays in the pool and becomes selectable again once the
    /// cooldown has passed.
    pub fn on_quota_error(&self, provider: ProviderId, index: usize) {
        let mut pools = self.lock();
        let Some(pool) = pools.get_mut(&provider) else {
            return;
        };
        if index >= pool.keys.len() {
            return;
        }
        pool.exhausted_until[index] = Some(Instant::now() + self.policy.quota_cooldown);
        pool.cursor = (index + 1) % pool.keys.len();
        warn!(
            %provider,
            key = %pool.keys[index].display_label(index),
            cooldown_secs = self.policy.quota_cooldown.as_secs(),
            "API key hit its quota"
        );
    }

    /// Copy of a provider's keys including usage history
    pub fn snapshot(&self, provider: ProviderId) -> Vec<ApiKey> {
        self.lock()
            .get(&provider)
            .map(|pool| pool.keys.clone())
            .unwrap_or_default()
    }

    /// Display rows for a provider's keys
    pub fn status(&self, provider: ProviderId) -> Vec<KeyStatus> {
        let pools = self.lock();
        let Some(pool) = pools.get(&provider) else {
            return Vec::new();
        };
        let now = Instant::now();
        let now_ts = now_unix();
        pool.keys
            .iter()
            .enumerate()
            .map(|(index, key)| KeyStatus {
                label: key.display_label(index),
                masked: key.masked(),
                active: key.active,
                exhausted: pool.is_exhausted(index, now),
                uses_24h: key.usage_count(now_ts),
            })
            .collect()
    }
}
