use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::config::VerificationConfig;
use crate::error::VerifyError;

#[derive(Debug, Clone)]
pub struct ResendPolicy {
    pub max_attempts: u32,
    pub cooldown: Duration,
}

impl Default for ResendPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            cooldown: Duration::seconds(30),
        }
    }
}

impl ResendPolicy {
    pub fn from_settings(config: &VerificationConfig) -> Self {
        Self {
            max_attempts: config.max_resends,
            cooldown: Duration::seconds(config.resend_cooldown_secs),
        }
    }
}

#[derive(Debug)]
struct ResendState {
    attempts: u32,
    last_resend: Option<DateTime<Utc>>,
}

impl ResendState {
    fn new() -> Self {
        Self {
            attempts: 0,
            last_resend: None,
        }
    }
}

/// Session-keyed throttle on verification-email resends. State lives in
/// process memory and expires with the session, so the count is advisory: a
/// new session starts at zero. A single client racing concurrent resends can
/// slip past the check before `record` runs; accepted.
pub struct ResendThrottle {
    states: Arc<RwLock<HashMap<Uuid, ResendState>>>,
    policy: ResendPolicy,
}

impl ResendThrottle {
    pub fn new(policy: ResendPolicy) -> Self {
        Self {
            states: Arc::new(RwLock::new(HashMap::new())),
            policy,
        }
    }

    /// Gate for a resend request. The attempt cap is checked before the
    /// cooldown, so an exhausted session gets `ResendLimitExceeded` no matter
    /// how much time has passed.
    pub async fn check(&self, session_id: Uuid) -> Result<(), VerifyError> {
        self.check_at(session_id, Utc::now()).await
    }

    /// Commits a successful resend: bumps the attempt count and stamps the
    /// resend time.
    pub async fn record(&self, session_id: Uuid) {
        self.record_at(session_id, Utc::now()).await
    }

    async fn check_at(&self, session_id: Uuid, now: DateTime<Utc>) -> Result<(), VerifyError> {
        let states = self.states.read().await;
        let state = match states.get(&session_id) {
            Some(state) => state,
            None => return Ok(()),
        };

        if state.attempts >= self.policy.max_attempts {
            return Err(VerifyError::ResendLimitExceeded);
        }

        if let Some(last) = state.last_resend {
            let elapsed = now - last;
            if elapsed < self.policy.cooldown {
                let remaining = self.policy.cooldown - elapsed;
                // round up so the user never retries a second early
                let wait_secs = (remaining.num_milliseconds() + 999) / 1000;
                return Err(VerifyError::ResendTooSoon { wait_secs });
            }
        }

        Ok(())
    }

    async fn record_at(&self, session_id: Uuid, now: DateTime<Utc>) {
        let mut states = self.states.write().await;
        let state = states.entry(session_id).or_insert_with(ResendState::new);
        state.attempts += 1;
        state.last_resend = Some(now);
    }

    /// Drops states idle for longer than `max_idle`. Run periodically so
    /// abandoned sessions do not accumulate.
    pub async fn cleanup(&self, max_idle: Duration) {
        let cutoff = Utc::now() - max_idle;
        let mut states = self.states.write().await;
        states.retain(|_, state| match state.last_resend {
            Some(last) => last > cutoff,
            None => false,
        });
    }
}
