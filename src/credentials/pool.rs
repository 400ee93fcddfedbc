use crate::error::ConfigError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Show only the last four characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("***{}", tail)
}

#[derive(Clone)]
struct Credential {
    name: String,
    secret: String,
    ordinal: usize,
    usage_count: u64,
    exhausted: bool,
    last_used_at: Option<DateTime<Utc>>,
}

/// A handle to one pool entry, handed to quota-bound calls.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialLease {
    ordinal: usize,
    name: String,
    secret: String,
}

impl CredentialLease {
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn masked(&self) -> String {
        mask_secret(&self.secret)
    }
}

impl fmt::Debug for CredentialLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialLease")
            .field("ordinal", &self.ordinal)
            .field("name", &self.name)
            .field("secret", &self.masked())
            .finish()
    }
}

impl From<&Credential> for CredentialLease {
    fn from(credential: &Credential) -> Self {
        Self {
            ordinal: credential.ordinal,
            name: credential.name.clone(),
            secret: credential.secret.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CredentialStatus {
    pub name: String,
    pub masked_key: String,
    pub ordinal: usize,
    pub usage_count: u64,
    pub exhausted: bool,
    pub last_used_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub total: usize,
    pub available: usize,
    pub exhausted: usize,
}

struct PoolState {
    entries: Vec<Credential>,
    /// Ordinal of the key most recently handed out.
    active: usize,
}

/// Process-wide set of interchangeable YouTube API keys.
///
/// Every read and write goes through one mutex so two requests can never
/// race on exhaustion marking. The lock is never held across an `.await`.
pub struct CredentialPool {
    state: Mutex<PoolState>,
}

impl CredentialPool {
    pub fn new<I, S>(secrets: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries: Vec<Credential> = secrets
            .into_iter()
            .enumerate()
            .map(|(ordinal, secret)| Credential {
                name: format!("API_KEY_{}", ordinal + 1),
                secret: secret.into(),
                ordinal,
                usage_count: 0,
                exhausted: false,
                last_used_at: None,
            })
            .collect();

        if entries.is_empty() {
            return Err(ConfigError::NoCredentials);
        }

        tracing::info!("✅ {} YouTube API key(s) configured", entries.len());
        for entry in &entries {
            tracing::info!("   {}. {} ({})", entry.ordinal + 1, entry.name, mask_secret(&entry.secret));
        }

        Ok(Self {
            state: Mutex::new(PoolState { entries, active: 0 }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// First non-exhausted key in ordinal order. When every key is spent the
    /// first key is returned anyway so callers fail fast instead of waiting.
    pub fn current_usable(&self) -> CredentialLease {
        let mut state = self.lock();
        match state.entries.iter().position(|entry| !entry.exhausted) {
            Some(ordinal) => {
                state.active = ordinal;
                CredentialLease::from(&state.entries[ordinal])
            }
            None => {
                tracing::warn!("⚠️ Every API key is over quota, retrying with the first key");
                CredentialLease::from(&state.entries[0])
            }
        }
    }

    pub fn record_use(&self, lease: &CredentialLease) {
        let mut state = self.lock();
        if let Some(entry) = state.entries.get_mut(lease.ordinal) {
            entry.usage_count += 1;
            entry.last_used_at = Some(Utc::now());
            tracing::debug!("🔑 Using {} (uses: {})", entry.name, entry.usage_count);
        }
    }

    /// Flag `lease` as over quota and return the next usable key, if any.
    pub fn mark_exhausted(&self, lease: &CredentialLease) -> Option<CredentialLease> {
        let mut state = self.lock();
        if let Some(entry) = state.entries.get_mut(lease.ordinal) {
            if !entry.exhausted {
                tracing::warn!("❌ {} disabled: quota exceeded", entry.name);
            }
            entry.exhausted = true;
        }

        let next = state
            .entries
            .iter()
            .find(|entry| entry.ordinal != lease.ordinal && !entry.exhausted)
            .map(CredentialLease::from);

        match &next {
            Some(next) => {
                state.active = next.ordinal;
                tracing::info!("🔄 Switching to {}", next.name);
            }
            None => tracing::warn!("⚠️ No API keys left with remaining quota"),
        }

        next
    }

    pub fn snapshot(&self) -> Vec<CredentialStatus> {
        self.lock()
            .entries
            .iter()
            .map(|entry| CredentialStatus {
                name: entry.name.clone(),
                masked_key: mask_secret(&entry.secret),
                ordinal: entry.ordinal,
                usage_count: entry.usage_count,
                exhausted: entry.exhausted,
                last_used_at: entry.last_used_at,
            })
            .collect()
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.lock();
        let total = state.entries.len();
        let exhausted = state.entries.iter().filter(|entry| entry.exhausted).count();
        PoolStats {
            total,
            available: total - exhausted,
            exhausted,
        }
    }

    /// Name of the key most recently handed out.
    pub fn active_name(&self) -> String {
        let state = self.lock();
        state.entries[state.active].name.clone()
    }

    pub fn log_usage_stats(&self) {
        let active = self.active_name();
        let snapshot = self.snapshot();
        let stats = self.stats();

        tracing::info!("📊 API key usage:");
        for key in &snapshot {
            let last_used = key
                .last_used_at
                .map(|at| at.to_rfc3339())
                .unwrap_or_else(|| "never".to_string());
            tracing::info!(
                "   {} {}: {} | uses: {} | last used: {}{}",
                key.name,
                key.masked_key,
                if key.exhausted { "quota exceeded" } else { "available" },
                key.usage_count,
                last_used,
                if key.name == active { " (active)" } else { "" }
            );
        }
        tracing::info!("📈 {}/{} keys available", stats.available, stats.total);
    }
}
