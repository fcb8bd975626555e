//! Connection settings for a remote repository.
//!
//! A `DispatchConfig` is an explicit value handed to transport construction;
//! nothing here touches process-wide state except `from_env`, which only
//! reads.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use token_dispatch_core::{DeliveryOptions, DEFAULT_EVENT_TYPE, DEFAULT_SIZE_BUDGET};

use crate::error::{DeliveryError, Result};

pub const ENV_TOKEN: &str = "FIGMA_GITHUB_TOKEN";
pub const ENV_REPO: &str = "TOKEN_DISPATCH_REPO";
pub const ENV_EVENT_TYPE: &str = "TOKEN_DISPATCH_EVENT_TYPE";
pub const ENV_SIZE_BUDGET: &str = "TOKEN_DISPATCH_SIZE_BUDGET";

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_USER_AGENT: &str = "token-dispatch";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Personal access token sent as `Authorization: token …`.
    pub token: String,
    /// `owner/repo` of the receiving repository.
    pub owner_repo: String,
    /// Event type the receiving workflow listens for. Agreed out of band;
    /// never probed.
    pub event_type: String,
    pub size_budget: usize,
    pub api_base: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            owner_repo: String::new(),
            event_type: DEFAULT_EVENT_TYPE.to_string(),
            size_budget: DEFAULT_SIZE_BUDGET,
            api_base: DEFAULT_API_BASE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl std::fmt::Debug for DispatchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchConfig")
            .field("token", &"[REDACTED]")
            .field("owner_repo", &self.owner_repo)
            .field("event_type", &self.event_type)
            .field("size_budget", &self.size_budget)
            .field("api_base", &self.api_base)
            .field("user_agent", &self.user_agent)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl DispatchConfig {
    pub fn new(token: impl Into<String>, owner_repo: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            owner_repo: owner_repo.into(),
            ..Default::default()
        }
    }

    /// Read settings from the process environment and validate them.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(token) = lookup(ENV_TOKEN) {
            config.token = token.trim().to_string();
        }
        if let Some(repo) = lookup(ENV_REPO) {
            config.owner_repo = repo.trim().to_string();
        }
        if let Some(event_type) = lookup(ENV_EVENT_TYPE) {
            config.event_type = event_type.trim().to_string();
        }
        if let Some(budget) = lookup(ENV_SIZE_BUDGET) {
            config.size_budget = budget.trim().parse().map_err(|_| {
                DeliveryError::Config(format!(
                    "{} must be a byte count, got {:?}",
                    ENV_SIZE_BUDGET, budget
                ))
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.token.is_empty() {
            return Err(DeliveryError::Config(format!("{} is not set", ENV_TOKEN)));
        }
        match self.owner_repo.split_once('/') {
            Some((owner, repo))
                if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {}
            _ => {
                return Err(DeliveryError::Config(format!(
                    "repository must look like owner/repo, got {:?}",
                    self.owner_repo
                )))
            }
        }
        if self.event_type.trim().is_empty() {
            return Err(DeliveryError::Config("event type must not be empty".to_string()));
        }
        if self.size_budget == 0 {
            return Err(DeliveryError::Config("size budget must be positive".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Selection options carrying this config's event type and budget.
    pub fn delivery_options(&self) -> DeliveryOptions {
        DeliveryOptions {
            event_type: self.event_type.clone(),
            size_budget: self.size_budget,
            ..Default::default()
        }
    }
}
