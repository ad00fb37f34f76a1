use std::time::Duration;

use crate::progress::{Milestone, DEFAULT_MILESTONES, FALLBACK_PERIOD};

/// Tunables for one `ProvisioningClient`.
///
/// Defaults match the production backend; tests inject compressed schedules
/// and intervals.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the provisioning API, no trailing slash.
    pub base_url: String,
    /// Delay between status checks after the immediate first one.
    pub poll_interval: Duration,
    /// Upper bound on the creation request itself; exceeding it is a
    /// submission failure.
    pub submit_timeout: Duration,
    /// Simulated progress curve; must satisfy
    /// [`crate::progress::schedule_is_valid`].
    pub milestones: Vec<Milestone>,
    /// Cadence of the fallback generator once armed.
    pub fallback_period: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".into(),
            poll_interval: Duration::from_secs(2),
            submit_timeout: Duration::from_secs(120),
            milestones: DEFAULT_MILESTONES.to_vec(),
            fallback_period: FALLBACK_PERIOD,
        }
    }
}

impl ClientConfig {
    /// Defaults with the API base URL taken from `BACKEND_URL` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(v) = std::env::var("BACKEND_URL") {
            if !v.trim().is_empty() {
                config.base_url = v.trim().trim_end_matches('/').to_string();
            }
        }
        config
    }
}
