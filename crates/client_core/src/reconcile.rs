use shared::{
    domain::Phase,
    protocol::{DeploymentResult, DeploymentStatusResponse},
};

/// Local percent at which a present result may be disclosed.
pub const DISCLOSURE_FLOOR: u8 = 99;

/// Last-known-value view of the status feed. Absent fields in a report never
/// erase earlier ones; the percent additionally never regresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerProgress {
    pub percent: Option<u8>,
    pub stage: Option<String>,
    pub message: Option<String>,
}

impl ServerProgress {
    pub fn merge(&mut self, report: &DeploymentStatusResponse) {
        if let Some(percent) = report.percent {
            let floor = self.percent.unwrap_or(0);
            self.percent = Some(floor.max(percent.min(100)));
        }
        if let Some(stage) = &report.stage {
            if !stage.is_empty() {
                self.stage = Some(stage.clone());
            }
        }
        if let Some(message) = &report.message {
            if !message.is_empty() {
                self.message = Some(message.clone());
            }
        }
    }
}

/// Everything the UI needs to render one provisioning attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayState {
    pub phase: Phase,
    /// The progress bar; driven by the simulated curve, monotonic.
    pub percent: u8,
    /// Backend-reported percent, shown as supplementary context only.
    pub server_percent: Option<u8>,
    pub stage: Option<String>,
    pub message: Option<String>,
    /// Advisory countdown; never used for gating.
    pub remaining_seconds: u64,
    /// Present only once disclosure has fired.
    pub result: Option<DeploymentResult>,
}

/// True exactly when both disclosure conditions hold, independent of which
/// one was satisfied first.
pub fn disclosure_ready(local_percent: u8, result: Option<&DeploymentResult>) -> bool {
    local_percent >= DISCLOSURE_FLOOR && result.is_some()
}

/// Folds the two progress producers and the disclosure decision into one
/// UI-facing value. Pure; the sticky `disclosed` flag is owned by the caller.
pub fn reconcile(
    phase: Phase,
    local_percent: u8,
    server: &ServerProgress,
    result: Option<&DeploymentResult>,
    disclosed: bool,
    remaining_seconds: u64,
) -> DisplayState {
    DisplayState {
        phase,
        percent: local_percent,
        server_percent: server.percent,
        stage: server.stage.clone(),
        message: server.message.clone(),
        remaining_seconds,
        result: if disclosed { result.cloned() } else { None },
    }
}

#[cfg(test)]
#[path = "tests/reconcile_tests.rs"]
mod tests;
