use thiserror::Error;

use crate::validator::PasswordIssue;

/// Fatal outcomes of a provisioning attempt.
///
/// Transient status-poll failures are deliberately absent: a failed status
/// check is tallied and retried on the next tick, never surfaced.
#[derive(Debug, Clone, Error)]
pub enum ProvisionError {
    /// Password rejected locally; no network request was made.
    #[error("{0}")]
    Validation(#[from] PasswordIssue),
    /// The creation request failed, timed out, or returned an unusable body.
    /// The attempt is over; the user must resubmit.
    #[error("store creation failed: {0}")]
    Submission(String),
    /// The backend explicitly reported a failed deployment. The message is
    /// shown verbatim.
    #[error("deployment failed: {0}")]
    Deployment(String),
}
