use serde::{Deserialize, Serialize};

use crate::domain::{DeploymentStatus, TenantId};

/// Body of `POST /create-store`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStoreRequest {
    pub email: String,
    pub password: String,
}

/// Endpoint URLs and generated credentials for a finished deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentResult {
    pub url: String,
    pub admin_url: String,
    pub admin_email: String,
    pub admin_password: String,
}

/// Successful `POST /create-store` body.
///
/// The backend answers in one of two shapes: a tenant id when provisioning
/// continues asynchronously, or the finished result when the store was ready
/// within the request itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CreateStoreAccepted {
    Pending { tenant_id: TenantId },
    Ready(DeploymentResult),
}

/// Non-success `POST /create-store` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
}

/// Body of `GET /deployment-status/{tenant_id}`.
///
/// `status` is always present; every other field is optional and means
/// "unchanged since the last report" when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentStatusResponse {
    pub status: DeploymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<DeploymentResult>,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
