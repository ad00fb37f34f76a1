use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::TenantId,
    protocol::{ApiErrorBody, CreateStoreAccepted, CreateStoreRequest, DeploymentStatusResponse},
};
use url::Url;

/// Seam over the two backend endpoints, so the controller and its tests do
/// not depend on a live HTTP server.
#[async_trait]
pub trait ProvisioningApi: Send + Sync {
    /// `POST /create-store`. A non-success response is an error carrying the
    /// backend's `error` message when one was provided.
    async fn create_store(&self, request: &CreateStoreRequest) -> Result<CreateStoreAccepted>;

    /// `GET /deployment-status/{tenant_id}`. Transport failures and
    /// non-success responses are plain errors; the caller decides whether
    /// they are fatal.
    async fn deployment_status(&self, tenant_id: &TenantId) -> Result<DeploymentStatusResponse>;
}

/// reqwest-backed implementation against a configured base URL.
pub struct HttpProvisioningApi {
    http: Client,
    base_url: Url,
}

impl HttpProvisioningApi {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid provisioning API base URL: {base_url}"))?;
        Ok(Self {
            http: Client::new(),
            base_url,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("invalid endpoint path: {path}"))
    }
}

#[async_trait]
impl ProvisioningApi for HttpProvisioningApi {
    async fn create_store(&self, request: &CreateStoreRequest) -> Result<CreateStoreAccepted> {
        let response = self
            .http
            .post(self.endpoint("create-store")?)
            .json(request)
            .send()
            .await
            .context("create-store request failed")?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| format!("create-store returned {status}"));
            return Err(anyhow!(message));
        }

        response
            .json::<CreateStoreAccepted>()
            .await
            .context("create-store response carried neither a tenant id nor a result")
    }

    async fn deployment_status(&self, tenant_id: &TenantId) -> Result<DeploymentStatusResponse> {
        let response = self
            .http
            .get(self.endpoint(&format!("deployment-status/{tenant_id}"))?)
            .send()
            .await
            .context("deployment-status request failed")?
            .error_for_status()
            .context("deployment-status returned non-success")?;

        response
            .json::<DeploymentStatusResponse>()
            .await
            .context("invalid deployment-status body")
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
