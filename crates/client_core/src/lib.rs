use std::sync::Arc;

use anyhow::{ensure, Result};
use shared::{
    domain::{DeploymentStatus, Phase, TenantId},
    protocol::{CreateStoreAccepted, CreateStoreRequest, DeploymentResult, DeploymentStatusResponse},
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::{interval, sleep_until, timeout, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

pub mod api;
pub mod config;
pub mod error;
pub mod progress;
pub mod reconcile;
pub mod validator;

pub use api::{HttpProvisioningApi, ProvisioningApi};
pub use config::ClientConfig;
pub use error::ProvisionError;
pub use reconcile::{DisplayState, ServerProgress, DISCLOSURE_FLOOR};
pub use validator::{validate_password, PasswordIssue};

use progress::{
    schedule_is_valid, schedule_total, FALLBACK_CAP, FALLBACK_STEP, STALL_TICK_THRESHOLD,
};
use reconcile::{disclosure_ready, reconcile};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Admin credentials for one submission. Consumed by [`ProvisioningClient::deploy`]
/// and never retained beyond the creation request.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// UI-facing notifications for one provisioning attempt.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    PhaseChanged(Phase),
    ProgressUpdated(DisplayState),
    /// Fired exactly once per operation, when the disclosure gate opens.
    ResultDisclosed(DeploymentResult),
    DeploymentFailed(String),
}

/// Everything mutable about the current operation. Guarded by one lock;
/// the timer, poller and fallback tasks all merge into it.
struct OperationState {
    /// Bumped on every hard reset. Tasks capture the value they were spawned
    /// under and bail out as soon as it no longer matches, so a late callback
    /// from a torn-down operation can never touch its successor.
    generation: u64,
    phase: Phase,
    tenant_id: Option<TenantId>,
    server: ServerProgress,
    local_percent: u8,
    result: Option<DeploymentResult>,
    disclosed: bool,
    transport_failures: u32,
    stalled_ticks: u32,
    fallback_armed: bool,
    started_at: Option<Instant>,
}

impl OperationState {
    fn new() -> Self {
        Self {
            generation: 0,
            phase: Phase::Idle,
            tenant_id: None,
            server: ServerProgress::default(),
            local_percent: 0,
            result: None,
            disclosed: false,
            transport_failures: 0,
            stalled_ticks: 0,
            fallback_armed: false,
            started_at: None,
        }
    }

    fn reset_to(&mut self, phase: Phase) {
        self.phase = phase;
        self.tenant_id = None;
        self.server = ServerProgress::default();
        self.local_percent = 0;
        self.result = None;
        self.disclosed = false;
        self.transport_failures = 0;
        self.stalled_ticks = 0;
        self.fallback_armed = false;
        self.started_at = None;
    }
}

#[derive(Default)]
struct TaskSet {
    timer: Option<JoinHandle<()>>,
    poller: Option<JoinHandle<()>>,
    fallback: Option<JoinHandle<()>>,
}

impl TaskSet {
    fn abort_all(&mut self) {
        for handle in [
            self.timer.take(),
            self.poller.take(),
            self.fallback.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }
    }

    fn abort_progress_producers(&mut self) {
        for handle in [self.timer.take(), self.fallback.take()]
            .into_iter()
            .flatten()
        {
            handle.abort();
        }
    }
}

enum TerminalReport {
    Completed { newly_disclosed: Option<DeploymentResult> },
    Failed { message: String },
}

/// Drives one provisioning attempt end to end: validate, submit, then merge
/// the simulated progress curve and the status feed until the result may be
/// disclosed.
///
/// Lock discipline: `tasks` before `inner`, never the other way around.
pub struct ProvisioningClient {
    api: Arc<dyn ProvisioningApi>,
    config: ClientConfig,
    inner: Mutex<OperationState>,
    tasks: Mutex<TaskSet>,
    events: broadcast::Sender<ClientEvent>,
}

impl ProvisioningClient {
    pub fn new(config: ClientConfig) -> Result<Arc<Self>> {
        let api = Arc::new(HttpProvisioningApi::new(&config.base_url)?);
        Self::new_with_api(config, api)
    }

    pub fn new_with_api(config: ClientConfig, api: Arc<dyn ProvisioningApi>) -> Result<Arc<Self>> {
        ensure!(
            schedule_is_valid(&config.milestones),
            "milestone schedule must be non-empty and strictly increasing"
        );
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Arc::new(Self {
            api,
            config,
            inner: Mutex::new(OperationState::new()),
            tasks: Mutex::new(TaskSet::default()),
            events,
        }))
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Current reconciled view of the operation.
    pub async fn snapshot(&self) -> DisplayState {
        let op = self.inner.lock().await;
        self.display_locked(&op)
    }

    /// How many status checks failed at the transport level and were retried.
    pub async fn transport_failures(&self) -> u32 {
        self.inner.lock().await.transport_failures
    }

    /// Validates, submits, and arms the progress machinery. Returns once the
    /// backend has accepted (or rejected) the creation request; progress and
    /// the final result are delivered through the event stream.
    pub async fn deploy(self: &Arc<Self>, credentials: Credentials) -> Result<(), ProvisionError> {
        let generation = {
            let mut tasks = self.tasks.lock().await;
            let mut op = self.inner.lock().await;
            let settled = op.phase;
            op.phase = Phase::Validating;
            if let Err(issue) = validate_password(&credentials.password) {
                // Rejected locally: the previous operation stays intact and
                // no network request is made.
                op.phase = settled;
                return Err(ProvisionError::Validation(issue));
            }
            tasks.abort_all();
            op.generation += 1;
            op.reset_to(Phase::Submitting);
            op.generation
        };
        self.emit(ClientEvent::PhaseChanged(Phase::Submitting));
        info!(email = %credentials.email, "submitting store creation request");

        let request = CreateStoreRequest {
            email: credentials.email,
            password: credentials.password,
        };
        let accepted = match timeout(self.config.submit_timeout, self.api.create_store(&request))
            .await
        {
            Err(_) => {
                return self
                    .fail_submission(generation, "store creation request timed out".to_string())
                    .await;
            }
            Ok(Err(err)) => return self.fail_submission(generation, err.to_string()).await,
            Ok(Ok(accepted)) => accepted,
        };

        match accepted {
            CreateStoreAccepted::Pending { tenant_id } => {
                {
                    let mut op = self.inner.lock().await;
                    if op.generation != generation {
                        return Ok(());
                    }
                    op.phase = Phase::Processing;
                    op.tenant_id = Some(tenant_id.clone());
                    op.started_at = Some(Instant::now());
                }
                self.emit(ClientEvent::PhaseChanged(Phase::Processing));
                info!(tenant = %tenant_id, "store creation accepted; deployment in progress");

                let mut tasks = self.tasks.lock().await;
                if self.inner.lock().await.generation != generation {
                    return Ok(());
                }
                tasks.timer = Some(self.spawn_timer(generation));
                tasks.poller = Some(self.spawn_poller(generation, tenant_id));
            }
            CreateStoreAccepted::Ready(result) => {
                {
                    let mut op = self.inner.lock().await;
                    if op.generation != generation {
                        return Ok(());
                    }
                    op.phase = Phase::Completed;
                    op.result = Some(result);
                    op.started_at = Some(Instant::now());
                }
                self.emit(ClientEvent::PhaseChanged(Phase::Completed));
                info!("store ready within the creation request; holding disclosure gate");

                // No polling, but the simulated curve still runs so a
                // sub-second response does not flash the credentials in.
                let mut tasks = self.tasks.lock().await;
                if self.inner.lock().await.generation != generation {
                    return Ok(());
                }
                tasks.timer = Some(self.spawn_timer(generation));
            }
        }
        Ok(())
    }

    /// "Deploy another": cancels every pending task and returns to `Idle`.
    pub async fn reset(&self) {
        {
            let mut tasks = self.tasks.lock().await;
            tasks.abort_all();
            let mut op = self.inner.lock().await;
            op.generation += 1;
            op.reset_to(Phase::Idle);
        }
        self.emit(ClientEvent::PhaseChanged(Phase::Idle));
        info!("operation reset");
    }

    /// Resolves when the current operation discloses its result or fails.
    pub async fn wait_for_outcome(&self) -> Result<DeploymentResult, ProvisionError> {
        let mut rx = self.events.subscribe();
        if let Some(outcome) = self.settled_outcome().await {
            return outcome;
        }
        loop {
            match rx.recv().await {
                Ok(ClientEvent::ResultDisclosed(result)) => return Ok(result),
                Ok(ClientEvent::DeploymentFailed(message)) => {
                    return Err(ProvisionError::Deployment(message));
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    if let Some(outcome) = self.settled_outcome().await {
                        return outcome;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(ProvisionError::Deployment("event stream closed".into()));
                }
            }
        }
    }

    async fn settled_outcome(&self) -> Option<Result<DeploymentResult, ProvisionError>> {
        let op = self.inner.lock().await;
        if op.disclosed {
            if let Some(result) = op.result.clone() {
                return Some(Ok(result));
            }
        }
        if op.phase == Phase::Error {
            let message = op
                .server
                .message
                .clone()
                .unwrap_or_else(|| "deployment failed".into());
            return Some(Err(ProvisionError::Deployment(message)));
        }
        None
    }

    fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }

    fn display_locked(&self, op: &OperationState) -> DisplayState {
        let total = schedule_total(&self.config.milestones);
        let elapsed = op
            .started_at
            .map(|started| started.elapsed())
            .unwrap_or_default();
        reconcile(
            op.phase,
            op.local_percent,
            &op.server,
            op.result.as_ref(),
            op.disclosed,
            progress::remaining_seconds(total, elapsed),
        )
    }

    async fn fail_submission(
        &self,
        generation: u64,
        message: String,
    ) -> Result<(), ProvisionError> {
        {
            let mut op = self.inner.lock().await;
            if op.generation != generation {
                // A newer submission took over while this one was in flight;
                // its failure must not touch the live operation's stream.
                debug!(error = %message, "discarding failure of a superseded submission");
                return Ok(());
            }
            op.phase = Phase::Error;
            op.server.message = Some(message.clone());
        }
        warn!(error = %message, "store creation rejected");
        self.emit(ClientEvent::PhaseChanged(Phase::Error));
        self.emit(ClientEvent::DeploymentFailed(message.clone()));
        Err(ProvisionError::Submission(message))
    }

    /// Merges a simulated-progress step, monotonic-max. Returns false when
    /// the operation this value belongs to is gone or has failed, which tells
    /// the producing task to stop.
    async fn apply_local_percent(&self, generation: u64, percent: u8) -> bool {
        let (display, newly_disclosed) = {
            let mut op = self.inner.lock().await;
            if op.generation != generation || op.phase == Phase::Error {
                return false;
            }
            if percent > op.local_percent {
                op.local_percent = percent.min(100);
            }
            let newly = !op.disclosed && disclosure_ready(op.local_percent, op.result.as_ref());
            if newly {
                op.disclosed = true;
            }
            (
                self.display_locked(&op),
                if newly { op.result.clone() } else { None },
            )
        };
        self.emit(ClientEvent::ProgressUpdated(display));
        if let Some(result) = newly_disclosed {
            info!(url = %result.url, "deployment result disclosed");
            self.emit(ClientEvent::ResultDisclosed(result));
        }
        true
    }

    /// Folds one status report into the operation. Returns true when polling
    /// should stop (terminal report or stale generation).
    async fn apply_status_report(
        self: &Arc<Self>,
        generation: u64,
        report: DeploymentStatusResponse,
    ) -> bool {
        let (display, terminal) = {
            let mut op = self.inner.lock().await;
            if op.generation != generation {
                return true;
            }
            op.server.merge(&report);
            let terminal = match report.status {
                DeploymentStatus::Processing => None,
                DeploymentStatus::Completed => {
                    if op.result.is_none() {
                        op.result = report.result;
                    }
                    if op.result.is_none() {
                        // Terminal but malformed: without credentials the gate
                        // can never open, so fail rather than hang the caller.
                        let message = "deployment completed without a result payload".to_string();
                        op.phase = Phase::Error;
                        op.server.message = Some(message.clone());
                        Some(TerminalReport::Failed { message })
                    } else {
                        op.phase = Phase::Completed;
                        let newly =
                            !op.disclosed && disclosure_ready(op.local_percent, op.result.as_ref());
                        if newly {
                            op.disclosed = true;
                        }
                        Some(TerminalReport::Completed {
                            newly_disclosed: if newly { op.result.clone() } else { None },
                        })
                    }
                }
                DeploymentStatus::Error => {
                    op.phase = Phase::Error;
                    let message = op
                        .server
                        .message
                        .clone()
                        .unwrap_or_else(|| "deployment failed".into());
                    Some(TerminalReport::Failed { message })
                }
            };
            (self.display_locked(&op), terminal)
        };
        self.emit(ClientEvent::ProgressUpdated(display));

        match terminal {
            None => false,
            Some(TerminalReport::Completed { newly_disclosed }) => {
                info!("deployment completed; awaiting disclosure gate");
                self.emit(ClientEvent::PhaseChanged(Phase::Completed));
                if let Some(result) = newly_disclosed {
                    info!(url = %result.url, "deployment result disclosed");
                    self.emit(ClientEvent::ResultDisclosed(result));
                }
                true
            }
            Some(TerminalReport::Failed { message }) => {
                // A failed deployment freezes the display: no simulated or
                // fallback motion after the error surfaces.
                {
                    let mut tasks = self.tasks.lock().await;
                    tasks.abort_progress_producers();
                }
                warn!(error = %message, "deployment reported failure");
                self.emit(ClientEvent::PhaseChanged(Phase::Error));
                self.emit(ClientEvent::DeploymentFailed(message));
                true
            }
        }
    }

    fn spawn_timer(self: &Arc<Self>, generation: u64) -> JoinHandle<()> {
        let client = Arc::clone(self);
        let milestones = self.config.milestones.clone();
        tokio::spawn(async move {
            let start = Instant::now();
            for milestone in milestones {
                sleep_until(start + milestone.at).await;
                if !client.apply_local_percent(generation, milestone.percent).await {
                    break;
                }
            }
        })
    }

    fn spawn_poller(self: &Arc<Self>, generation: u64, tenant_id: TenantId) -> JoinHandle<()> {
        let client = Arc::clone(self);
        let api = Arc::clone(&self.api);
        let period = self.config.poll_interval;
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if client.inner.lock().await.generation != generation {
                    break;
                }
                match api.deployment_status(&tenant_id).await {
                    Ok(report) => {
                        if client.apply_status_report(generation, report).await {
                            break;
                        }
                    }
                    Err(err) => {
                        // Transient by policy: tally and try again next tick.
                        let mut op = client.inner.lock().await;
                        if op.generation != generation {
                            break;
                        }
                        op.transport_failures += 1;
                        debug!(
                            tenant = %tenant_id,
                            failures = op.transport_failures,
                            "status check failed: {err}"
                        );
                    }
                }
                client.maybe_arm_fallback(generation).await;
            }
        })
    }

    /// Arms the safety-net generator after the bar has sat at zero for more
    /// than [`STALL_TICK_THRESHOLD`] polling cycles.
    async fn maybe_arm_fallback(self: &Arc<Self>, generation: u64) {
        let arm = {
            let mut op = self.inner.lock().await;
            if op.generation != generation || op.phase != Phase::Processing {
                return;
            }
            if op.local_percent > 0 {
                op.stalled_ticks = 0;
                return;
            }
            op.stalled_ticks += 1;
            if op.stalled_ticks > STALL_TICK_THRESHOLD && !op.fallback_armed {
                op.fallback_armed = true;
                true
            } else {
                false
            }
        };
        if !arm {
            return;
        }
        warn!("progress stalled at zero; arming fallback generator");
        let handle = self.spawn_fallback(generation);
        let mut tasks = self.tasks.lock().await;
        if self.inner.lock().await.generation == generation {
            tasks.fallback = Some(handle);
        } else {
            handle.abort();
        }
    }

    fn spawn_fallback(self: &Arc<Self>, generation: u64) -> JoinHandle<()> {
        let client = Arc::clone(self);
        let period = self.config.fallback_period;
        tokio::spawn(async move {
            let mut ticker = interval(period);
            // interval fires immediately; the first increment should wait
            // one full period.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let next = {
                    let op = client.inner.lock().await;
                    if op.generation != generation || op.phase != Phase::Processing {
                        break;
                    }
                    if op.local_percent >= FALLBACK_CAP {
                        break;
                    }
                    op.local_percent.saturating_add(FALLBACK_STEP).min(FALLBACK_CAP)
                };
                if !client.apply_local_percent(generation, next).await {
                    break;
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
