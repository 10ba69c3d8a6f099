//! Channel manager orchestrating per-branch commands and pairing polls.
//!
//! Translates the dashboard's four intents (connect, disconnect, refresh,
//! clear session) into backend calls and advances each branch's
//! [`BranchChannelState`] from the backend's reported status. While a
//! pairing code is outstanding, a cancellable poll task re-reads the status
//! route until the channel settles.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::{Mutex, RwLock, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use lockerhub_config::DashboardConfig;
use lockerhub_gateway::Client;
use lockerhub_protocol::constants::QR_POLL_INTERVAL;
use lockerhub_protocol::{ChannelStatus, ChannelStatusReport};

use crate::state::BranchChannelState;
use crate::types::{ChannelAction, ChannelEvent, CommandError};

/// Shared handles cloned into poll tasks. Avoids threading six separate
/// `Arc` parameters through free functions.
#[derive(Clone)]
struct ManagerInner {
    gateway: Arc<Client>,
    poll_interval: Duration,
    states: Arc<RwLock<HashMap<String, BranchChannelState>>>,
    /// One command mutex per branch; commands and poll ticks serialize on it
    /// so a stale response can never overwrite a newer command's state.
    branch_locks: Arc<StdMutex<HashMap<String, Arc<Mutex<()>>>>>,
    /// One cancellation token per live poll; replaced, never leaked.
    polls: Arc<StdMutex<HashMap<String, CancellationToken>>>,
    events_tx: mpsc::Sender<ChannelEvent>,
}

/// Manager for the WhatsApp channels of all branches.
pub struct ChannelManager {
    inner: ManagerInner,
    events_rx: Mutex<Option<mpsc::Receiver<ChannelEvent>>>,
}

impl ChannelManager {
    /// Creates a manager over the given gateway client, polling at the
    /// production cadence.
    pub fn new(gateway: Client) -> Self {
        let (events_tx, events_rx) = mpsc::channel(64);

        Self {
            inner: ManagerInner {
                gateway: Arc::new(gateway),
                poll_interval: QR_POLL_INTERVAL,
                states: Arc::new(RwLock::new(HashMap::new())),
                branch_locks: Arc::new(StdMutex::new(HashMap::new())),
                polls: Arc::new(StdMutex::new(HashMap::new())),
                events_tx,
            },
            events_rx: Mutex::new(Some(events_rx)),
        }
    }

    /// Builds the gateway client from dashboard configuration.
    pub fn from_config(config: &DashboardConfig) -> Result<Self, lockerhub_gateway::Error> {
        let token = (!config.api_token.is_empty()).then_some(config.api_token.as_str());
        Ok(Self::new(Client::new(config.api_base_url.clone(), token)?))
    }

    /// Overrides the poll cadence (tests; production uses 5 s).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.inner.poll_interval = interval;
        self
    }

    /// Takes the event receiver. Can only be called once.
    pub async fn take_events(&self) -> Option<mpsc::Receiver<ChannelEvent>> {
        self.events_rx.lock().await.take()
    }

    /// Seeds default (disconnected) state records for a freshly loaded
    /// branch list. Already-tracked branches are left untouched.
    pub async fn track_branches(&self, ids: impl IntoIterator<Item = String>) {
        let mut states = self.inner.states.write().await;
        let mut added = 0usize;
        for id in ids {
            states.entry(id).or_insert_with(|| {
                added += 1;
                BranchChannelState::default()
            });
        }
        debug!(added, total = states.len(), "tracking branches");
    }

    /// All branch ids with a state record, sorted.
    pub async fn tracked_branches(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.states.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// The current state of a branch. Untracked branches read as the
    /// default disconnected state.
    pub async fn state(&self, branch_id: &str) -> BranchChannelState {
        self.inner.snapshot(branch_id).await
    }

    /// Whether a pairing poll task is live for the branch.
    pub fn has_active_poll(&self, branch_id: &str) -> bool {
        self.inner
            .polls
            .lock()
            .unwrap()
            .get(branch_id)
            .is_some_and(|token| !token.is_cancelled())
    }

    /// Starts the branch's channel.
    ///
    /// Returns `Err` only for the client-side rejection while pairing is
    /// already underway; a backend failure settles into the returned state
    /// (`Error` status, `last_error` set) instead of propagating.
    pub async fn connect(&self, branch_id: &str) -> Result<BranchChannelState, CommandError> {
        let lock = self.inner.branch_lock(branch_id);
        let _guard = lock.lock().await;

        let current = self.inner.snapshot(branch_id).await;
        if matches!(
            current.status,
            ChannelStatus::Connecting | ChannelStatus::QrPending
        ) {
            return Err(CommandError::PairingInProgress {
                branch_id: branch_id.to_string(),
            });
        }

        self.inner.cancel_poll(branch_id);
        {
            let mut states = self.inner.states.write().await;
            let state = states.entry(branch_id.to_string()).or_default();
            state.busy = true;
            state.pairing_payload = None;
            state.last_error = None;
        }

        match self.inner.gateway.connect(branch_id).await {
            Ok(ack) => {
                info!(branch = %branch_id, message = %ack.message, "channel connect accepted");
                // The backend may already be in qr_pending or connected.
                Ok(self.inner.refresh_locked(branch_id).await)
            }
            Err(e) => {
                warn!(branch = %branch_id, error = %e, "channel connect failed");
                Ok(self
                    .inner
                    .fail_branch(branch_id, ChannelAction::Connect, e.to_string())
                    .await)
            }
        }
    }

    /// Tears the branch's channel down. Idempotent: disconnecting an
    /// already-disconnected branch settles back into `Disconnected`.
    pub async fn disconnect(&self, branch_id: &str) -> BranchChannelState {
        self.command_teardown(branch_id, ChannelAction::Disconnect)
            .await
    }

    /// Deletes the branch's stored session so the next connect requires a
    /// fresh pairing. Stronger than [`disconnect`](Self::disconnect).
    pub async fn clear_session(&self, branch_id: &str) -> BranchChannelState {
        self.command_teardown(branch_id, ChannelAction::ClearSession)
            .await
    }

    /// Re-reads the branch's status from the backend and applies the
    /// transition policy (start or stop the pairing poll as needed).
    pub async fn refresh_status(&self, branch_id: &str) -> BranchChannelState {
        let lock = self.inner.branch_lock(branch_id);
        let _guard = lock.lock().await;
        self.inner.refresh_locked(branch_id).await
    }

    /// Cancels the branch's pairing poll, if any. Called when the operator
    /// closes the pairing-code dialog without scanning.
    pub fn cancel_poll(&self, branch_id: &str) {
        self.inner.cancel_poll(branch_id);
    }

    /// Cancels every active pairing poll. Called when the dashboard view
    /// unmounts. Idempotent.
    pub fn shutdown(&self) {
        let mut polls = self.inner.polls.lock().unwrap();
        for (branch, token) in polls.drain() {
            token.cancel();
            debug!(branch = %branch, "pairing poll cancelled");
        }
        info!("channel manager shut down");
    }

    /// Shared body of `disconnect` and `clear_session`: both cancel the
    /// poll, issue their command, and settle the state — differing only in
    /// the route and in how a failure is reconciled.
    async fn command_teardown(&self, branch_id: &str, action: ChannelAction) -> BranchChannelState {
        let lock = self.inner.branch_lock(branch_id);
        let _guard = lock.lock().await;

        self.inner.cancel_poll(branch_id);
        self.inner.set_busy(branch_id, true).await;

        let result = if matches!(action, ChannelAction::Disconnect) {
            self.inner.gateway.disconnect(branch_id).await
        } else {
            self.inner.gateway.clear_session(branch_id).await
        };

        match result {
            Ok(ack) => {
                info!(branch = %branch_id, message = %ack.message, "channel {action} succeeded");
                self.inner.mark_disconnected(branch_id).await
            }
            Err(e) => {
                warn!(branch = %branch_id, error = %e, "channel {action} failed");
                // Keep the prior status, record the failure, then reconcile
                // with backend truth so local state never silently diverges.
                {
                    let mut states = self.inner.states.write().await;
                    let state = states.entry(branch_id.to_string()).or_default();
                    state.last_error = Some(e.to_string());
                    state.busy = false;
                }
                self.inner.emit(ChannelEvent::CommandFailed {
                    branch_id: branch_id.to_string(),
                    action,
                    message: e.to_string(),
                });
                self.inner.refresh_locked(branch_id).await
            }
        }
    }
}

impl ManagerInner {
    /// The per-branch command mutex, created on first use.
    fn branch_lock(&self, branch_id: &str) -> Arc<Mutex<()>> {
        self.branch_locks
            .lock()
            .unwrap()
            .entry(branch_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn snapshot(&self, branch_id: &str) -> BranchChannelState {
        self.states
            .read()
            .await
            .get(branch_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn set_busy(&self, branch_id: &str, busy: bool) {
        let mut states = self.states.write().await;
        states.entry(branch_id.to_string()).or_default().busy = busy;
    }

    fn emit(&self, event: ChannelEvent) {
        if let Err(e) = self.events_tx.try_send(event) {
            debug!("dropping channel event: {e}");
        }
    }

    /// Fetches the branch status and applies the transition policy. The
    /// caller must hold the branch's command mutex.
    async fn refresh_locked(&self, branch_id: &str) -> BranchChannelState {
        self.set_busy(branch_id, true).await;

        match self.gateway.status(branch_id).await {
            Ok(report) => {
                let snapshot = self.apply_report(branch_id, &report).await;
                if report.status == ChannelStatus::QrPending && report.qr_code.is_some() {
                    self.ensure_poll(branch_id);
                } else if report.status.is_terminal_for_poll() {
                    self.cancel_poll(branch_id);
                }
                snapshot
            }
            Err(e) => {
                warn!(branch = %branch_id, error = %e, "status refresh failed");
                self.cancel_poll(branch_id);
                self.fail_branch(branch_id, ChannelAction::Refresh, e.to_string())
                    .await
            }
        }
    }

    /// Applies a backend report atomically and emits the resulting events.
    async fn apply_report(
        &self,
        branch_id: &str,
        report: &ChannelStatusReport,
    ) -> BranchChannelState {
        let (snapshot, events) = {
            let mut states = self.states.write().await;
            let state = states.entry(branch_id.to_string()).or_default();
            let prev_status = state.status;
            let prev_payload = state.pairing_payload.take();

            state.apply_report(report);
            state.busy = false;

            let mut events = Vec::new();
            if state.status != prev_status {
                events.push(ChannelEvent::StatusChanged {
                    branch_id: branch_id.to_string(),
                    status: state.status,
                });
            }
            // Announce the code once per payload; a rotated code fires again.
            if let Some(payload) = &state.pairing_payload
                && prev_payload.as_deref() != Some(payload.as_str())
            {
                events.push(ChannelEvent::PairingReady {
                    branch_id: branch_id.to_string(),
                    qr_code: payload.clone(),
                });
            }
            (state.clone(), events)
        };

        for event in events {
            self.emit(event);
        }
        snapshot
    }

    /// Settles a failed operation into the `Error` status and surfaces it.
    async fn fail_branch(
        &self,
        branch_id: &str,
        action: ChannelAction,
        message: String,
    ) -> BranchChannelState {
        let (snapshot, changed) = {
            let mut states = self.states.write().await;
            let state = states.entry(branch_id.to_string()).or_default();
            let prev_status = state.status;
            state.apply_failure(message.clone());
            (state.clone(), prev_status != ChannelStatus::Error)
        };

        if changed {
            self.emit(ChannelEvent::StatusChanged {
                branch_id: branch_id.to_string(),
                status: ChannelStatus::Error,
            });
        }
        self.emit(ChannelEvent::CommandFailed {
            branch_id: branch_id.to_string(),
            action,
            message,
        });
        snapshot
    }

    /// Settles a successful teardown into `Disconnected`.
    async fn mark_disconnected(&self, branch_id: &str) -> BranchChannelState {
        let (snapshot, changed) = {
            let mut states = self.states.write().await;
            let state = states.entry(branch_id.to_string()).or_default();
            let prev_status = state.status;
            state.apply_disconnected();
            (state.clone(), prev_status != ChannelStatus::Disconnected)
        };

        if changed {
            self.emit(ChannelEvent::StatusChanged {
                branch_id: branch_id.to_string(),
                status: ChannelStatus::Disconnected,
            });
        }
        snapshot
    }

    /// Starts a poll task for the branch unless one is already live.
    fn ensure_poll(&self, branch_id: &str) {
        let mut polls = self.polls.lock().unwrap();
        if let Some(token) = polls.get(branch_id)
            && !token.is_cancelled()
        {
            return;
        }

        let token = CancellationToken::new();
        polls.insert(branch_id.to_string(), token.clone());

        let inner = self.clone();
        let branch = branch_id.to_string();
        tokio::spawn(async move {
            inner.poll_loop(branch, token).await;
        });
    }

    /// Cancels the branch's poll task, if any.
    fn cancel_poll(&self, branch_id: &str) {
        if let Some(token) = self.polls.lock().unwrap().remove(branch_id) {
            token.cancel();
            debug!(branch = %branch_id, "pairing poll cancelled");
        }
    }

    /// Re-reads the branch status at a fixed interval until cancelled or
    /// until a refresh observes a terminal status (which cancels the token).
    async fn poll_loop(self, branch_id: String, cancel: CancellationToken) {
        debug!(branch = %branch_id, interval = ?self.poll_interval, "pairing poll started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }

            let lock = self.branch_lock(&branch_id);
            let _guard = lock.lock().await;
            // A command may have superseded this poll while we waited.
            if cancel.is_cancelled() {
                break;
            }
            self.refresh_locked(&branch_id).await;
        }
        debug!(branch = %branch_id, "pairing poll stopped");
    }
}
