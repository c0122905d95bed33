// ── Hub client ──
//
// Full lifecycle of the connection to one hub: open the socket,
// authenticate, subscribe, request a snapshot, then keep the cache current
// from events. Drops go through the reconnect policy. Everything the UI
// needs to hear about travels through the `HubEvent` channel.

use std::sync::{Arc, Mutex};

use haui_api::protocol::STATE_CHANGED;
use haui_api::{InboundMessage, OutboundMessage, ResultError, Session, SessionEvent, SessionSender};
use secrecy::ExposeSecret;
use serde_json::{Map, Value};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::{Command, ServiceCall};
use crate::config::HubConfig;
use crate::correlation::{Correlator, RequestKind};
use crate::debounce::Debouncer;
use crate::error::CoreError;
use crate::event::HubEvent;
use crate::model::EntityId;
use crate::reconnect::ReconnectPolicy;
use crate::store::{Reconciler, StateCache};

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    /// Socket open, access token not yet accepted.
    Connected,
    Authenticated,
}

impl ConnectionState {
    /// Whether a socket is open (authenticated or not).
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected | Self::Authenticated)
    }
}

// ── HubClient ────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<HubInner>`. Must be used inside a Tokio
/// runtime: connecting and debouncing spawn background tasks.
#[derive(Clone)]
pub struct HubClient {
    inner: Arc<HubInner>,
}

struct HubInner {
    config: HubConfig,
    cache: Arc<StateCache>,
    correlator: Correlator,
    connection_state: watch::Sender<ConnectionState>,
    /// Writer handle of the live session, if any.
    session: watch::Sender<Option<SessionSender>>,
    events_tx: mpsc::UnboundedSender<HubEvent>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<HubEvent>>>,
    reconnect: ReconnectPolicy,
    debouncer: Debouncer,
    cancel: CancellationToken,
}

impl HubClient {
    /// Create a client. Does NOT connect; call [`connect()`](Self::connect).
    pub fn new(config: HubConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (session, _) = watch::channel(None);
        let cancel = CancellationToken::new();

        Self {
            inner: Arc::new(HubInner {
                cache: Arc::new(StateCache::new(events_tx.clone())),
                correlator: Correlator::new(),
                connection_state,
                session,
                events_tx,
                events_rx: Mutex::new(Some(events_rx)),
                reconnect: ReconnectPolicy::new(config.reconnect_delay, cancel.child_token()),
                debouncer: Debouncer::new(config.debounce),
                cancel,
                config,
            }),
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    pub fn cache(&self) -> &Arc<StateCache> {
        &self.inner.cache
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.connection_state.borrow()
    }

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// Take the update channel. Only the first caller gets it.
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<HubEvent>> {
        self.inner.events_rx.lock().ok()?.take()
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Open a session on a background task.
    ///
    /// Returns immediately. Does nothing while a session is connecting or
    /// connected, or after [`shutdown()`](Self::shutdown).
    pub fn connect(&self) {
        if self.inner.cancel.is_cancelled() {
            debug!("client shut down, not connecting");
            return;
        }

        let claimed = self.inner.connection_state.send_if_modified(|state| {
            if *state == ConnectionState::Disconnected {
                *state = ConnectionState::Connecting;
                true
            } else {
                false
            }
        });
        if !claimed {
            debug!(state = %self.state(), "connect ignored, session already active");
            return;
        }

        info!(url = %self.inner.config.ws_url, "connecting to hub");
        let (session_tx, session_rx) = mpsc::unbounded_channel();
        let sender = Session::spawn(
            self.inner.config.ws_url.clone(),
            session_tx,
            self.inner.cancel.child_token(),
        );
        self.inner.session.send_replace(Some(sender));

        let client = self.clone();
        tokio::spawn(async move { client.drive(session_rx).await });
    }

    /// Close the session for good and stop reconnecting.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
        self.inner.debouncer.cancel_all();
        if let Some(session) = self.inner.session.borrow().as_ref() {
            session.shutdown();
        }
    }

    // ── Outbound ─────────────────────────────────────────────────

    /// Hand a message to the session writer.
    ///
    /// Best effort: returns `false` and logs if there is no open socket or
    /// the session has already gone away. Nothing is queued for later.
    pub fn send(&self, message: &OutboundMessage) -> bool {
        if !self.state().is_connected() {
            debug!(kind = message.kind(), "not connected, dropping message");
            return false;
        }
        let Some(session) = self.inner.session.borrow().clone() else {
            debug!(kind = message.kind(), "no session, dropping message");
            return false;
        };
        match session.send(message) {
            Ok(()) => true,
            Err(e) => {
                warn!(kind = message.kind(), error = %e, "send failed");
                false
            }
        }
    }

    /// Send a service call. Returns its request id if it was sent.
    ///
    /// Calls need an accepted token: the hub answers anything sent before
    /// `auth_ok` with `auth_invalid` and drops the socket.
    pub fn invoke(&self, call: &ServiceCall) -> Option<u64> {
        if self.state() != ConnectionState::Authenticated {
            debug!(domain = %call.domain, service = %call.service, state = %self.state(), "not authenticated, dropping call");
            return None;
        }

        let kind = RequestKind::ServiceCall {
            domain: call.domain.clone(),
            service: call.service.clone(),
            entity_id: call.entity_id.clone(),
        };
        self.inner.correlator.issue(kind, |id| {
            debug!(id, domain = %call.domain, service = %call.service, entity_id = %call.entity_id, "calling service");
            self.send(&call.to_message(id))
        })
    }

    /// Convenience form of [`invoke()`](Self::invoke).
    pub fn call_service(
        &self,
        domain: &str,
        service: &str,
        entity_id: EntityId,
        data: Map<String, Value>,
    ) -> Option<u64> {
        let call = ServiceCall {
            domain: domain.to_owned(),
            service: service.to_owned(),
            entity_id,
            data,
        };
        self.invoke(&call)
    }

    /// Lower a command against the cache and send it now.
    pub fn execute(&self, command: &Command) -> Result<Option<u64>, CoreError> {
        let call = command.lower(&self.inner.cache)?;
        Ok(self.invoke(&call))
    }

    /// Lower a command and send it after the debounce period, replacing
    /// any command still waiting for the same entity.
    pub fn schedule(&self, command: &Command) -> Result<(), CoreError> {
        let call = command.lower(&self.inner.cache)?;
        let client = self.clone();
        self.inner
            .debouncer
            .schedule(command.entity_id().clone(), move || {
                client.invoke(&call);
            });
        Ok(())
    }

    /// Route a panel command: sliders are debounced, the rest sent now.
    pub fn dispatch(&self, command: &Command) -> Result<(), CoreError> {
        if command.is_continuous() {
            self.schedule(command)
        } else {
            self.execute(command).map(|_| ())
        }
    }

    // ── Session driver ───────────────────────────────────────────

    /// Process one session's events in arrival order until it closes.
    async fn drive(self, mut session_rx: mpsc::UnboundedReceiver<SessionEvent>) {
        let mut reconciler = Reconciler::new(Arc::clone(&self.inner.cache));

        while let Some(event) = session_rx.recv().await {
            match event {
                SessionEvent::Opened => self.on_open(),
                SessionEvent::Message(message) => self.on_message(message, &mut reconciler),
                SessionEvent::Closed { error } => {
                    self.on_close(error.as_deref());
                    return;
                }
            }
        }

        self.on_close(Some("session task ended unexpectedly"));
    }

    fn on_open(&self) {
        self.inner
            .connection_state
            .send_replace(ConnectionState::Connected);
        self.emit(HubEvent::Connected);

        self.send(&OutboundMessage::Auth {
            access_token: self.inner.config.token.expose_secret().to_owned(),
        });
    }

    fn on_message(&self, message: InboundMessage, reconciler: &mut Reconciler) {
        match message {
            InboundMessage::AuthRequired { ha_version } => {
                debug!(?ha_version, "hub requested authentication");
            }
            InboundMessage::AuthOk { ha_version } => {
                info!(?ha_version, "authenticated with hub");
                self.inner
                    .connection_state
                    .send_replace(ConnectionState::Authenticated);
                self.emit(HubEvent::Authenticated);

                // Subscribe first so nothing is missed while the snapshot is in flight.
                self.inner.correlator.issue(RequestKind::Subscribe, |id| {
                    self.send(&OutboundMessage::SubscribeEvents {
                        id,
                        event_type: STATE_CHANGED.into(),
                    })
                });
                let mark = reconciler.begin_snapshot();
                self.inner
                    .correlator
                    .issue(RequestKind::Snapshot(mark), |id| {
                        self.send(&OutboundMessage::GetStates { id })
                    });
            }
            InboundMessage::AuthInvalid { message } => {
                let message = message.unwrap_or_else(|| "invalid access token".into());
                warn!(%message, "hub rejected access token");
                self.emit(HubEvent::AuthRejected { message });
            }
            InboundMessage::Event { event, .. } => {
                if event
                    .event_type
                    .as_deref()
                    .is_some_and(|t| t != STATE_CHANGED)
                {
                    return;
                }
                reconciler.apply_event(event.data);
            }
            InboundMessage::Result {
                id,
                success,
                error,
                result,
            } => self.on_result(id, success, error, result, reconciler),
            InboundMessage::Unknown => {}
        }
    }

    fn on_result(
        &self,
        id: Option<u64>,
        success: bool,
        error: Option<ResultError>,
        result: Option<Value>,
        reconciler: &mut Reconciler,
    ) {
        let kind = id.and_then(|id| self.inner.correlator.resolve(id));

        if !success {
            let error = error.unwrap_or(ResultError {
                code: None,
                message: None,
            });
            warn!(?id, ?kind, error = %error, "request failed");
            if let (Some(id), Some(RequestKind::ServiceCall { .. })) = (id, &kind) {
                self.emit(HubEvent::CommandFailed {
                    id,
                    message: error.message.clone().unwrap_or_else(|| error.to_string()),
                    code: error.code,
                });
            }
            return;
        }

        match kind {
            Some(RequestKind::Subscribe) => debug!("subscribed to state changes"),
            Some(RequestKind::Snapshot(mark)) => {
                let count = result.map_or(0, |r| reconciler.apply_result(r, Some(mark)));
                info!(count, "state snapshot applied");
                self.emit(HubEvent::SnapshotApplied { count });
            }
            Some(RequestKind::ServiceCall { .. }) => {
                if let Some(id) = id {
                    self.emit(HubEvent::CommandCompleted { id });
                }
                if let Some(r) = result {
                    reconciler.apply_result(r, None);
                }
            }
            None => {
                if let Some(r) = result {
                    reconciler.apply_result(r, None);
                }
            }
        }
    }

    fn on_close(&self, error: Option<&str>) {
        self.inner.session.send_replace(None);
        self.inner.correlator.clear();

        let previous = self
            .inner
            .connection_state
            .send_replace(ConnectionState::Disconnected);
        if previous != ConnectionState::Disconnected {
            self.emit(HubEvent::Disconnected);
        }

        match error {
            Some(e) => warn!(error = %e, "disconnected from hub"),
            None => info!("disconnected from hub"),
        }

        if self.inner.cancel.is_cancelled() {
            return;
        }
        let watcher = self.clone();
        let client = self.clone();
        self.inner.reconnect.on_disconnect(
            move || watcher.state().is_connected(),
            move || client.connect(),
        );
    }

    fn emit(&self, event: HubEvent) {
        // The receiver may be gone during shutdown.
        let _ = self.inner.events_tx.send(event);
    }
}
