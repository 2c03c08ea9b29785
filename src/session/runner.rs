//! Multi-session runner: owns the event bus, the transports, and one driver
//! task per active session.

use std::sync::{Arc, Mutex};

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::event_bus::{EventBus, EventStream};
use crate::exec::{AiBackend, HttpTransport, Transports};
use crate::flow::{FlowDocument, FlowGraph, FlowIntegrityError};
use crate::utils::id_generator::IdGenerator;

use super::config::RunnerConfig;
use super::driver::SessionDriver;
use super::state::{InboundEvent, SessionStatus};

/// Protocol-level failures of the runner API, as opposed to failures inside
/// a running session (those surface as events).
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    #[error("session already exists: {id}")]
    #[diagnostic(code(convoflow::runner::session_exists))]
    SessionExists { id: String },

    #[error("unknown session: {id}")]
    #[diagnostic(code(convoflow::runner::session_not_found))]
    SessionNotFound { id: String },

    #[error("session {id} is no longer accepting input")]
    #[diagnostic(
        code(convoflow::runner::session_closed),
        help("the session already reached a terminal status")
    )]
    SessionClosed { id: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Flow(#[from] FlowIntegrityError),
}

struct SessionHandle {
    inbound: flume::Sender<InboundEvent>,
    cancel: watch::Sender<bool>,
    status: Arc<Mutex<SessionStatus>>,
    task: Option<JoinHandle<()>>,
}

/// Drives any number of concurrent sessions over shared flow graphs.
///
/// Each session runs on its own tokio task; the runner only keeps a small
/// handle (mailbox, cancel flag, status) per session. All session output is
/// observed through [`FlowRunner::subscribe`].
pub struct FlowRunner {
    config: RunnerConfig,
    transports: Transports,
    bus: EventBus,
    sessions: Mutex<FxHashMap<String, SessionHandle>>,
    ids: IdGenerator,
}

impl Default for FlowRunner {
    fn default() -> Self {
        Self::new(RunnerConfig::default())
    }
}

impl FlowRunner {
    pub fn new(config: RunnerConfig) -> Self {
        let bus = EventBus::new(config.event_capacity);
        bus.listen_for_events();
        Self {
            config,
            transports: Transports::default(),
            bus,
            sessions: Mutex::new(FxHashMap::default()),
            ids: IdGenerator::new(),
        }
    }

    #[must_use]
    pub fn with_http(mut self, http: Arc<dyn HttpTransport>) -> Self {
        self.transports.http = http;
        self
    }

    #[must_use]
    pub fn with_ai(mut self, ai: Arc<dyn AiBackend>) -> Self {
        self.transports.ai = ai;
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Event bus backing this runner; register extra sinks through it.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Subscribe to every event of every session.
    ///
    /// Subscribe before starting a session to observe it from the first
    /// state change.
    pub fn subscribe(&self) -> EventStream {
        self.bus.subscribe()
    }

    /// Start a session over an already loaded graph.
    pub fn start_session(
        &self,
        graph: Arc<FlowGraph>,
        session_id: impl Into<String>,
    ) -> Result<(), RunnerError> {
        let session_id = session_id.into();
        let mut sessions = self.sessions.lock().unwrap();
        if sessions.contains_key(&session_id) {
            return Err(RunnerError::SessionExists { id: session_id });
        }

        let (inbound_tx, inbound_rx) = flume::unbounded();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let status = Arc::new(Mutex::new(SessionStatus::Idle));

        let driver = SessionDriver {
            session_id: session_id.clone(),
            graph,
            config: self.config.clone(),
            transports: self.transports.clone(),
            emitter: self.bus.emitter(),
            inbound: inbound_rx,
            cancel: cancel_rx,
            status: Arc::clone(&status),
        };
        let task = tokio::spawn(driver.run());

        sessions.insert(
            session_id,
            SessionHandle {
                inbound: inbound_tx,
                cancel: cancel_tx,
                status,
                task: Some(task),
            },
        );
        Ok(())
    }

    /// Load a document, start a session with a generated id, return the id.
    pub fn start_document(&self, doc: FlowDocument) -> Result<String, RunnerError> {
        let graph = Arc::new(FlowGraph::load(doc)?);
        let session_id = self.ids.generate_session_id();
        self.start_session(graph, session_id.clone())?;
        Ok(session_id)
    }

    /// Deliver an end-user reply to a session.
    ///
    /// Replies are queued: submitting while the session is still running is
    /// fine, the reply is consumed at the next input node. Terminal sessions
    /// reject input.
    pub fn submit_input(
        &self,
        session_id: &str,
        text: impl Into<String>,
    ) -> Result<(), RunnerError> {
        let sessions = self.sessions.lock().unwrap();
        let handle = sessions
            .get(session_id)
            .ok_or_else(|| RunnerError::SessionNotFound {
                id: session_id.to_string(),
            })?;
        if handle.status.lock().unwrap().is_terminal() {
            return Err(RunnerError::SessionClosed {
                id: session_id.to_string(),
            });
        }
        handle
            .inbound
            .send(InboundEvent::Reply(text.into()))
            .map_err(|_| RunnerError::SessionClosed {
                id: session_id.to_string(),
            })
    }

    /// Request cancellation; takes effect at the session's next await point.
    pub fn cancel_session(&self, session_id: &str) -> Result<(), RunnerError> {
        let sessions = self.sessions.lock().unwrap();
        let handle = sessions
            .get(session_id)
            .ok_or_else(|| RunnerError::SessionNotFound {
                id: session_id.to_string(),
            })?;
        let _ = handle.cancel.send(true);
        Ok(())
    }

    pub fn status(&self, session_id: &str) -> Result<SessionStatus, RunnerError> {
        let sessions = self.sessions.lock().unwrap();
        let handle = sessions
            .get(session_id)
            .ok_or_else(|| RunnerError::SessionNotFound {
                id: session_id.to_string(),
            })?;
        let status = *handle.status.lock().unwrap();
        Ok(status)
    }

    /// Ids of sessions that have not reached a terminal status.
    pub fn active_sessions(&self) -> Vec<String> {
        let sessions = self.sessions.lock().unwrap();
        sessions
            .iter()
            .filter(|(_, handle)| !handle.status.lock().unwrap().is_terminal())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Wait until the session's driver task finishes. Intended for tests and
    /// orderly shutdown; the handle stays queryable afterwards.
    pub async fn join_session(&self, session_id: &str) -> Result<(), RunnerError> {
        let task = {
            let mut sessions = self.sessions.lock().unwrap();
            let handle =
                sessions
                    .get_mut(session_id)
                    .ok_or_else(|| RunnerError::SessionNotFound {
                        id: session_id.to_string(),
                    })?;
            handle.task.take()
        };
        if let Some(task) = task {
            let _ = task.await;
        }
        Ok(())
    }

    /// Drop the handles of terminal sessions, freeing their ids for reuse.
    pub fn reap_finished(&self) -> usize {
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|_, handle| !handle.status.lock().unwrap().is_terminal());
        before - sessions.len()
    }
}

impl Drop for FlowRunner {
    fn drop(&mut self) {
        if let Ok(sessions) = self.sessions.lock() {
            for handle in sessions.values() {
                let _ = handle.cancel.send(true);
            }
        }
    }
}
