//! The per-session execution loop.
//!
//! One driver runs on its own tokio task per session. It owns the session's
//! variables, walks the graph node by node, and communicates exclusively
//! through the event hub (outbound) and its inbound mailbox / cancel flag
//! (inbound). Nothing here is shared with other sessions except the graph
//! and the transports.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::instrument;

use crate::errors::{CauseChain, ErrorReport};
use crate::event_bus::{EngineEvent, EventEmitter, HubEmitter};
use crate::exec::{ExecError, NextSelector, Transports, execute};
use crate::flow::{FlowGraph, NodeId};
use crate::vars::VariableStore;

use super::config::RunnerConfig;
use super::state::{InboundEvent, SessionStatus};

pub(crate) struct SessionDriver {
    pub(crate) session_id: String,
    pub(crate) graph: Arc<FlowGraph>,
    pub(crate) config: RunnerConfig,
    pub(crate) transports: Transports,
    pub(crate) emitter: HubEmitter,
    pub(crate) inbound: flume::Receiver<InboundEvent>,
    pub(crate) cancel: watch::Receiver<bool>,
    pub(crate) status: Arc<Mutex<SessionStatus>>,
}

enum AwaitedReply {
    Reply(String),
    Cancelled,
    TimedOut,
}

impl SessionDriver {
    #[instrument(skip_all, fields(session_id = %self.session_id))]
    pub(crate) async fn run(mut self) {
        let mut vars = VariableStore::new();
        let mut sequence: u64 = 0;
        let mut total_steps: u64 = 0;
        // Reset on every inbound event, so only uninterrupted runs of nodes
        // count against the budget.
        let mut steps_since_input: u32 = 0;

        self.transition(SessionStatus::Running);
        let mut current: Option<NodeId> = Some(self.graph.entry().id.clone());

        while let Some(node_id) = current.take() {
            if *self.cancel.borrow() {
                self.finish_cancelled();
                return;
            }
            if steps_since_input >= self.config.step_budget {
                self.emit(EngineEvent::error(
                    self.session_id.clone(),
                    ErrorReport::session(
                        self.session_id.clone(),
                        CauseChain::msg(format!(
                            "step budget of {} exhausted at node {node_id}; flow likely cycles",
                            self.config.step_budget
                        )),
                    )
                    .with_tag("step_budget"),
                ));
                self.finish_failed();
                return;
            }
            steps_since_input += 1;
            total_steps += 1;

            // Edges were validated at load time, so the target always exists.
            let Some(node) = self.graph.node(&node_id) else {
                self.emit(EngineEvent::error(
                    self.session_id.clone(),
                    ErrorReport::flow(CauseChain::msg(format!("node {node_id} vanished"))),
                ));
                self.finish_failed();
                return;
            };

            let next = match execute(
                node,
                total_steps,
                &vars,
                &self.transports,
                &self.config.retry,
            )
            .await
            {
                Ok(outcome) => {
                    for report in outcome.reports {
                        self.emit(EngineEvent::error(self.session_id.clone(), report));
                    }
                    for action in outcome.actions {
                        self.emit(EngineEvent::outbound(
                            self.session_id.clone(),
                            sequence,
                            action,
                        ));
                        sequence += 1;
                    }
                    for mutation in outcome.mutations {
                        vars.set(mutation.variable, mutation.value);
                    }
                    match outcome.next {
                        NextSelector::Primary | NextSelector::Branch { taken: true } => {
                            self.graph.primary_target(&node_id).cloned()
                        }
                        NextSelector::Branch { taken: false } => {
                            self.graph.else_target(&node_id).cloned()
                        }
                        NextSelector::Suspend { variable } => {
                            self.transition(SessionStatus::WaitingForInput);
                            match self.await_reply().await {
                                AwaitedReply::Reply(text) => {
                                    vars.set(variable, text);
                                    steps_since_input = 0;
                                    self.transition(SessionStatus::Running);
                                    self.graph.primary_target(&node_id).cloned()
                                }
                                AwaitedReply::Cancelled => {
                                    self.finish_cancelled();
                                    return;
                                }
                                AwaitedReply::TimedOut => {
                                    self.emit(EngineEvent::error(
                                        self.session_id.clone(),
                                        ErrorReport::node(
                                            node_id.as_str(),
                                            total_steps,
                                            CauseChain::msg("timed out waiting for input"),
                                        )
                                        .with_tag("input_timeout"),
                                    ));
                                    self.finish_failed();
                                    return;
                                }
                            }
                        }
                    }
                }
                Err(err) => {
                    let ExecError::Transport { ref source, .. } = err;
                    self.emit(EngineEvent::error(
                        self.session_id.clone(),
                        ErrorReport::node(
                            node_id.as_str(),
                            total_steps,
                            CauseChain::msg(err.to_string())
                                .with_cause(CauseChain::msg(source.to_string())),
                        )
                        .with_tag("transport"),
                    ));
                    // A transport failure degrades to the else branch when the
                    // author provided one.
                    match self.graph.else_target(&node_id).cloned() {
                        Some(target) => Some(target),
                        None => {
                            self.finish_failed();
                            return;
                        }
                    }
                }
            };

            if next.is_some() && !self.pace().await {
                self.finish_cancelled();
                return;
            }
            current = next;
        }

        self.transition(SessionStatus::Completed);
        self.emit(EngineEvent::completed(
            self.session_id.clone(),
            vars.snapshot(),
        ));
    }

    /// Park until a reply, cancellation, or the input timeout.
    async fn await_reply(&mut self) -> AwaitedReply {
        let timeout = async {
            match self.config.input_timeout {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(timeout);
        loop {
            tokio::select! {
                changed = self.cancel.changed() => {
                    if changed.is_err() || *self.cancel.borrow() {
                        return AwaitedReply::Cancelled;
                    }
                }
                () = &mut timeout => return AwaitedReply::TimedOut,
                inbound = self.inbound.recv_async() => {
                    return match inbound {
                        Ok(InboundEvent::Reply(text)) => AwaitedReply::Reply(text),
                        // Mailbox gone means the runner dropped the session.
                        Err(_) => AwaitedReply::Cancelled,
                    };
                }
            }
        }
    }

    /// Inter-node pacing delay; returns `false` when cancelled meanwhile.
    async fn pace(&mut self) -> bool {
        if *self.cancel.borrow() {
            return false;
        }
        if self.config.pacing_delay.is_zero() {
            return true;
        }
        tokio::select! {
            () = tokio::time::sleep(self.config.pacing_delay) => true,
            changed = self.cancel.changed() => {
                !(changed.is_err() || *self.cancel.borrow())
            }
        }
    }

    fn transition(&self, status: SessionStatus) {
        *self.status.lock().unwrap() = status;
        self.emit(EngineEvent::state_change(self.session_id.clone(), status));
    }

    fn finish_failed(&self) {
        self.transition(SessionStatus::Failed);
    }

    fn finish_cancelled(&self) {
        tracing::debug!("session cancelled");
        self.transition(SessionStatus::Cancelled);
    }

    fn emit(&self, event: EngineEvent) {
        if let Err(err) = self.emitter.emit(event) {
            tracing::trace!(error = %err, "event dropped, no subscribers");
        }
    }
}
