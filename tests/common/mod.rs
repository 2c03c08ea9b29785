//! Shared fixtures for the integration tests: flow builders, scripted
//! transports, and event-stream helpers.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use convoflow::event_bus::{EngineEvent, EventStream};
use convoflow::exec::{
    AiBackend, HttpCall, HttpResponse, HttpTransport, RetryPolicy, TransportError,
};
use convoflow::flow::{EdgeKind, EdgeSpec, FlowDocument, HttpMethod, NodePayload, NodeSpec};
use convoflow::session::{FlowRunner, RunnerConfig, SessionStatus};

pub const EVENT_DEADLINE: Duration = Duration::from_secs(5);

/// Config with no pacing and no retry delays, so tests run instantly.
pub fn fast_config() -> RunnerConfig {
    RunnerConfig::default()
        .with_pacing(Duration::ZERO)
        .with_retry(RetryPolicy::immediate(3))
        .with_input_timeout(Some(EVENT_DEADLINE))
}

pub fn text_node(id: &str, text: &str) -> NodeSpec {
    NodeSpec::new(id, NodePayload::Text { text: text.into() })
}

pub fn input_node(id: &str, placeholder: &str, variable: &str) -> NodeSpec {
    NodeSpec::new(
        id,
        NodePayload::InputText {
            placeholder: placeholder.into(),
            variable: variable.into(),
        },
    )
}

pub fn set_node(id: &str, variable: &str, text: &str) -> NodeSpec {
    NodeSpec::new(
        id,
        NodePayload::SetVariable {
            variable: variable.into(),
            text: text.into(),
        },
    )
}

pub fn condition_node(id: &str, variable: &str, operator: &str, value: &str) -> NodeSpec {
    NodeSpec::new(
        id,
        NodePayload::Condition {
            variable: variable.into(),
            operator: operator.into(),
            value: value.into(),
        },
    )
}

pub fn http_node(id: &str, url: &str) -> NodeSpec {
    NodeSpec::new(
        id,
        NodePayload::HttpRequest {
            method: HttpMethod::Get,
            url: url.into(),
            headers: String::new(),
            body: String::new(),
        },
    )
}

pub fn ai_node(id: &str, prompt: &str, response_variable: &str) -> NodeSpec {
    NodeSpec::new(
        id,
        NodePayload::AiAssistant {
            prompt: prompt.into(),
            response_variable: response_variable.into(),
        },
    )
}

pub fn edge(source: &str, target: &str) -> EdgeSpec {
    EdgeSpec::primary(source, target)
}

pub fn else_edge(source: &str, target: &str) -> EdgeSpec {
    EdgeSpec::new(source, target, EdgeKind::Else)
}

pub fn doc(nodes: Vec<NodeSpec>, edges: Vec<EdgeSpec>) -> FlowDocument {
    FlowDocument { nodes, edges }
}

/// HTTP transport that fails a configured number of attempts, then succeeds.
#[derive(Default)]
pub struct ScriptedHttp {
    pub calls: AtomicU32,
    pub failures_before_success: AtomicU32,
    pub seen: Mutex<Vec<HttpCall>>,
}

impl ScriptedHttp {
    pub fn failing(attempts: u32) -> Self {
        Self {
            failures_before_success: AtomicU32::new(attempts),
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpTransport for ScriptedHttp {
    async fn send(&self, call: HttpCall) -> Result<HttpResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(call);
        let remaining = self.failures_before_success.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_before_success.store(remaining - 1, Ordering::SeqCst);
            return Err(TransportError::failed("http", "scripted failure"));
        }
        Ok(HttpResponse {
            status: 200,
            body: "{}".into(),
        })
    }
}

/// AI backend that echoes its prompt with a prefix.
#[derive(Clone, Debug, Default)]
pub struct ScriptedAi {
    pub prefix: String,
}

#[async_trait]
impl AiBackend for ScriptedAi {
    async fn complete(&self, prompt: &str) -> Result<String, TransportError> {
        Ok(format!("{}{prompt}", self.prefix))
    }
}

/// Drain the stream until the session reaches a terminal status, collecting
/// every event on the way. A completed session is drained through its final
/// `Completed` event.
pub async fn collect_until_terminal(stream: &mut EventStream) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Some(event) = stream.next_timeout(EVENT_DEADLINE).await {
        let done = match &event {
            EngineEvent::Completed { .. } => true,
            EngineEvent::StateChange { status, .. } => {
                matches!(status, SessionStatus::Failed | SessionStatus::Cancelled)
            }
            _ => false,
        };
        events.push(event);
        if done {
            break;
        }
    }
    events
}

/// Wait until the stream reports the given status for the session.
pub async fn wait_for_status(stream: &mut EventStream, session_id: &str, wanted: SessionStatus) {
    while let Some(event) = stream.next_timeout(EVENT_DEADLINE).await {
        if let EngineEvent::StateChange { session_id: id, status } = &event {
            if id == session_id && *status == wanted {
                return;
            }
        }
    }
    panic!("session {session_id} never reached {wanted}");
}

/// Outbound action texts for one session, in sequence order.
pub fn outbound_texts(events: &[EngineEvent], session_id: &str) -> Vec<String> {
    let mut with_seq: Vec<(u64, String)> = events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::Outbound {
                session_id: id,
                sequence,
                action,
            } if id == session_id => Some((*sequence, action.to_string())),
            _ => None,
        })
        .collect();
    with_seq.sort_by_key(|(seq, _)| *seq);
    with_seq.into_iter().map(|(_, text)| text).collect()
}

/// Final variables from the `Completed` event, if the session completed.
pub fn completed_variables(
    events: &[EngineEvent],
    session_id: &str,
) -> Option<std::collections::BTreeMap<String, String>> {
    events.iter().find_map(|event| match event {
        EngineEvent::Completed {
            session_id: id,
            variables,
        } if id == session_id => Some(variables.clone()),
        _ => None,
    })
}

/// Convenience: runner with fast config and no transports.
pub fn fast_runner() -> FlowRunner {
    FlowRunner::new(fast_config())
}
