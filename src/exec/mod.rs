//! Node execution: turns one [`NodeSpec`] into outbound actions, variable
//! mutations, and a routing decision.
//!
//! Execution is side-effect free with respect to session state. The driver
//! applies the returned [`StepOutcome`] (emit actions, write mutations,
//! forward reports) and routes on [`NextSelector`]. The only `Err` out of
//! [`execute`] is a transport failure that survived its retry budget;
//! everything else is reported and the step still completes.

pub mod transport;

#[cfg(feature = "http")]
pub mod http_reqwest;

use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;
use tracing::instrument;

use crate::action::OutboundAction;
use crate::errors::{CauseChain, ErrorReport};
use crate::expr::{Condition, interpolate};
use crate::flow::{InputKind, NodeSpec};
use crate::vars::VariableStore;

pub use transport::{
    AiBackend, HttpCall, HttpResponse, HttpTransport, NullAiBackend, NullHttpTransport,
    RetryPolicy, TransportError,
};

#[cfg(feature = "http")]
pub use http_reqwest::ReqwestTransport;

/// Where the session goes after this step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NextSelector {
    /// Follow the primary edge, or finish if there is none.
    Primary,
    /// Park the session until a reply arrives, then bind it to `variable`.
    Suspend { variable: String },
    /// Condition result: `true` takes the primary edge, `false` the else edge.
    Branch { taken: bool },
}

/// A variable write produced by a step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mutation {
    pub variable: String,
    pub value: String,
}

/// Everything one node execution produced.
#[derive(Debug, Default)]
pub struct StepOutcome {
    pub actions: Vec<OutboundAction>,
    pub mutations: Vec<Mutation>,
    /// Recoverable problems; the session keeps going.
    pub reports: Vec<ErrorReport>,
    pub next: NextSelector,
}

impl Default for NextSelector {
    fn default() -> Self {
        Self::Primary
    }
}

/// Transport implementations shared by every session of a runner.
#[derive(Clone)]
pub struct Transports {
    pub http: Arc<dyn HttpTransport>,
    pub ai: Arc<dyn AiBackend>,
}

impl Default for Transports {
    fn default() -> Self {
        Self {
            http: Arc::new(NullHttpTransport),
            ai: Arc::new(NullAiBackend),
        }
    }
}

/// Fatal step failure: a transport call exhausted its retries.
#[derive(Debug, Error, Diagnostic)]
pub enum ExecError {
    #[error("node {node}: {what} call failed after {attempts} attempts")]
    #[diagnostic(
        code(convoflow::exec::transport),
        help("the session falls back to the node's else edge when one exists")
    )]
    Transport {
        node: String,
        what: &'static str,
        attempts: u32,
        #[source]
        source: TransportError,
    },
}

fn prompt_fallback(kind: InputKind) -> &'static str {
    match kind {
        InputKind::Text => "Type your answer",
        InputKind::Number => "Enter a number",
        InputKind::Phone => "Enter your phone number",
    }
}

fn prompt_action(placeholder: &str, kind: InputKind, vars: &VariableStore) -> OutboundAction {
    let text = if placeholder.trim().is_empty() {
        prompt_fallback(kind).to_string()
    } else {
        interpolate(placeholder, vars)
    };
    OutboundAction::prompt(text)
}

/// Parse the authored headers blob (a JSON object as text) into header pairs.
///
/// A malformed blob is a recoverable report; the request proceeds without
/// headers.
fn parse_headers(raw: &str) -> Result<Vec<(String, String)>, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw)?;
    Ok(map
        .into_iter()
        .map(|(name, value)| {
            let value = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (name, value)
        })
        .collect())
}

/// Execute one node against the current variables.
#[instrument(skip_all, fields(node = %node.id, node_type = node.payload.type_name(), step = step))]
pub async fn execute(
    node: &NodeSpec,
    step: u64,
    vars: &VariableStore,
    transports: &Transports,
    retry: &RetryPolicy,
) -> Result<StepOutcome, ExecError> {
    use crate::flow::NodePayload as P;

    let mut outcome = StepOutcome::default();
    match &node.payload {
        P::Text { text } => {
            outcome
                .actions
                .push(OutboundAction::text(interpolate(text, vars)));
        }
        P::Image { url } | P::Video { url } | P::Audio { url } => {
            let kind = node
                .payload
                .media_kind()
                .expect("media payload has a media kind");
            outcome
                .actions
                .push(OutboundAction::media(kind, interpolate(url, vars)));
        }
        P::InputText {
            placeholder,
            variable,
        }
        | P::InputNumber {
            placeholder,
            variable,
        }
        | P::InputPhone {
            placeholder,
            variable,
        } => {
            let kind = node
                .payload
                .input_kind()
                .expect("input payload has an input kind");
            outcome.actions.push(prompt_action(placeholder, kind, vars));
            outcome.next = NextSelector::Suspend {
                variable: variable.clone(),
            };
        }
        P::SetVariable { variable, text } => {
            outcome.mutations.push(Mutation {
                variable: variable.clone(),
                value: interpolate(text, vars),
            });
        }
        P::Condition {
            variable,
            operator,
            value,
        } => {
            let condition = Condition {
                variable,
                operator,
                value,
            };
            match condition.evaluate(vars) {
                Ok(taken) => outcome.next = NextSelector::Branch { taken },
                Err(err) => {
                    outcome.reports.push(
                        ErrorReport::node(node.id.as_str(), step, CauseChain::msg(err.to_string()))
                            .with_tag("condition"),
                    );
                    outcome.next = NextSelector::Branch { taken: false };
                }
            }
        }
        P::HttpRequest {
            method,
            url,
            headers,
            body,
        } => {
            let headers = match parse_headers(&interpolate(headers, vars)) {
                Ok(headers) => headers,
                Err(err) => {
                    outcome.reports.push(
                        ErrorReport::node(
                            node.id.as_str(),
                            step,
                            CauseChain::msg("malformed headers, sending request without them")
                                .with_cause(CauseChain::msg(err.to_string())),
                        )
                        .with_tag("http"),
                    );
                    Vec::new()
                }
            };
            let call = HttpCall {
                method: *method,
                url: interpolate(url, vars),
                headers,
                body: {
                    let body = interpolate(body, vars);
                    (!body.trim().is_empty()).then_some(body)
                },
            };
            let response = retry
                .run("http", || transports.http.send(call.clone()))
                .await
                .map_err(|source| ExecError::Transport {
                    node: node.id.to_string(),
                    what: "http",
                    attempts: retry.attempts.max(1),
                    source,
                })?;
            tracing::debug!(status = response.status, url = %call.url, "http request completed");
        }
        P::AiAssistant {
            prompt,
            response_variable,
        } => {
            let prompt = interpolate(prompt, vars);
            let answer = retry
                .run("ai", || transports.ai.complete(&prompt))
                .await
                .map_err(|source| ExecError::Transport {
                    node: node.id.to_string(),
                    what: "ai",
                    attempts: retry.attempts.max(1),
                    source,
                })?;
            outcome.mutations.push(Mutation {
                variable: response_variable.clone(),
                value: answer,
            });
        }
    }
    Ok(outcome)
}
