//! # Convoflow: Conversational Flow Graph Engine
//!
//! Convoflow turns an authored conversation script, a directed graph of typed
//! steps such as messages, media, input prompts, variable logic, branching and
//! external calls, plus a stream of inbound user events into a deterministic,
//! resumable sequence of outbound actions and variable mutations.
//!
//! ## Core Concepts
//!
//! - **Flow**: a validated, immutable graph of [`flow::NodeSpec`]s connected
//!   by primary and else edges
//! - **Session**: one live execution of a flow against one conversation
//!   participant, with its own [`vars::VariableStore`]
//! - **Suspension**: input nodes pause automatic advancement until a reply
//!   (or timeout / cancellation) arrives
//! - **Events**: every outbound action, state change, error, and completion is
//!   published through a broadcast [`event_bus::EventHub`]
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use convoflow::flow::{EdgeKind, EdgeSpec, FlowDocument, FlowGraph, NodePayload, NodeSpec};
//! use convoflow::session::{FlowRunner, RunnerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let doc = FlowDocument {
//!     nodes: vec![
//!         NodeSpec::new("ask", NodePayload::InputText {
//!             placeholder: "What is your name?".into(),
//!             variable: "name".into(),
//!         }),
//!         NodeSpec::new("greet", NodePayload::Text { text: "Hello {{name}}!".into() }),
//!     ],
//!     edges: vec![EdgeSpec::new("ask", "greet", EdgeKind::Primary)],
//! };
//! let graph = Arc::new(FlowGraph::load(doc)?);
//!
//! let runner = FlowRunner::new(RunnerConfig::default());
//! let mut events = runner.subscribe();
//! runner.start_session(graph, "visitor-1")?;
//! runner.submit_input("visitor-1", "Ana")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Guide
//!
//! - [`flow`] - authored flow documents, validation, and the loaded graph
//! - [`vars`] - per-session variable bindings
//! - [`expr`] - `{{var}}`/`${var}` interpolation and condition evaluation
//! - [`exec`] - one executor behavior per node type, plus transport seams
//! - [`session`] - the session runner state machine and its configuration
//! - [`event_bus`] - broadcast hub, streams, and pluggable sinks
//! - [`errors`] - structured, recoverable error reports
//! - [`action`] - outbound actions delivered to the channel adapter

pub mod action;
pub mod errors;
pub mod event_bus;
pub mod exec;
pub mod expr;
pub mod flow;
pub mod session;
pub mod telemetry;
pub mod utils;
pub mod vars;
