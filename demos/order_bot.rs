//! Interactive demo: a small order-taking conversation driven from stdin.
//!
//! Run with `cargo run --example order_bot`, answer the prompts, and watch
//! the session events stream by.

use std::sync::Arc;

use miette::IntoDiagnostic;
use tokio::io::{AsyncBufReadExt, BufReader};

use convoflow::event_bus::EngineEvent;
use convoflow::flow::{FlowDocument, FlowGraph};
use convoflow::session::{FlowRunner, RunnerConfig, SessionStatus};
use convoflow::telemetry;

const FLOW: &str = r#"{
    "nodes": [
        {"id": "hi", "type": "text", "data": {"text": "Ola! Bem-vindo a lanchonete."}},
        {"id": "ask_name", "type": "input_text", "data": {"placeholder": "Qual e o seu nome?", "variable": "name"}},
        {"id": "has_name", "type": "condition", "data": {"variable": "name", "operator": "not_empty", "value": ""}},
        {"id": "greet", "type": "text", "data": {"text": "Prazer, {{name}}!"}},
        {"id": "greet_anon", "type": "set_variable", "data": {"variable": "name", "text": "cliente"}},
        {"id": "ask_order", "type": "input_text", "data": {"placeholder": "O que voce quer pedir?", "variable": "order"}},
        {"id": "confirm", "type": "text", "data": {"text": "Anotado, {{name}}: {{order}}. Ja preparamos!"}}
    ],
    "edges": [
        {"sourceId": "hi", "targetId": "ask_name"},
        {"sourceId": "ask_name", "targetId": "has_name"},
        {"sourceId": "has_name", "targetId": "greet"},
        {"sourceId": "has_name", "targetId": "greet_anon", "kind": "else"},
        {"sourceId": "greet", "targetId": "ask_order"},
        {"sourceId": "greet_anon", "targetId": "ask_order"},
        {"sourceId": "ask_order", "targetId": "confirm"}
    ]
}"#;

#[tokio::main]
async fn main() -> miette::Result<()> {
    telemetry::init_with_filter("warn");

    let doc = FlowDocument::from_json(FLOW).into_diagnostic()?;
    let graph = Arc::new(FlowGraph::load(doc)?);

    let runner = FlowRunner::new(RunnerConfig::from_env());
    let mut events = runner.subscribe();
    runner.start_session(graph, "demo")?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let Some(event) = events
            .next_timeout(std::time::Duration::from_secs(600))
            .await
        else {
            break;
        };
        match event {
            EngineEvent::Outbound { action, .. } => println!("bot> {action}"),
            EngineEvent::StateChange {
                status: SessionStatus::WaitingForInput,
                ..
            } => {
                print!("you> ");
                use std::io::Write;
                std::io::stdout().flush().into_diagnostic()?;
                match lines.next_line().await.into_diagnostic()? {
                    Some(line) => runner.submit_input("demo", line.trim())?,
                    None => {
                        runner.cancel_session("demo")?;
                    }
                }
            }
            EngineEvent::Error { report, .. } => eprintln!("error: {}", report.error),
            EngineEvent::Completed { variables, .. } => {
                println!("-- pedido completo --");
                for (name, value) in variables {
                    println!("   {name} = {value}");
                }
                break;
            }
            EngineEvent::StateChange { status, .. } if status.is_terminal() => break,
            EngineEvent::StateChange { .. } => {}
        }
    }

    runner.join_session("demo").await?;
    Ok(())
}
