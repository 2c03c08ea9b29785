//! Concurrent sessions on one runner stay fully isolated.

mod common;

use std::sync::Arc;

use convoflow::event_bus::EngineEvent;
use convoflow::flow::FlowGraph;
use convoflow::session::SessionStatus;

use common::*;

#[tokio::test]
async fn sessions_do_not_share_variables() {
    let runner = fast_runner();
    let mut stream = runner.subscribe();
    let flow = Arc::new(
        FlowGraph::load(doc(
            vec![
                input_node("ask", "Seu nome?", "name"),
                text_node("bye", "Tchau {{name}}"),
            ],
            vec![edge("ask", "bye")],
        ))
        .unwrap(),
    );
    runner.start_session(flow.clone(), "alice").unwrap();
    runner.start_session(flow, "bob").unwrap();

    // Both sessions reach their prompt.
    let mut waiting = 0;
    while waiting < 2 {
        let event = stream.next_timeout(EVENT_DEADLINE).await.unwrap();
        if matches!(
            event,
            EngineEvent::StateChange {
                status: SessionStatus::WaitingForInput,
                ..
            }
        ) {
            waiting += 1;
        }
    }

    runner.submit_input("alice", "Alice").unwrap();
    runner.submit_input("bob", "Bob").unwrap();
    runner.join_session("alice").await.unwrap();
    runner.join_session("bob").await.unwrap();

    let mut completions = std::collections::BTreeMap::new();
    while completions.len() < 2 {
        let event = stream.next_timeout(EVENT_DEADLINE).await.unwrap();
        if let EngineEvent::Completed {
            session_id,
            variables,
        } = event
        {
            completions.insert(session_id, variables);
        }
    }

    assert_eq!(
        completions["alice"].get("name").map(String::as_str),
        Some("Alice")
    );
    assert_eq!(
        completions["bob"].get("name").map(String::as_str),
        Some("Bob")
    );
}

#[tokio::test]
async fn cancelling_one_session_leaves_the_other_running() {
    let runner = fast_runner();
    let mut stream = runner.subscribe();
    let flow = Arc::new(
        FlowGraph::load(doc(
            vec![
                input_node("ask", "Seu nome?", "name"),
                text_node("bye", "Tchau {{name}}"),
            ],
            vec![edge("ask", "bye")],
        ))
        .unwrap(),
    );
    runner.start_session(flow.clone(), "keep").unwrap();
    runner.start_session(flow, "drop").unwrap();

    let mut waiting = 0;
    while waiting < 2 {
        let event = stream.next_timeout(EVENT_DEADLINE).await.unwrap();
        if matches!(
            event,
            EngineEvent::StateChange {
                status: SessionStatus::WaitingForInput,
                ..
            }
        ) {
            waiting += 1;
        }
    }

    runner.cancel_session("drop").unwrap();
    runner.join_session("drop").await.unwrap();
    assert_eq!(runner.status("drop").unwrap(), SessionStatus::Cancelled);
    assert_eq!(
        runner.status("keep").unwrap(),
        SessionStatus::WaitingForInput
    );

    runner.submit_input("keep", "Ana").unwrap();
    runner.join_session("keep").await.unwrap();
    assert_eq!(runner.status("keep").unwrap(), SessionStatus::Completed);
    assert_eq!(runner.active_sessions(), Vec::<String>::new());
}
