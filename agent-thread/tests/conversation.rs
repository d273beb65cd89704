//! Conversation loop against the scripted MockGateway.
//!
//! Covers turn serialization (one message + one run per input), exit handling,
//! failed-run reporting, reply selection and the no-reply edge case.

mod init_logging;

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use agent_thread::{
    Agent, ChatError, ContentPart, Conversation, GatewayCall, MockGateway, Role, RunFailure,
    RunPoller, RunStatus, TurnOutcome,
};

fn fast_poller() -> RunPoller {
    RunPoller::new(Duration::from_millis(1))
}

async fn start(gw: &Arc<MockGateway>) -> Conversation {
    Conversation::start(gw.clone(), Agent::new("asst_1"), fast_poller())
        .await
        .unwrap()
}

async fn run_session(gw: &Arc<MockGateway>, input: &str) -> String {
    let chat = start(gw).await;
    let mut out = Vec::new();
    chat.run_loop(input.as_bytes(), &mut out).await.unwrap();
    String::from_utf8(out).unwrap()
}

fn submissions(gw: &MockGateway) -> Vec<GatewayCall> {
    gw.calls()
        .into_iter()
        .filter(|c| {
            matches!(
                c,
                GatewayCall::CreateMessage { .. } | GatewayCall::CreateRun { .. }
            )
        })
        .collect()
}

#[tokio::test]
async fn exit_inputs_end_session_without_submitting() {
    for input in ["\n", "   \n", "exit\n", "EXIT\n", "ExIt\n", ""] {
        let gw = Arc::new(MockGateway::new());
        let out = run_session(&gw, input).await;
        assert!(out.ends_with("Goodbye!\n"), "input {:?} -> {:?}", input, out);
        assert!(submissions(&gw).is_empty(), "input {:?} submitted", input);
    }
}

#[tokio::test]
async fn each_input_submits_one_message_then_one_run_in_order() {
    let gw = Arc::new(MockGateway::new());
    gw.script_reply(vec![ContentPart::text("one")]);
    gw.script_reply(vec![ContentPart::text("two")]);
    gw.script_reply(vec![ContentPart::text("three")]);
    let out = run_session(&gw, "first\nsecond\nthird\nexit\n").await;

    let subs = submissions(&gw);
    assert_eq!(subs.len(), 6);
    let texts: Vec<_> = subs
        .iter()
        .filter_map(|c| match c {
            GatewayCall::CreateMessage { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(texts, vec!["first", "second", "third"]);
    for pair in subs.chunks(2) {
        assert!(matches!(pair[0], GatewayCall::CreateMessage { .. }));
        assert!(matches!(pair[1], GatewayCall::CreateRun { .. }));
    }

    assert!(out.contains("Agent: one\n"));
    assert!(out.contains("Agent: two\n"));
    assert!(out.contains("Agent: three\n"));
    assert!(out.ends_with("Goodbye!\n"));
}

#[tokio::test]
async fn no_run_is_created_before_previous_run_settles() {
    let gw = Arc::new(MockGateway::new());
    gw.script_run(vec![RunStatus::Queued, RunStatus::InProgress, RunStatus::Completed]);
    gw.script_run(vec![RunStatus::Queued, RunStatus::Completed]);
    run_session(&gw, "a\nb\n\n").await;

    let calls = gw.calls();
    let second_message = calls
        .iter()
        .position(|c| matches!(c, GatewayCall::CreateMessage { text, .. } if text == "b"))
        .unwrap();
    // The first run's polls and listing all happen before "b" is posted.
    let first_run_polls = calls[..second_message]
        .iter()
        .filter(|c| matches!(c, GatewayCall::GetRun { .. }))
        .count();
    assert_eq!(first_run_polls, 2);
    assert!(matches!(
        calls[second_message - 1],
        GatewayCall::ListMessages { .. }
    ));
    let runs_before_b = calls[..second_message]
        .iter()
        .filter(|c| matches!(c, GatewayCall::CreateRun { .. }))
        .count();
    assert_eq!(runs_before_b, 1);
}

#[tokio::test]
async fn completed_run_lists_once_and_prints_latest_agent_message() {
    let gw = Arc::new(MockGateway::new());
    let chat = start(&gw).await;
    let thread_id = chat.thread().id.clone();
    gw.push_message(&thread_id, Role::Agent, vec![ContentPart::text("old reply")]);
    gw.script_reply(vec![
        ContentPart::text("Hello "),
        ContentPart::text("world"),
        ContentPart::image("f1"),
        ContentPart::Unknown,
    ]);

    let mut out = Vec::new();
    let outcome = chat.submit_turn("hi", &mut out).await.unwrap();
    let out = String::from_utf8(out).unwrap();

    assert!(matches!(outcome, TurnOutcome::Replied(ref m) if m.role == Role::Agent));
    assert_eq!(gw.list_call_count(), 1);
    assert!(
        out.ends_with("Agent: Hello world<image from ID: f1>\n"),
        "{:?}",
        out
    );
    assert!(!out.contains("old reply"));
}

#[tokio::test]
async fn completed_run_without_agent_message_prints_nothing() {
    let gw = Arc::new(MockGateway::new());
    let chat = start(&gw).await;

    let mut out = Vec::new();
    let outcome = chat.submit_turn("anyone there?", &mut out).await.unwrap();
    let out = String::from_utf8(out).unwrap();

    assert_eq!(outcome, TurnOutcome::NoReply);
    assert!(!out.contains("Agent: "));
    assert!(!out.contains("Error"));
    assert_eq!(gw.list_call_count(), 1);
}

#[tokio::test]
async fn failed_run_without_detail_prints_placeholder_and_loop_continues() {
    let gw = Arc::new(MockGateway::new());
    gw.script_failed_run(vec![RunStatus::Queued, RunStatus::Failed], None);
    gw.script_reply(vec![ContentPart::text("second try worked")]);
    let out = run_session(&gw, "one\ntwo\nexit\n").await;

    assert!(
        out.contains("Error: Run failed or was canceled: (no error details)\n"),
        "{:?}",
        out
    );
    assert!(out.contains("Agent: second try worked\n"));
    // Failed turn never lists messages; the completed one lists once.
    assert_eq!(gw.list_call_count(), 1);
}

#[tokio::test]
async fn failed_run_with_detail_prints_remote_message() {
    let gw = Arc::new(MockGateway::new());
    gw.script_failed_run(
        vec![RunStatus::InProgress, RunStatus::Cancelled],
        Some(RunFailure {
            code: None,
            message: Some("cancelled by operator".into()),
        }),
    );
    let chat = start(&gw).await;
    let mut out = Vec::new();
    let outcome = chat.submit_turn("q", &mut out).await.unwrap();
    let out = String::from_utf8(out).unwrap();

    assert!(matches!(outcome, TurnOutcome::RunFailed(ref r) if r.status == RunStatus::Cancelled));
    assert!(out.contains("Error: Run failed or was canceled: cancelled by operator\n"));
    assert_eq!(gw.list_call_count(), 0);
}

#[tokio::test]
async fn progress_dots_follow_poll_count() {
    let gw = Arc::new(MockGateway::new());
    gw.script_run(vec![
        RunStatus::Queued,
        RunStatus::Queued,
        RunStatus::InProgress,
        RunStatus::Completed,
    ]);
    let chat = start(&gw).await;
    let mut out = Vec::new();
    chat.submit_turn("q", &mut out).await.unwrap();
    let out = String::from_utf8(out).unwrap();
    assert!(out.starts_with("Agent is thinking...\n"), "{:?}", out);
}

#[tokio::test]
async fn blank_thread_id_is_thread_creation_error() {
    let gw: Arc<MockGateway> = Arc::new(MockGateway::new().with_blank_thread());
    let err = Conversation::start(gw, Agent::new("asst_1"), fast_poller())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, ChatError::ThreadCreation));
}

#[tokio::test]
async fn open_fetches_agent_and_banner_uses_its_name() {
    let gw = Arc::new(MockGateway::new().with_agent_name("BingGroundingAgent01"));
    let chat = Conversation::open(gw.clone(), "asst_9", fast_poller())
        .await
        .unwrap();
    assert_eq!(chat.agent().id, "asst_9");
    assert_eq!(chat.agent().display_name(), "BingGroundingAgent01");
    let mut out = Vec::new();
    chat.write_banner(&mut out).unwrap();
    let out = String::from_utf8(out).unwrap();
    assert_eq!(
        out,
        format!(
            "Chat with BingGroundingAgent01 (type 'exit' to quit):\n{}\n",
            "=".repeat(51)
        )
    );
    assert_eq!(
        gw.calls()[..2],
        [
            GatewayCall::GetAgent {
                agent_id: "asst_9".into()
            },
            GatewayCall::CreateThread
        ]
    );
}

#[tokio::test]
async fn poll_transport_error_ends_session() {
    let gw = Arc::new(MockGateway::new());
    gw.fail_polls();
    let chat = start(&gw).await;
    let mut out = Vec::new();
    let err = chat
        .run_loop("hello\nexit\n".as_bytes(), &mut out)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ChatError::Gateway(agent_thread::GatewayError::Transport(_))
    ));
    let out = String::from_utf8(out).unwrap();
    assert!(!out.contains("Goodbye!"));
}

#[tokio::test]
async fn non_utf8_input_is_submitted_lossily_and_session_continues() {
    let gw = Arc::new(MockGateway::new().with_echo_replies());
    let chat = start(&gw).await;
    let mut out = Vec::new();
    chat.run_loop(&b"caf\xe9\nhello\nexit\n"[..], &mut out)
        .await
        .unwrap();
    let out = String::from_utf8(out).unwrap();

    let texts: Vec<String> = gw
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            GatewayCall::CreateMessage { text, .. } => Some(text),
            _ => None,
        })
        .collect();
    assert_eq!(texts, vec!["caf\u{FFFD}".to_string(), "hello".to_string()]);
    assert!(out.contains("Agent: You said: hello\n"));
    assert!(out.ends_with("Goodbye!\n"));
}

#[tokio::test]
async fn crlf_exit_ends_session() {
    let gw = Arc::new(MockGateway::new());
    let out = run_session(&gw, "EXIT\r\n").await;
    assert!(out.ends_with("Goodbye!\n"));
    assert!(submissions(&gw).is_empty());
}

/// Accepts everything except progress dots.
struct DotRejectingWriter(Vec<u8>);

impl Write for DotRejectingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf == b"." {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdout closed"));
        }
        self.0.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn progress_write_failure_is_reported_after_run_settles() {
    let gw = Arc::new(MockGateway::new());
    gw.script_run(vec![RunStatus::Queued, RunStatus::InProgress, RunStatus::Completed]);
    let chat = start(&gw).await;
    let mut out = DotRejectingWriter(Vec::new());
    let err = chat.submit_turn("q", &mut out).await.unwrap_err();
    assert!(matches!(err, ChatError::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
    // Polling still ran to the terminal status; no listing after the failure.
    let polls = gw
        .calls()
        .iter()
        .filter(|c| matches!(c, GatewayCall::GetRun { .. }))
        .count();
    assert_eq!(polls, 2);
    assert_eq!(gw.list_call_count(), 0);
}
