//! Scripted in-memory gateway for tests and offline runs.
//!
//! Each created run follows a queued status script: the first status is returned by
//! `create_run`, every `get_run` advances one step, and the last status repeats.
//! When a run is first observed as `completed`, the next scripted reply (if any) is
//! appended to the thread as an agent message; with echo replies on, an unscripted
//! run answers `You said: <last user text>`. Every call is logged as a
//! [`GatewayCall`] so tests can assert ordering and counts.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::model::{
    Agent, ContentPart, Message, MessagePage, Role, Run, RunFailure, RunStatus, SortOrder, Thread,
};

use super::AgentGateway;

const DEFAULT_MOCK_PAGE_SIZE: usize = 20;

/// One recorded gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    GetAgent { agent_id: String },
    CreateThread,
    CreateMessage { thread_id: String, text: String },
    CreateRun { thread_id: String, agent_id: String },
    GetRun { thread_id: String, run_id: String },
    ListMessages { thread_id: String, after: Option<String> },
}

struct RunScript {
    statuses: VecDeque<RunStatus>,
    failure: Option<RunFailure>,
}

struct RunState {
    run: Run,
    script: VecDeque<RunStatus>,
    replied: bool,
}

#[derive(Default)]
struct MockState {
    agent_name: Option<String>,
    blank_thread: bool,
    fail_polls: bool,
    echo: bool,
    threads: HashMap<String, Vec<Message>>,
    runs: HashMap<String, RunState>,
    scripts: VecDeque<RunScript>,
    replies: VecDeque<Vec<ContentPart>>,
    calls: Vec<GatewayCall>,
    next_id: u64,
}

impl MockState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}_{}", prefix, self.next_id)
    }

    fn append(&mut self, thread_id: &str, role: Role, content: Vec<ContentPart>) -> Message {
        let id = self.next_id("msg");
        let created_at = self.next_id as i64;
        let message = Message {
            id,
            role,
            content,
            created_at,
        };
        self.threads
            .entry(thread_id.to_string())
            .or_default()
            .push(message.clone());
        message
    }

    fn echo_reply(&self, thread_id: &str) -> Vec<ContentPart> {
        let said = self
            .threads
            .get(thread_id)
            .and_then(|msgs| msgs.iter().rev().find(|m| m.role == Role::User))
            .and_then(|m| {
                m.content.iter().find_map(|c| match c {
                    ContentPart::Text { text } => Some(text.as_str()),
                    _ => None,
                })
            })
            .unwrap_or("");
        vec![ContentPart::text(format!("You said: {}", said))]
    }
}

/// In-memory [`AgentGateway`] with scripted run outcomes.
pub struct MockGateway {
    state: Mutex<MockState>,
    page_size: usize,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            page_size: DEFAULT_MOCK_PAGE_SIZE,
        }
    }

    /// Messages per `list_messages` page (min 1).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_agent_name(self, name: impl Into<String>) -> Self {
        self.state().agent_name = Some(name.into());
        self
    }

    /// Makes `create_thread` return a thread with an empty id.
    pub fn with_blank_thread(self) -> Self {
        self.state().blank_thread = true;
        self
    }

    /// When no reply is scripted, a completed run answers `You said: <last user text>`.
    pub fn with_echo_replies(self) -> Self {
        self.state().echo = true;
        self
    }

    /// Makes every `get_run` fail with a transport error.
    pub fn fail_polls(&self) -> &Self {
        self.state().fail_polls = true;
        self
    }

    /// Queues the status sequence for the next created run.
    pub fn script_run(&self, statuses: Vec<RunStatus>) -> &Self {
        self.state().scripts.push_back(RunScript {
            statuses: statuses.into(),
            failure: None,
        });
        self
    }

    /// Queues a status sequence whose final run carries `failure` as its error detail.
    pub fn script_failed_run(&self, statuses: Vec<RunStatus>, failure: Option<RunFailure>) -> &Self {
        self.state().scripts.push_back(RunScript {
            statuses: statuses.into(),
            failure,
        });
        self
    }

    /// Queues the agent reply posted when the next run completes.
    pub fn script_reply(&self, content: Vec<ContentPart>) -> &Self {
        self.state().replies.push_back(content);
        self
    }

    /// Creates a thread directly (not logged as a call). Returns its id.
    pub fn seed_thread(&self) -> String {
        let mut state = self.state();
        let id = state.next_id("thread");
        state.threads.insert(id.clone(), Vec::new());
        id
    }

    /// Appends a message directly (not logged as a call).
    pub fn push_message(&self, thread_id: &str, role: Role, content: Vec<ContentPart>) -> Message {
        self.state().append(thread_id, role, content)
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state().calls.clone()
    }

    pub fn list_call_count(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| matches!(c, GatewayCall::ListMessages { .. }))
            .count()
    }

    pub fn messages_of(&self, thread_id: &str) -> Vec<Message> {
        self.state()
            .threads
            .get(thread_id)
            .cloned()
            .unwrap_or_default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl AgentGateway for MockGateway {
    async fn get_agent(&self, agent_id: &str) -> Result<Agent, GatewayError> {
        let mut state = self.state();
        state.calls.push(GatewayCall::GetAgent {
            agent_id: agent_id.to_string(),
        });
        Ok(Agent {
            id: agent_id.to_string(),
            name: state.agent_name.clone(),
        })
    }

    async fn create_thread(&self) -> Result<Thread, GatewayError> {
        let mut state = self.state();
        state.calls.push(GatewayCall::CreateThread);
        if state.blank_thread {
            return Ok(Thread::new(""));
        }
        let id = state.next_id("thread");
        state.threads.insert(id.clone(), Vec::new());
        Ok(Thread::new(id))
    }

    async fn create_message(
        &self,
        thread_id: &str,
        role: Role,
        text: &str,
    ) -> Result<Message, GatewayError> {
        let mut state = self.state();
        state.calls.push(GatewayCall::CreateMessage {
            thread_id: thread_id.to_string(),
            text: text.to_string(),
        });
        if !state.threads.contains_key(thread_id) {
            return Err(GatewayError::NotFound(format!("thread {}", thread_id)));
        }
        Ok(state.append(thread_id, role, vec![ContentPart::text(text)]))
    }

    async fn create_run(&self, thread_id: &str, agent_id: &str) -> Result<Run, GatewayError> {
        let mut state = self.state();
        state.calls.push(GatewayCall::CreateRun {
            thread_id: thread_id.to_string(),
            agent_id: agent_id.to_string(),
        });
        if !state.threads.contains_key(thread_id) {
            return Err(GatewayError::NotFound(format!("thread {}", thread_id)));
        }
        let script = state.scripts.pop_front().unwrap_or_else(|| RunScript {
            statuses: VecDeque::from([RunStatus::Queued, RunStatus::Completed]),
            failure: None,
        });
        let mut statuses = script.statuses;
        let status = statuses.pop_front().unwrap_or(RunStatus::Completed);
        let id = state.next_id("run");
        let run = Run {
            id: id.clone(),
            thread_id: thread_id.to_string(),
            status,
            last_error: script.failure,
        };
        state.runs.insert(
            id,
            RunState {
                run: run.clone(),
                script: statuses,
                replied: false,
            },
        );
        Ok(run)
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, GatewayError> {
        let mut state = self.state();
        state.calls.push(GatewayCall::GetRun {
            thread_id: thread_id.to_string(),
            run_id: run_id.to_string(),
        });
        if state.fail_polls {
            return Err(GatewayError::Transport("connection reset".to_string()));
        }
        let (run, post_reply) = {
            let entry = state
                .runs
                .get_mut(run_id)
                .filter(|r| r.run.thread_id == thread_id)
                .ok_or_else(|| GatewayError::NotFound(format!("run {}", run_id)))?;
            if let Some(next) = entry.script.pop_front() {
                entry.run.status = next;
            }
            let post_reply = entry.run.status.is_success() && !entry.replied;
            if post_reply {
                entry.replied = true;
            }
            (entry.run.clone(), post_reply)
        };
        if post_reply {
            if let Some(content) = state.replies.pop_front() {
                state.append(thread_id, Role::Agent, content);
            } else if state.echo {
                let content = state.echo_reply(thread_id);
                state.append(thread_id, Role::Agent, content);
            }
        }
        Ok(run)
    }

    async fn list_messages(
        &self,
        thread_id: &str,
        order: SortOrder,
        after: Option<&str>,
    ) -> Result<MessagePage, GatewayError> {
        let mut state = self.state();
        state.calls.push(GatewayCall::ListMessages {
            thread_id: thread_id.to_string(),
            after: after.map(str::to_string),
        });
        let mut all = state
            .threads
            .get(thread_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("thread {}", thread_id)))?;
        all.sort_by_key(|m| m.created_at);
        if order == SortOrder::Descending {
            all.reverse();
        }
        let start = match after {
            Some(cursor) => all
                .iter()
                .position(|m| m.id == cursor)
                .map(|i| i + 1)
                .unwrap_or(all.len()),
            None => 0,
        };
        let data: Vec<Message> = all.iter().skip(start).take(self.page_size).cloned().collect();
        let has_more = start + data.len() < all.len();
        let last_id = data.last().map(|m| m.id.clone());
        Ok(MessagePage {
            data,
            has_more,
            last_id,
        })
    }
}
