//! Conversation loop: one thread, strictly serialized turns.
//!
//! Each turn posts the user's text, starts a run, waits for it with [`RunPoller`],
//! then prints the newest agent message. A run that ends in any status other than
//! `completed` prints one error line and the loop moves on to the next prompt.
//! Gateway and terminal I/O errors end the session.
//!
//! Transcript shape:
//!
//! ```text
//! You: hello
//! Agent is thinking...
//! Agent: Hi! How can I help?
//! ```

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::ChatError;
use crate::gateway::{latest_agent_message, AgentGateway};
use crate::model::{Agent, Message, Role, Run, Thread};
use crate::poller::RunPoller;
use crate::render::render_content;

pub const EXIT_COMMAND: &str = "exit";
pub const PROMPT: &str = "\nYou: ";
pub const THINKING: &str = "Agent is thinking";
pub const REPLY_PREFIX: &str = "Agent: ";
pub const FAREWELL: &str = "Goodbye!";
/// Shown in place of the remote error message when the run carries none.
pub const NO_ERROR_DETAIL: &str = "(no error details)";

/// True for blank input and for `exit` in any letter case.
pub fn is_exit_command(input: &str) -> bool {
    input.trim().is_empty() || input.eq_ignore_ascii_case(EXIT_COMMAND)
}

/// Reads one line without its terminator, decoding lossily. End of input yields `""`.
async fn read_input_line<R: AsyncBufRead + Unpin>(input: &mut R) -> std::io::Result<String> {
    let mut buf = Vec::new();
    input.read_until(b'\n', &mut buf).await?;
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Result of one submitted turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The run completed and this agent message was printed.
    Replied(Message),
    /// The run completed but the thread holds no agent message.
    NoReply,
    /// The run ended in a non-success terminal status.
    RunFailed(Run),
}

pub struct Conversation {
    gateway: Arc<dyn AgentGateway>,
    agent: Agent,
    thread: Thread,
    poller: RunPoller,
}

impl Conversation {
    /// Creates the session thread. A thread without an id is [`ChatError::ThreadCreation`].
    pub async fn start(
        gateway: Arc<dyn AgentGateway>,
        agent: Agent,
        poller: RunPoller,
    ) -> Result<Self, ChatError> {
        let thread = gateway.create_thread().await?;
        if thread.id.trim().is_empty() {
            return Err(ChatError::ThreadCreation);
        }
        tracing::info!(thread_id = %thread.id, agent_id = %agent.id, "conversation started");
        Ok(Self {
            gateway,
            agent,
            thread,
            poller,
        })
    }

    /// Looks up `agent_id`, then [`start`](Self::start)s a session for it.
    pub async fn open(
        gateway: Arc<dyn AgentGateway>,
        agent_id: &str,
        poller: RunPoller,
    ) -> Result<Self, ChatError> {
        let agent = gateway.get_agent(agent_id).await?;
        Self::start(gateway, agent, poller).await
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn thread(&self) -> &Thread {
        &self.thread
    }

    pub fn write_banner<W: Write + ?Sized>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(
            out,
            "Chat with {} (type '{}' to quit):",
            self.agent.display_name(),
            EXIT_COMMAND
        )?;
        writeln!(out, "{}", "=".repeat(51))?;
        out.flush()
    }

    /// Runs one full turn for `text` and prints its outcome to `out`.
    pub async fn submit_turn<W: Write + ?Sized>(
        &self,
        text: &str,
        out: &mut W,
    ) -> Result<TurnOutcome, ChatError> {
        let thread_id = self.thread.id.as_str();
        self.gateway
            .create_message(thread_id, Role::User, text)
            .await?;
        let run = self.gateway.create_run(thread_id, &self.agent.id).await?;
        tracing::debug!(thread_id, run_id = %run.id, "run submitted");

        write!(out, "{}", THINKING)?;
        out.flush()?;
        let mut tick_error: Option<std::io::Error> = None;
        let run = self
            .poller
            .wait(self.gateway.as_ref(), run, || {
                if tick_error.is_some() {
                    return;
                }
                if let Err(e) = write!(out, ".") {
                    tick_error = Some(e);
                } else if let Err(e) = out.flush() {
                    tick_error = Some(e);
                }
            })
            .await?;
        if let Some(e) = tick_error {
            return Err(e.into());
        }
        writeln!(out)?;

        if !run.status.is_success() {
            let detail = run.error_message().unwrap_or(NO_ERROR_DETAIL);
            tracing::warn!(run_id = %run.id, status = %run.status, detail, "run did not complete");
            writeln!(out, "Error: Run failed or was canceled: {}", detail)?;
            out.flush()?;
            return Ok(TurnOutcome::RunFailed(run));
        }

        match latest_agent_message(self.gateway.as_ref(), thread_id).await? {
            Some(message) => {
                write!(out, "{}", REPLY_PREFIX)?;
                render_content(&message.content, out)?;
                Ok(TurnOutcome::Replied(message))
            }
            None => {
                tracing::debug!(thread_id, run_id = %run.id, "completed run left no agent message");
                out.flush()?;
                Ok(TurnOutcome::NoReply)
            }
        }
    }

    /// Prompt, read, submit, repeat. Returns after printing the farewell.
    ///
    /// End of input counts as a blank line. Bytes that are not UTF-8 are replaced
    /// with U+FFFD rather than ending the session.
    pub async fn run_loop<R, W>(&self, mut input: R, out: &mut W) -> Result<(), ChatError>
    where
        R: AsyncBufRead + Unpin,
        W: Write + ?Sized,
    {
        loop {
            write!(out, "{}", PROMPT)?;
            out.flush()?;

            let line = read_input_line(&mut input).await?;
            if is_exit_command(&line) {
                writeln!(out, "{}", FAREWELL)?;
                out.flush()?;
                return Ok(());
            }

            self.submit_turn(&line, out).await?;
        }
    }
}
