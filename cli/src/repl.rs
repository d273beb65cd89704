//! Interactive session: banner, then the conversation loop on stdin/stdout.

use std::io::Write;
use std::sync::Arc;

use agent_thread::{AgentGateway, ChatError, Conversation, RunPoller};
use tokio::io::{AsyncBufRead, BufReader};

/// Opens a session for `agent_id` and chats on the process terminal until exit.
pub async fn run_chat(
    gateway: Arc<dyn AgentGateway>,
    agent_id: &str,
    poller: RunPoller,
) -> Result<(), ChatError> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    run_chat_with(gateway, agent_id, poller, stdin, &mut stdout).await
}

async fn run_chat_with<R, W>(
    gateway: Arc<dyn AgentGateway>,
    agent_id: &str,
    poller: RunPoller,
    input: R,
    out: &mut W,
) -> Result<(), ChatError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let chat = Conversation::open(gateway, agent_id, poller).await?;
    chat.write_banner(out)?;
    chat.run_loop(input, out).await
}
