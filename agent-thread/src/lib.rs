//! # agent-thread
//!
//! Client-side orchestration of a remote conversational agent: create a thread, post
//! a user message, start a run, poll the run until it settles, then print the newest
//! agent reply.
//!
//! ## Modules
//!
//! - [`model`]: `Thread`, `Message`, `ContentPart`, `Run`, `RunStatus`.
//! - [`gateway`]: [`AgentGateway`] trait, lazy [`messages`] pager, [`HttpGateway`], [`MockGateway`].
//! - [`poller`]: [`RunPoller`], fixed-interval wait for a terminal run status.
//! - [`render`]: content parts to terminal text.
//! - [`conversation`]: [`Conversation`], the REPL turn loop.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use agent_thread::{Conversation, HttpGateway, RunPoller};
//!
//! # async fn demo() -> Result<(), agent_thread::ChatError> {
//! let gateway = Arc::new(HttpGateway::new("https://example.test/api/projects/demo"));
//! let chat = Conversation::open(gateway, "asst_123", RunPoller::default()).await?;
//! let stdin = tokio::io::BufReader::new(tokio::io::stdin());
//! chat.run_loop(stdin, &mut std::io::stdout()).await?;
//! # Ok(())
//! # }
//! ```

pub mod conversation;
pub mod error;
pub mod gateway;
pub mod model;
pub mod poller;
pub mod render;

pub use conversation::{is_exit_command, Conversation, TurnOutcome};
pub use error::{ChatError, GatewayError};
pub use gateway::{
    latest_agent_message, messages, AgentGateway, GatewayCall, HttpGateway, MockGateway,
    DEFAULT_API_VERSION, DEFAULT_PAGE_LIMIT,
};
pub use model::{
    Agent, ContentPart, Message, MessagePage, Role, Run, RunFailure, RunStatus, SortOrder, Thread,
};
pub use poller::{RunPoller, DEFAULT_POLL_INTERVAL};
pub use render::{render_content, render_to_string};
