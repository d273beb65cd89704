//! Conversation data model: agent, thread, message, content part, run.
//!
//! These are the domain types handed across the [`AgentGateway`](crate::AgentGateway)
//! boundary. Wire shapes live in the HTTP gateway; nothing here knows about JSON
//! except [`RunStatus`], whose string form is shared by every gateway.

use std::fmt;

/// Agent descriptor looked up once before the session starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub id: String,
    pub name: Option<String>,
}

impl Agent {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name for the banner; falls back to the id when the agent is unnamed.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(n) if !n.trim().is_empty() => n,
            _ => &self.id,
        }
    }
}

/// Server-side conversation session handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thread {
    pub id: String,
}

impl Thread {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Who authored a message. Every non-user author is treated as the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Agent,
}

impl Role {
    /// Maps a wire role (`"user"`, `"assistant"`, ...) to a [`Role`].
    pub fn from_wire(s: &str) -> Self {
        if s.eq_ignore_ascii_case("user") {
            Role::User
        } else {
            Role::Agent
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Agent => "assistant",
        }
    }
}

/// One unit of a message body. `Unknown` covers kinds this client cannot render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text { text: String },
    ImageReference { file_id: String },
    Unknown,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    pub fn image(file_id: impl Into<String>) -> Self {
        ContentPart::ImageReference {
            file_id: file_id.into(),
        }
    }
}

/// One turn in the thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: Vec<ContentPart>,
    /// Creation time (unix seconds); defines creation order.
    pub created_at: i64,
}

/// Run lifecycle status as reported by the service.
///
/// Only `Queued` and `InProgress` keep the poller waiting. Every other value,
/// including ones this client does not know (`Other`), is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Completed,
    Failed,
    Cancelled,
    Expired,
    Incomplete,
    Other(String),
}

impl RunStatus {
    pub fn from_wire(s: &str) -> Self {
        match s {
            "queued" => RunStatus::Queued,
            "in_progress" => RunStatus::InProgress,
            "requires_action" => RunStatus::RequiresAction,
            "cancelling" => RunStatus::Cancelling,
            "completed" => RunStatus::Completed,
            "failed" => RunStatus::Failed,
            "cancelled" => RunStatus::Cancelled,
            "expired" => RunStatus::Expired,
            "incomplete" => RunStatus::Incomplete,
            other => RunStatus::Other(other.to_string()),
        }
    }

    pub fn as_wire(&self) -> &str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Expired => "expired",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Other(s) => s,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Queued | RunStatus::InProgress)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Completed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Error detail attached to a run that did not complete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunFailure {
    pub code: Option<String>,
    pub message: Option<String>,
}

/// One execution of the agent against the thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub id: String,
    pub thread_id: String,
    pub status: RunStatus,
    pub last_error: Option<RunFailure>,
}

impl Run {
    /// Remote error message, if the service sent a non-empty one.
    pub fn error_message(&self) -> Option<&str> {
        self.last_error
            .as_ref()
            .and_then(|e| e.message.as_deref())
            .filter(|m| !m.trim().is_empty())
    }
}

/// Sort order for message listing (by creation time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    pub fn as_query(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

/// One server page of a message listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagePage {
    pub data: Vec<Message>,
    pub has_more: bool,
    /// Cursor for the next page (`after=`).
    pub last_id: Option<String>,
}
