//! Gateway boundary to the remote agent service.
//!
//! The conversation core depends only on [`AgentGateway`]. Two implementations ship
//! with the crate:
//! - [`HttpGateway`]: the agents REST surface over `reqwest`.
//! - [`MockGateway`]: scripted in-memory service for tests and offline demos.
//!
//! Message listing is paginated server-side; [`messages`] exposes it as a lazy
//! stream so callers stop fetching as soon as they have what they need.

mod http;
mod mock;

pub use http::{HttpGateway, DEFAULT_API_VERSION, DEFAULT_PAGE_LIMIT};
pub use mock::{GatewayCall, MockGateway};

use std::collections::VecDeque;

use async_trait::async_trait;
use futures::{Stream, TryStreamExt};

use crate::error::GatewayError;
use crate::model::{Agent, Message, MessagePage, Role, Run, SortOrder, Thread};

#[async_trait]
pub trait AgentGateway: Send + Sync {
    /// Looks up the agent that runs will be created for.
    async fn get_agent(&self, agent_id: &str) -> Result<Agent, GatewayError>;

    async fn create_thread(&self) -> Result<Thread, GatewayError>;

    async fn create_message(
        &self,
        thread_id: &str,
        role: Role,
        text: &str,
    ) -> Result<Message, GatewayError>;

    /// Starts a run of `agent_id` on the thread. The returned status is whatever the
    /// service reports at creation time (usually `queued`).
    async fn create_run(&self, thread_id: &str, agent_id: &str) -> Result<Run, GatewayError>;

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, GatewayError>;

    /// Fetches one page of messages. `after` is the cursor from the previous page.
    async fn list_messages(
        &self,
        thread_id: &str,
        order: SortOrder,
        after: Option<&str>,
    ) -> Result<MessagePage, GatewayError>;
}

struct Pager {
    buffer: VecDeque<Message>,
    cursor: Option<String>,
    exhausted: bool,
}

async fn next_message(
    gateway: &dyn AgentGateway,
    thread_id: &str,
    order: SortOrder,
    mut pager: Pager,
) -> Result<Option<(Message, Pager)>, GatewayError> {
    loop {
        if let Some(message) = pager.buffer.pop_front() {
            return Ok(Some((message, pager)));
        }
        if pager.exhausted {
            return Ok(None);
        }
        let page = gateway
            .list_messages(thread_id, order, pager.cursor.as_deref())
            .await?;
        let cursor = page
            .last_id
            .or_else(|| page.data.last().map(|m| m.id.clone()));
        pager.exhausted = !page.has_more || page.data.is_empty() || cursor.is_none();
        pager.cursor = cursor;
        pager.buffer.extend(page.data);
    }
}

/// Lazily walks every message of a thread, one server page at a time.
///
/// The next page is requested only after the current one has been consumed, so
/// dropping the stream early avoids the remaining requests. Calling this again
/// restarts from the first page.
pub fn messages<'a>(
    gateway: &'a dyn AgentGateway,
    thread_id: &'a str,
    order: SortOrder,
) -> impl Stream<Item = Result<Message, GatewayError>> + Send + 'a {
    let pager = Pager {
        buffer: VecDeque::new(),
        cursor: None,
        exhausted: false,
    };
    futures::stream::try_unfold(pager, move |pager| {
        next_message(gateway, thread_id, order, pager)
    })
}

/// Most recent message not authored by the user, or `None` when the thread has none.
pub async fn latest_agent_message(
    gateway: &dyn AgentGateway,
    thread_id: &str,
) -> Result<Option<Message>, GatewayError> {
    let mut stream = std::pin::pin!(messages(gateway, thread_id, SortOrder::Descending));
    while let Some(message) = stream.try_next().await? {
        if message.role != Role::User {
            return Ok(Some(message));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContentPart;

    fn seeded(page_size: usize) -> (MockGateway, String) {
        let gw = MockGateway::new().with_page_size(page_size);
        let thread = gw.seed_thread();
        gw.push_message(&thread, Role::User, vec![ContentPart::text("q1")]);
        gw.push_message(&thread, Role::Agent, vec![ContentPart::text("a1")]);
        gw.push_message(&thread, Role::User, vec![ContentPart::text("q2")]);
        gw.push_message(&thread, Role::User, vec![ContentPart::text("q3")]);
        (gw, thread)
    }

    #[tokio::test]
    async fn messages_walks_all_pages_in_descending_order() {
        let (gw, thread) = seeded(1);
        let all: Vec<Message> = messages(&gw, &thread, SortOrder::Descending)
            .try_collect()
            .await
            .unwrap();
        let texts: Vec<_> = all
            .iter()
            .map(|m| match &m.content[0] {
                ContentPart::Text { text } => text.clone(),
                _ => String::new(),
            })
            .collect();
        assert_eq!(texts, vec!["q3", "q2", "a1", "q1"]);
        assert_eq!(gw.list_call_count(), 4);
    }

    #[tokio::test]
    async fn latest_agent_message_stops_at_first_match() {
        let (gw, thread) = seeded(1);
        let found = latest_agent_message(&gw, &thread).await.unwrap().unwrap();
        assert_eq!(found.role, Role::Agent);
        assert_eq!(found.content, vec![ContentPart::text("a1")]);
        // q3, q2, a1: the page holding q1 is never requested.
        assert_eq!(gw.list_call_count(), 3);
    }

    #[tokio::test]
    async fn latest_agent_message_none_when_only_user_messages() {
        let gw = MockGateway::new().with_page_size(2);
        let thread = gw.seed_thread();
        gw.push_message(&thread, Role::User, vec![ContentPart::text("hi")]);
        assert!(latest_agent_message(&gw, &thread).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn messages_on_empty_thread_is_empty() {
        let gw = MockGateway::new();
        let thread = gw.seed_thread();
        let all: Vec<Message> = messages(&gw, &thread, SortOrder::Ascending)
            .try_collect()
            .await
            .unwrap();
        assert!(all.is_empty());
        assert_eq!(gw.list_call_count(), 1);
    }
}
