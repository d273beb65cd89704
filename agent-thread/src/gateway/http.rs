//! HttpGateway: agents REST surface (assistants / threads / messages / runs) over reqwest.
//!
//! Every request carries `api-version` as a query parameter and, when configured, a
//! bearer token. The token is opaque here; acquiring it is the caller's business.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::error::GatewayError;
use crate::model::{
    Agent, ContentPart, Message, MessagePage, Role, Run, RunFailure, RunStatus, SortOrder, Thread,
};

use super::AgentGateway;

pub const DEFAULT_API_VERSION: &str = "2025-05-01";
/// Messages requested per page when listing.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

#[derive(Deserialize)]
struct WireAgent {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct WireThread {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Deserialize)]
struct WireText {
    #[serde(default)]
    value: String,
}

#[derive(Deserialize)]
struct WireImageFile {
    file_id: String,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireContent {
    Text {
        text: WireText,
    },
    ImageFile {
        image_file: WireImageFile,
    },
    #[serde(other)]
    Unknown,
}

impl From<WireContent> for ContentPart {
    fn from(c: WireContent) -> Self {
        match c {
            WireContent::Text { text } => ContentPart::Text { text: text.value },
            WireContent::ImageFile { image_file } => ContentPart::ImageReference {
                file_id: image_file.file_id,
            },
            WireContent::Unknown => ContentPart::Unknown,
        }
    }
}

#[derive(Deserialize)]
struct WireMessage {
    id: String,
    role: String,
    #[serde(default)]
    content: Vec<WireContent>,
    #[serde(default)]
    created_at: i64,
}

impl From<WireMessage> for Message {
    fn from(m: WireMessage) -> Self {
        Message {
            id: m.id,
            role: Role::from_wire(&m.role),
            content: m.content.into_iter().map(ContentPart::from).collect(),
            created_at: m.created_at,
        }
    }
}

#[derive(Deserialize)]
struct WireRunError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct WireRun {
    id: String,
    #[serde(default)]
    thread_id: String,
    status: String,
    #[serde(default)]
    last_error: Option<WireRunError>,
}

impl From<WireRun> for Run {
    fn from(r: WireRun) -> Self {
        Run {
            id: r.id,
            thread_id: r.thread_id,
            status: RunStatus::from_wire(&r.status),
            last_error: r.last_error.map(|e| RunFailure {
                code: e.code,
                message: e.message,
            }),
        }
    }
}

#[derive(Deserialize)]
struct WireMessageList {
    #[serde(default)]
    data: Vec<WireMessage>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    last_id: Option<String>,
}

/// [`AgentGateway`] backed by the service's REST API.
pub struct HttpGateway {
    client: reqwest::Client,
    endpoint: String,
    api_version: String,
    api_key: Option<String>,
    page_limit: u32,
}

impl HttpGateway {
    /// `endpoint` is the project base URL; paths such as `threads` are appended to it.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            api_key: None,
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let key = api_key.into();
        self.api_key = (!key.is_empty()).then_some(key);
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit.max(1);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.endpoint, path);
        let rb = self
            .client
            .request(method, url)
            .query(&[("api-version", self.api_version.as_str())]);
        match &self.api_key {
            Some(key) => rb.bearer_auth(key),
            None => rb,
        }
    }

    async fn send<T: DeserializeOwned>(&self, rb: RequestBuilder) -> Result<T, GatewayError> {
        let res = rb
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), body = %body, "agents api error");
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let text = res
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

#[async_trait]
impl AgentGateway for HttpGateway {
    async fn get_agent(&self, agent_id: &str) -> Result<Agent, GatewayError> {
        tracing::debug!(agent_id, "get agent");
        let wire: WireAgent = self
            .send(self.request(Method::GET, &format!("assistants/{}", agent_id)))
            .await?;
        Ok(Agent {
            id: wire.id,
            name: wire.name,
        })
    }

    async fn create_thread(&self) -> Result<Thread, GatewayError> {
        let wire: WireThread = self
            .send(self.request(Method::POST, "threads").json(&json!({})))
            .await?;
        let id = wire.id.unwrap_or_default();
        tracing::debug!(thread_id = %id, "thread created");
        Ok(Thread::new(id))
    }

    async fn create_message(
        &self,
        thread_id: &str,
        role: Role,
        text: &str,
    ) -> Result<Message, GatewayError> {
        let body = json!({ "role": role.as_wire(), "content": text });
        let wire: WireMessage = self
            .send(
                self.request(Method::POST, &format!("threads/{}/messages", thread_id))
                    .json(&body),
            )
            .await?;
        tracing::debug!(thread_id, message_id = %wire.id, "message created");
        Ok(wire.into())
    }

    async fn create_run(&self, thread_id: &str, agent_id: &str) -> Result<Run, GatewayError> {
        let body = json!({ "assistant_id": agent_id });
        let wire: WireRun = self
            .send(
                self.request(Method::POST, &format!("threads/{}/runs", thread_id))
                    .json(&body),
            )
            .await?;
        let mut run = Run::from(wire);
        if run.thread_id.is_empty() {
            run.thread_id = thread_id.to_string();
        }
        tracing::debug!(thread_id, run_id = %run.id, status = %run.status, "run created");
        Ok(run)
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, GatewayError> {
        let wire: WireRun = self
            .send(self.request(
                Method::GET,
                &format!("threads/{}/runs/{}", thread_id, run_id),
            ))
            .await?;
        let mut run = Run::from(wire);
        if run.thread_id.is_empty() {
            run.thread_id = thread_id.to_string();
        }
        Ok(run)
    }

    async fn list_messages(
        &self,
        thread_id: &str,
        order: SortOrder,
        after: Option<&str>,
    ) -> Result<MessagePage, GatewayError> {
        let limit = self.page_limit.to_string();
        let mut rb = self
            .request(Method::GET, &format!("threads/{}/messages", thread_id))
            .query(&[("order", order.as_query()), ("limit", limit.as_str())]);
        if let Some(cursor) = after {
            rb = rb.query(&[("after", cursor)]);
        }
        let wire: WireMessageList = self.send(rb).await?;
        tracing::debug!(
            thread_id,
            count = wire.data.len(),
            has_more = wire.has_more,
            "messages page"
        );
        Ok(MessagePage {
            data: wire.data.into_iter().map(Message::from).collect(),
            has_more: wire.has_more,
            last_id: wire.last_id,
        })
    }
}
