//! agent-chat binary: interactive chat with a remote agent.
//!
//! Settings come from flags, then the environment, which `config::load_and_apply`
//! fills from `./.env` and `~/.config/agent-chat/config.toml`.

mod repl;

use std::sync::Arc;
use std::time::Duration;

use agent_thread::{AgentGateway, HttpGateway, MockGateway, RunPoller};
use clap::Parser;
use config::AgentSettings;

const APP_NAME: &str = "agent-chat";
const OFFLINE_AGENT_ID: &str = "offline";

#[derive(Parser, Debug)]
#[command(name = "agent-chat")]
#[command(about = "Chat with a remote agent: one thread, one run per message")]
struct Args {
    /// Agent service endpoint (project URL)
    #[arg(long, value_name = "URL", env = config::ENDPOINT_KEY)]
    endpoint: Option<String>,

    /// Id of the agent that answers
    #[arg(long, value_name = "ID", env = config::AGENT_ID_KEY)]
    agent_id: Option<String>,

    /// Bearer token sent with every request
    #[arg(long, value_name = "TOKEN", env = config::API_KEY_KEY, hide_env_values = true)]
    api_key: Option<String>,

    /// Service API version (default: agent_thread::DEFAULT_API_VERSION)
    #[arg(long, value_name = "VERSION", env = config::API_VERSION_KEY)]
    api_version: Option<String>,

    /// Delay between run status checks
    #[arg(
        long,
        value_name = "MS",
        env = "AGENT_CHAT_POLL_INTERVAL_MS",
        default_value_t = 500
    )]
    poll_interval_ms: u64,

    /// Talk to a built-in echo agent instead of the service (no settings needed)
    #[arg(long)]
    offline: bool,
}

impl Args {
    fn settings(&self) -> Result<AgentSettings, config::SettingsError> {
        AgentSettings::from_lookup(|key| match key {
            config::ENDPOINT_KEY => self.endpoint.clone(),
            config::AGENT_ID_KEY => self.agent_id.clone(),
            config::API_KEY_KEY => self.api_key.clone(),
            config::API_VERSION_KEY => self.api_version.clone(),
            _ => None,
        })
    }
}

fn http_gateway(settings: &AgentSettings) -> HttpGateway {
    let mut gw = HttpGateway::new(settings.endpoint.as_str());
    if let Some(ref key) = settings.api_key {
        gw = gw.with_api_key(key.as_str());
    }
    if let Some(ref version) = settings.api_version {
        gw = gw.with_api_version(version.as_str());
    }
    gw
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = config::load_and_apply(APP_NAME, None) {
        eprintln!("{}: ignoring config: {}", APP_NAME, e);
    }
    let _log_guard = config::tracing_init::init("info")?;

    let args = Args::parse();
    let poller = RunPoller::new(Duration::from_millis(args.poll_interval_ms));

    let (gateway, agent_id): (Arc<dyn AgentGateway>, String) = if args.offline {
        let mock = MockGateway::new()
            .with_agent_name("offline echo agent")
            .with_echo_replies();
        (Arc::new(mock) as Arc<dyn AgentGateway>, OFFLINE_AGENT_ID.to_string())
    } else {
        match args.settings() {
            Ok(settings) => {
                tracing::info!(endpoint = %settings.endpoint, agent_id = %settings.agent_id, "using agent service");
                (
                    Arc::new(http_gateway(&settings)) as Arc<dyn AgentGateway>,
                    settings.agent_id,
                )
            }
            Err(e) => {
                tracing::warn!(error = %e, "configuration incomplete");
                for line in AgentSettings::setup_instructions(APP_NAME) {
                    eprintln!("{}", line);
                }
                return Ok(());
            }
        }
    };

    // Missing settings and a thread without an id end the program normally (exit 0);
    // only gateway and terminal failures exit non-zero.
    match repl::run_chat(gateway, &agent_id, poller).await {
        Ok(()) => Ok(()),
        Err(agent_thread::ChatError::ThreadCreation) => {
            eprintln!("Failed to create a thread.");
            Ok(())
        }
        Err(e) => {
            eprintln!("{}: {}", APP_NAME, e);
            std::process::exit(1);
        }
    }
}
