use clap::Parser;
use recollect_mcp_runtime::{Backend, BackendKind, MemoryStore, SubprocessBridge};

/// Runtime configuration. Every flag can also come from the environment
/// (and from `.env`, loaded before parsing).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "recollect-api",
    version,
    about = "recollect MCP server over HTTP with an SSE endpoint handshake"
)]
pub struct Config {
    /// Port to listen on (all interfaces)
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Where tool calls are answered: in-process memory or a tool-server subprocess
    #[arg(long, env = "RECOLLECT_BACKEND", default_value = "memory")]
    pub backend: BackendKind,

    /// Program spawned per request when the subprocess backend is selected
    #[arg(long, env = "RECOLLECT_BRIDGE_COMMAND", default_value = "recollect-mcp")]
    pub bridge_command: String,

    /// Whitespace-separated arguments for the bridge program
    #[arg(long, env = "RECOLLECT_BRIDGE_ARGS", default_value = "serve")]
    pub bridge_args: String,

    /// Public base URL advertised on /sse (derived from request headers when unset)
    #[arg(long, env = "RECOLLECT_PUBLIC_URL")]
    pub public_url: Option<String>,

    /// Comma-separated CORS origins
    #[arg(long, env = "RECOLLECT_CORS_ORIGINS", default_value = "http://localhost:3000")]
    pub cors_origins: String,
}

impl Config {
    pub fn bridge_args(&self) -> Vec<String> {
        self.bridge_args
            .split_whitespace()
            .map(ToOwned::to_owned)
            .collect()
    }

    /// Validated public base URL without a trailing slash.
    pub fn public_base_url(&self) -> Result<Option<String>, url::ParseError> {
        let Some(raw) = self.public_url.as_deref().map(str::trim) else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }
        let parsed = url::Url::parse(raw)?;
        Ok(Some(parsed.as_str().trim_end_matches('/').to_string()))
    }

    pub fn build_backend(&self, store: &MemoryStore) -> Backend {
        match self.backend {
            BackendKind::Memory => Backend::memory(store.clone()),
            BackendKind::Subprocess => Backend::Subprocess(SubprocessBridge::new(
                self.bridge_command.clone(),
                self.bridge_args(),
            )),
        }
    }
}
