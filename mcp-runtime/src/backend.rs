//! Backend selection: answer envelopes in-process or hand them to a tool-server
//! subprocess.

use serde_json::Value;

use crate::bridge::{BridgeError, SubprocessBridge};
use crate::{Dispatcher, MemoryStore};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendKind {
    #[default]
    Memory,
    Subprocess,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Subprocess => "subprocess",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "subprocess" => Ok(Self::Subprocess),
            _ => Err(format!("unknown backend: {s} (expected memory or subprocess)")),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Backend {
    Memory(Dispatcher),
    Subprocess(SubprocessBridge),
}

impl Backend {
    pub fn memory(store: MemoryStore) -> Self {
        Self::Memory(Dispatcher::new(store))
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Memory(_) => BackendKind::Memory,
            Self::Subprocess(_) => BackendKind::Subprocess,
        }
    }

    /// Turn one request envelope into one response envelope.
    ///
    /// The memory backend always produces an envelope; only the bridge can fail
    /// here, and its failures are transport-level, not JSON-RPC errors.
    pub async fn handle(&self, envelope: Value) -> Result<Value, BridgeError> {
        match self {
            Self::Memory(dispatcher) => Ok(dispatcher.handle_message(envelope)),
            Self::Subprocess(bridge) => bridge.forward(&envelope).await,
        }
    }
}
