pub mod health;
pub mod mcp_sse;
pub mod memory;
