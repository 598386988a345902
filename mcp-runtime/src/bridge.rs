//! Subprocess bridge: hand the raw envelope to an external tool server.
//!
//! One process per request. The envelope is written to the child's stdin as a
//! single line and stdin is closed, while the child's stdout is collected until
//! it exits. The last non-empty stdout line is the response envelope.

use std::process::Stdio;

use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("failed to spawn tool server '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("tool server I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("tool server exited ({status}) without writing a response")]
    EmptyOutput { status: std::process::ExitStatus },
    #[error("tool server wrote a line that is not JSON: {source}")]
    InvalidOutput {
        line: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode envelope for tool server: {0}")]
    Encode(#[source] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct SubprocessBridge {
    program: String,
    args: Vec<String>,
}

impl SubprocessBridge {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub async fn forward(&self, envelope: &Value) -> Result<Value, BridgeError> {
        let mut line = serde_json::to_vec(envelope).map_err(BridgeError::Encode)?;
        line.push(b'\n');

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| BridgeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        tracing::debug!(program = %self.program, pid = ?child.id(), "tool server spawned");

        // Feed stdin while stdout drains; a chatty child would otherwise fill
        // its pipe and block before reading the envelope.
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(&line).await?;
                stdin.shutdown().await?;
            }
            Ok::<(), std::io::Error>(())
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;
        match fed {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => {
                tracing::debug!(program = %self.program, "tool server closed stdin early");
            }
            Err(err) => return Err(err.into()),
        }
        let stdout = String::from_utf8_lossy(&output.stdout);

        let Some(last) = last_non_empty_line(&stdout) else {
            return Err(BridgeError::EmptyOutput {
                status: output.status,
            });
        };

        serde_json::from_str(last).map_err(|source| BridgeError::InvalidOutput {
            line: last.to_string(),
            source,
        })
    }
}

fn last_non_empty_line(output: &str) -> Option<&str> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .next_back()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn last_line_skips_trailing_blank_lines() {
        let output = "starting up\n{\"a\":1}\n\n   \n";
        assert_eq!(last_non_empty_line(output), Some("{\"a\":1}"));
        assert_eq!(last_non_empty_line("\n\n"), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn forward_relays_last_line_verbatim() {
        let bridge = SubprocessBridge::new(
            "sh",
            vec![
                "-c".to_string(),
                "cat >/dev/null; echo 'log noise'; echo '{\"jsonrpc\":\"2.0\",\"id\":7,\"result\":{}}'"
                    .to_string(),
            ],
        );

        let response = bridge
            .forward(&json!({ "jsonrpc": "2.0", "id": 7, "method": "tools/list" }))
            .await
            .expect("bridge should relay the child's response");
        assert_eq!(response, json!({ "jsonrpc": "2.0", "id": 7, "result": {} }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn forward_reports_non_json_output() {
        let bridge = SubprocessBridge::new(
            "sh",
            vec!["-c".to_string(), "cat >/dev/null; echo 'not json'".to_string()],
        );

        let err = bridge
            .forward(&json!({ "method": "initialize" }))
            .await
            .expect_err("non-JSON output must fail");
        assert!(matches!(err, BridgeError::InvalidOutput { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn forward_reports_silent_exit() {
        let bridge = SubprocessBridge::new("sh", vec!["-c".to_string(), "cat >/dev/null".to_string()]);
        let err = bridge
            .forward(&json!({ "method": "initialize" }))
            .await
            .expect_err("empty output must fail");
        assert!(matches!(err, BridgeError::EmptyOutput { .. }));
    }

    #[tokio::test]
    async fn forward_reports_missing_program() {
        let bridge = SubprocessBridge::new("recollect-definitely-not-installed", Vec::new());
        let err = bridge
            .forward(&json!({ "method": "initialize" }))
            .await
            .expect_err("spawn must fail");
        assert!(matches!(err, BridgeError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn forward_survives_child_that_floods_stdout_before_reading() {
        let bridge = SubprocessBridge::new(
            "sh",
            vec![
                "-c".to_string(),
                "head -c 200000 /dev/zero | tr '\\0' a; echo; cat >/dev/null; echo '{\"ok\":1}'"
                    .to_string(),
            ],
        );
        let envelope = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": { "name": "save_user_profile", "arguments": { "name": "x".repeat(200_000) } }
        });

        let response = tokio::time::timeout(
            std::time::Duration::from_secs(10),
            bridge.forward(&envelope),
        )
        .await
        .expect("bridge must not deadlock on a full pipe")
        .expect("bridge should relay the final line");
        assert_eq!(response, json!({ "ok": 1 }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn forward_tolerates_child_that_never_reads_stdin() {
        let bridge = SubprocessBridge::new(
            "sh",
            vec!["-c".to_string(), "echo '{\"ok\":2}'".to_string()],
        );
        let envelope = json!({ "method": "initialize", "params": { "pad": "y".repeat(200_000) } });

        let response = bridge
            .forward(&envelope)
            .await
            .expect("an early stdin close is not a failure");
        assert_eq!(response, json!({ "ok": 2 }));
    }
}
