//! Runs the external client executable as an OS process.

use crate::domain::model::{ClientCommand, ClientOutput};
use crate::domain::ports::ClientRunner;
use crate::utils::error::{HarnessError, Result};
use crate::utils::timer::timed;
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug, Clone)]
pub struct ProcessClient {
    command: ClientCommand,
}

impl ProcessClient {
    pub fn new(command: ClientCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &ClientCommand {
        &self.command
    }
}

#[async_trait]
impl ClientRunner for ProcessClient {
    async fn run(&self, invocation: usize, stdin: Arc<str>) -> Result<ClientOutput> {
        let mut child = Command::new(&self.command.path)
            .args(self.command.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| HarnessError::ClientSpawnError {
                invocation,
                command: self.command.command_line(),
                source,
            })?;

        tracing::debug!(
            pid = ?child.id(),
            "Spawned client #{}: {}",
            invocation,
            self.command.command_line()
        );

        // stdin 另開 task 寫入，避免與 stdout 互相卡住
        let mut pipe = child.stdin.take().ok_or_else(|| HarnessError::ClientInputError {
            invocation,
            source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdin not captured"),
        })?;
        let writer = tokio::spawn(async move {
            pipe.write_all(stdin.as_bytes()).await?;
            pipe.shutdown().await?;
            Ok::<_, std::io::Error>(())
        });

        let (output, elapsed) = timed(
            &format!("Client #{} invocation", invocation),
            child.wait_with_output(),
        )
        .await;
        let output = output?;
        let written = writer.await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            tracing::error!(
                "Client #{} exited with {}: {}",
                invocation,
                output.status,
                stderr.trim()
            );
            return Err(HarnessError::ClientExitError {
                invocation,
                status: output.status.to_string(),
                stderr,
            });
        }

        match written {
            Ok(()) => {}
            // 成功結束卻沒讀完輸入，交由正確性檢查回報長度不符
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                tracing::warn!(
                    "⚠️ Client #{} exited before reading all of its input",
                    invocation
                );
            }
            Err(source) => return Err(HarnessError::ClientInputError { invocation, source }),
        }

        Ok(ClientOutput {
            invocation,
            stdout: output.stdout,
            elapsed,
        })
    }

    fn describe(&self) -> String {
        self.command.command_line()
    }
}
