use crate::domain::model::ClientOutput;
use crate::domain::ports::ClientRunner;
use crate::utils::error::{HarnessError, Result};
use std::sync::Arc;
use tokio::task::JoinSet;

/// Fixed-size pool of concurrent client invocations sharing one input.
pub struct ClientPool<R: ClientRunner> {
    runner: Arc<R>,
    size: usize,
}

impl<R: ClientRunner + 'static> ClientPool<R> {
    pub fn new(runner: R, size: usize) -> Self {
        Self {
            runner: Arc::new(runner),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Launches every invocation at once and waits for all of them.
    ///
    /// Outputs come back ordered by invocation index. The first failure aborts
    /// the invocations still running and is returned as the error.
    pub async fn run_all(&self, stdin: &str) -> Result<Vec<ClientOutput>> {
        if self.size < 1 {
            return Err(HarnessError::InvalidRequestError {
                message: "number of processes must be positive".to_string(),
            });
        }

        let stdin: Arc<str> = Arc::from(stdin);
        let mut tasks = JoinSet::new();
        for invocation in 0..self.size {
            let runner = Arc::clone(&self.runner);
            let stdin = Arc::clone(&stdin);
            tasks.spawn(async move { runner.run(invocation, stdin).await });
        }
        tracing::debug!("Launched {} client invocations", self.size);

        let mut outputs = Vec::with_capacity(self.size);
        while let Some(joined) = tasks.join_next().await {
            match joined? {
                Ok(output) => {
                    tracing::debug!(
                        "Client #{} finished in {:?} ({} bytes)",
                        output.invocation,
                        output.elapsed,
                        output.stdout.len()
                    );
                    outputs.push(output);
                }
                Err(e) => {
                    tracing::error!("❌ {}", e);
                    // 其餘子行程在 task 被中止時隨之結束
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }

        if outputs.len() != self.size {
            return Err(HarnessError::ResultCountError {
                expected: self.size,
                actual: outputs.len(),
            });
        }

        outputs.sort_by_key(|o| o.invocation);
        Ok(outputs)
    }
}
