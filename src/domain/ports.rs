use crate::domain::model::ClientOutput;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Runs the client under test once, feeding it `stdin`.
///
/// A non-zero exit must come back as an error, never as an output.
#[async_trait]
pub trait ClientRunner: Send + Sync {
    async fn run(&self, invocation: usize, stdin: Arc<str>) -> Result<ClientOutput>;

    fn describe(&self) -> String;
}
