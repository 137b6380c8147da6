pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::adapters::ProcessClient;
pub use crate::config::{StressSettings, TomlConfig};
pub use crate::core::{
    generator::ExprGenerator, pool::ClientPool, stress::StressTest, verify::Tolerance,
};
pub use crate::domain::model::{ClientCommand, Expression, InputBatch, StressReport};
pub use crate::utils::error::{HarnessError, Result};
