pub mod generator;
pub mod oracle;
pub mod pool;
pub mod stress;
pub mod verify;

pub use crate::domain::model::{ClientOutput, Expression, InputBatch, StressReport};
pub use crate::domain::ports::ClientRunner;
pub use crate::utils::error::Result;
