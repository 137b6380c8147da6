// Adapters layer: concrete implementations for external systems.

pub mod process;

pub use process::ProcessClient;
