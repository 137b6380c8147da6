use crate::config::toml_config::TomlConfig;
use crate::core::generator::GeneratorConfig;
use crate::core::verify::Tolerance;
use crate::domain::model::ClientCommand;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_ordered_bounds, validate_path, validate_positive_number,
    validate_range, validate_tolerance, Validate,
};
use serde::Serialize;

/// Largest integer magnitude an `f64` holds exactly (2^53).
pub const MAX_EXACT_OPERAND: i64 = 9_007_199_254_740_992;

/// Fully resolved settings for one stress run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StressSettings {
    pub client: ClientCommand,
    pub processes: usize,
    pub expressions: usize,
    pub seed: Option<u64>,
    pub generator: GeneratorConfig,
    pub tolerance: Tolerance,
}

impl Default for StressSettings {
    fn default() -> Self {
        Self {
            client: ClientCommand::default(),
            processes: 1,
            expressions: 1,
            seed: None,
            generator: GeneratorConfig::default(),
            tolerance: Tolerance::default(),
        }
    }
}

impl From<TomlConfig> for StressSettings {
    fn from(file: TomlConfig) -> Self {
        let defaults = Self::default();
        Self {
            client: ClientCommand {
                path: file.client.path.unwrap_or(defaults.client.path),
                host: file.client.host.unwrap_or(defaults.client.host),
                port: file.client.port.unwrap_or(defaults.client.port),
            },
            processes: file.run.processes.unwrap_or(defaults.processes),
            expressions: file.run.expressions.unwrap_or(defaults.expressions),
            seed: file.run.seed,
            generator: file.generator,
            tolerance: file.tolerance,
        }
    }
}

impl Validate for StressSettings {
    fn validate(&self) -> Result<()> {
        validate_path("client.path", &self.client.path.to_string_lossy())?;
        validate_non_empty_string("client.host", &self.client.host)?;
        validate_positive_number("client.port", usize::from(self.client.port), 1)?;

        validate_positive_number("run.processes", self.processes, 1)?;
        validate_positive_number("run.expressions", self.expressions, 1)?;

        let gen = &self.generator;
        validate_positive_number("generator.min_operators", gen.min_operators, 1)?;
        validate_ordered_bounds("generator.operators", gen.min_operators, gen.max_operators)?;
        validate_range(
            "generator.min_operand",
            gen.min_operand,
            -MAX_EXACT_OPERAND,
            MAX_EXACT_OPERAND,
        )?;
        validate_range(
            "generator.max_operand",
            gen.max_operand,
            -MAX_EXACT_OPERAND,
            MAX_EXACT_OPERAND,
        )?;
        validate_ordered_bounds("generator.operands", gen.min_operand, gen.max_operand)?;

        validate_tolerance("tolerance.relative", self.tolerance.relative)?;
        validate_tolerance("tolerance.absolute", self.tolerance.absolute)?;
        Ok(())
    }
}
