use super::settings::StressSettings;
use super::toml_config::TomlConfig;
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

fn parse_positive_int(s: &str) -> std::result::Result<usize, String> {
    match s.parse::<i64>() {
        Ok(n) if n >= 1 => Ok(n as usize),
        _ => Err(format!("must be a positive integer: {}", s)),
    }
}

fn parse_port(s: &str) -> std::result::Result<u16, String> {
    match s.parse::<i64>() {
        Ok(n) if (1..=i64::from(u16::MAX)).contains(&n) => Ok(n as u16),
        _ => Err(format!("must be a port number between 1 and {}: {}", u16::MAX, s)),
    }
}

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "math-stress")]
#[command(
    about = "Feed a math server with random arithmetic expressions through concurrent clients"
)]
pub struct CliConfig {
    /// Server host
    #[arg(short = 'H', long, value_name = "HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(short, long, value_name = "PORT", value_parser = parse_port, allow_negative_numbers = true)]
    pub port: Option<u16>,

    /// Path to the client executable
    #[arg(short, long, value_name = "PATH")]
    pub client: Option<PathBuf>,

    /// Number of concurrent client processes
    #[arg(short = 'n', long, value_name = "N", value_parser = parse_positive_int, allow_negative_numbers = true)]
    pub processes: Option<usize>,

    /// Number of expressions to generate
    #[arg(short, long, value_name = "N", value_parser = parse_positive_int, allow_negative_numbers = true)]
    pub expressions: Option<usize>,

    /// TOML config file; command-line flags take precedence over it
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Seed for the expression generator
    #[arg(long)]
    pub seed: Option<u64>,

    /// Minimum number of operators per expression
    #[arg(long, value_name = "N", value_parser = parse_positive_int, allow_negative_numbers = true)]
    pub min_operators: Option<usize>,

    /// Maximum number of operators per expression
    #[arg(long, value_name = "N", value_parser = parse_positive_int, allow_negative_numbers = true)]
    pub max_operators: Option<usize>,

    /// Relative tolerance for comparing results
    #[arg(long, value_name = "TOL")]
    pub rel_tol: Option<f64>,

    /// Absolute tolerance for comparing results
    #[arg(long, value_name = "TOL")]
    pub abs_tol: Option<f64>,

    /// Print the generated input and expected output without running clients
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliConfig {
    /// Builds the run settings: flags, then the config file, then defaults.
    pub fn resolve(&self) -> Result<StressSettings> {
        let mut settings = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path.display());
                StressSettings::from(TomlConfig::from_file(path)?)
            }
            None => StressSettings::default(),
        };
        self.apply_to(&mut settings);
        Ok(settings)
    }

    pub fn apply_to(&self, settings: &mut StressSettings) {
        if let Some(host) = &self.host {
            settings.client.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.client.port = port;
        }
        if let Some(path) = &self.client {
            settings.client.path = path.clone();
        }
        if let Some(processes) = self.processes {
            settings.processes = processes;
        }
        if let Some(expressions) = self.expressions {
            settings.expressions = expressions;
        }
        if let Some(seed) = self.seed {
            settings.seed = Some(seed);
        }
        if let Some(min) = self.min_operators {
            settings.generator.min_operators = min;
        }
        if let Some(max) = self.max_operators {
            settings.generator.max_operators = max;
        }
        if let Some(rel) = self.rel_tol {
            settings.tolerance.relative = rel;
        }
        if let Some(abs) = self.abs_tol {
            settings.tolerance.absolute = abs;
        }
    }
}
