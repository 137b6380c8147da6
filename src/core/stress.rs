use crate::config::settings::StressSettings;
use crate::core::generator::ExprGenerator;
use crate::core::oracle;
use crate::core::pool::ClientPool;
use crate::core::verify;
use crate::domain::model::{InputBatch, InvocationSummary, StressReport};
use crate::domain::ports::ClientRunner;
use crate::utils::error::{HarnessError, Result};
use crate::utils::timer::{timed, Timer};
use crate::utils::validation::Validate;
use chrono::Utc;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Generated input together with the oracle's answers for it.
#[derive(Debug, Clone)]
pub struct PreparedInput {
    pub batch: InputBatch,
    pub expected: Vec<f64>,
}

/// generate → evaluate → run clients → check consistency → check correctness
pub struct StressTest<R: ClientRunner> {
    pool: ClientPool<R>,
    settings: StressSettings,
    seed: u64,
}

impl<R: ClientRunner + 'static> StressTest<R> {
    pub fn new(runner: R, settings: StressSettings) -> Self {
        let seed = settings.seed.unwrap_or_else(rand::random);
        let pool = ClientPool::new(runner, settings.processes);
        Self {
            pool,
            settings,
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn settings(&self) -> &StressSettings {
        &self.settings
    }

    /// Validates the settings, then generates the input batch and its
    /// expected output. Launches nothing.
    pub fn prepare(&self) -> Result<PreparedInput> {
        self.settings.validate()?;
        tracing::info!("🎲 Using seed {}", self.seed);

        let rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut generator = ExprGenerator::new(self.settings.generator, rng);
        let batch = generator.generate(self.settings.expressions)?;
        tracing::debug!("Generated {} expressions", batch.len());

        let expected = {
            let _timer = Timer::start("Expected output computation");
            oracle::expected_output(&batch)?
        };

        Ok(PreparedInput { batch, expected })
    }

    pub async fn run(&self) -> Result<StressReport> {
        let started_at = Utc::now();
        tracing::info!(
            "🚀 Starting stress test: {} process(es) x {} expression(s)",
            self.settings.processes,
            self.settings.expressions
        );

        let PreparedInput { batch, expected } = self.prepare()?;
        let stdin = batch.to_stdin();

        tracing::info!("Running client: {}", self.pool.runner().describe());
        let (outputs, elapsed) = timed("All client invocations", self.pool.run_all(&stdin)).await;
        let outputs = outputs?;

        let consistency = verify::check_consistency(&outputs);

        let reference = outputs.first().ok_or(HarnessError::ResultCountError {
            expected: self.settings.processes,
            actual: 0,
        })?;
        let correctness =
            verify::check_correctness(reference, &batch, &expected, self.settings.tolerance)?;

        let passed = consistency.is_consistent() && correctness.is_correct();
        if passed {
            tracing::info!("✅ All {} client outputs match the expected output", outputs.len());
        } else {
            tracing::error!("❌ Stress test failed");
        }

        Ok(StressReport {
            started_at,
            seed: self.seed,
            processes: self.settings.processes,
            expressions: batch.len(),
            command: self.pool.runner().describe(),
            elapsed_ms: elapsed.as_millis(),
            invocations: outputs
                .iter()
                .map(|o| InvocationSummary {
                    invocation: o.invocation,
                    elapsed_ms: o.elapsed.as_millis(),
                    stdout_bytes: o.stdout.len(),
                })
                .collect(),
            consistency,
            correctness,
            passed,
        })
    }
}
