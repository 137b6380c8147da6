use crate::domain::model::{Expression, InputBatch};
use crate::utils::error::{HarnessError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

pub const OPERATORS: [char; 4] = ['+', '-', '*', '/'];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub min_operators: usize,
    pub max_operators: usize,
    pub min_operand: i64,
    pub max_operand: i64,
}

impl GeneratorConfig {
    pub const DEFAULT_MIN_OPERATORS: usize = 10;
    pub const DEFAULT_MAX_OPERATORS: usize = 1000;
    pub const DEFAULT_MIN_OPERAND: i64 = -100_000_000_000;
    pub const DEFAULT_MAX_OPERAND: i64 = 100_000_000_000;
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            min_operators: Self::DEFAULT_MIN_OPERATORS,
            max_operators: Self::DEFAULT_MAX_OPERATORS,
            min_operand: Self::DEFAULT_MIN_OPERAND,
            max_operand: Self::DEFAULT_MAX_OPERAND,
        }
    }
}

/// Produces random operator chains like `12 * -7 + 3`.
pub struct ExprGenerator<R: Rng> {
    config: GeneratorConfig,
    rng: R,
}

impl<R: Rng> ExprGenerator<R> {
    pub fn new(config: GeneratorConfig, rng: R) -> Self {
        Self { config, rng }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    fn random_operator(&mut self) -> char {
        OPERATORS[self.rng.gen_range(0..OPERATORS.len())]
    }

    fn random_operand(&mut self) -> i64 {
        self.rng
            .gen_range(self.config.min_operand..=self.config.max_operand)
    }

    pub fn gen_expression(&mut self) -> Expression {
        let numof_operators = self
            .rng
            .gen_range(self.config.min_operators..=self.config.max_operators);

        let mut expr = String::new();
        for _ in 0..numof_operators {
            let operand = self.random_operand();
            let operator = self.random_operator();
            // 寫入 String 不會失敗
            let _ = write!(expr, "{} {} ", operand, operator);
        }
        let _ = write!(expr, "{}", self.random_operand());
        Expression::new(expr)
    }

    /// Generates `count` independent expressions; `count` must be at least 1.
    pub fn generate(&mut self, count: usize) -> Result<InputBatch> {
        if count < 1 {
            return Err(HarnessError::InvalidRequestError {
                message: "input length must be positive".to_string(),
            });
        }
        let expressions = (0..count).map(|_| self.gen_expression()).collect();
        Ok(InputBatch::new(expressions))
    }
}
