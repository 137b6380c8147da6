//! Output verification: cross-invocation consistency, then correctness
//! against the oracle.

use crate::domain::model::{
    ClientOutput, ConsistencyReport, CorrectnessReport, InputBatch, OutputDivergence,
    ValueMismatch,
};
use crate::utils::error::{HarnessError, Result};
use serde::{Deserialize, Serialize};

/// Closeness thresholds: `|a - b| <= max(relative * max(|a|, |b|), absolute)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerance {
    pub relative: f64,
    pub absolute: f64,
}

impl Tolerance {
    pub const DEFAULT_RELATIVE: f64 = 1e-9;
    pub const DEFAULT_ABSOLUTE: f64 = 0.0;

    pub fn is_close(&self, a: f64, b: f64) -> bool {
        if a == b {
            return true;
        }
        if a.is_nan() || b.is_nan() {
            return a.is_nan() && b.is_nan();
        }
        if a.is_infinite() || b.is_infinite() {
            return false;
        }
        let diff = (a - b).abs();
        diff <= (self.relative * a.abs().max(b.abs())).max(self.absolute)
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            relative: Self::DEFAULT_RELATIVE,
            absolute: Self::DEFAULT_ABSOLUTE,
        }
    }
}

/// Parses client stdout into one value per line.
///
/// Replies may end in CRLF; surrounding whitespace is ignored. A trailing
/// newline does not produce an extra value. A line that is not valid UTF-8
/// is reported like any other unparseable line.
pub fn parse_output(output: &ClientOutput) -> Result<Vec<f64>> {
    if output.stdout.is_empty() {
        return Ok(Vec::new());
    }
    let stdout = output.stdout.strip_suffix(b"\n").unwrap_or(&output.stdout);

    let mut values = Vec::new();
    for (i, raw) in stdout.split(|b| *b == b'\n').enumerate() {
        let parsed = std::str::from_utf8(raw)
            .ok()
            .and_then(|line| line.trim().parse::<f64>().ok());
        match parsed {
            Some(n) => values.push(n),
            None => {
                let lossy = String::from_utf8_lossy(raw);
                let line = lossy.strip_suffix('\r').unwrap_or(&lossy);
                tracing::error!("Not a number: {}", line);
                return Err(HarnessError::InvalidOutputError {
                    invocation: output.invocation,
                    line_number: i + 1,
                    line: line.to_string(),
                });
            }
        }
    }
    Ok(values)
}

/// Compares every output byte-for-byte against invocation #0's.
pub fn check_consistency(outputs: &[ClientOutput]) -> ConsistencyReport {
    let mut report = ConsistencyReport::default();
    let Some((reference, rest)) = outputs.split_first() else {
        return report;
    };

    for other in rest {
        if other.stdout == reference.stdout {
            continue;
        }
        if report.first_divergence.is_none() {
            tracing::error!("Client outputs don't match, this should never happen");
            tracing::error!(
                "For example, output of client #{}:\n{}",
                reference.invocation,
                reference.text()
            );
            tracing::error!(
                "... is not equal to output of client #{}:\n{}",
                other.invocation,
                other.text()
            );
            report.first_divergence = Some(OutputDivergence {
                reference: reference.invocation,
                other: other.invocation,
            });
        }
        report.diverging.push(other.invocation);
    }

    if !report.is_consistent() {
        tracing::error!(
            "{} of {} client outputs differ from client #{}",
            report.diverging.len(),
            rest.len(),
            reference.invocation
        );
    }
    report
}

/// Compares `output` element-wise against `expected`.
///
/// Unparseable lines are a hard error; mismatches are returned in the report.
pub fn check_correctness(
    output: &ClientOutput,
    batch: &InputBatch,
    expected: &[f64],
    tolerance: Tolerance,
) -> Result<CorrectnessReport> {
    let actual = parse_output(output)?;

    if actual.len() != expected.len() {
        tracing::error!("Actual output doesn't match expected output");
        tracing::error!("Expected output (length {}):\n{:?}", expected.len(), expected);
        tracing::error!("Actual output (length {}):\n{:?}", actual.len(), actual);
        return Ok(CorrectnessReport::LengthMismatch {
            expected: expected.len(),
            actual: actual.len(),
        });
    }

    let mismatches: Vec<ValueMismatch> = expected
        .iter()
        .zip(&actual)
        .enumerate()
        .filter(|(_, (e, a))| !tolerance.is_close(**e, **a))
        .map(|(index, (e, a))| ValueMismatch {
            index,
            expression: batch.expressions()[index].clone(),
            expected: *e,
            actual: *a,
        })
        .collect();

    if mismatches.is_empty() {
        return Ok(CorrectnessReport::Matched {
            values: actual.len(),
        });
    }

    tracing::error!("Actual output doesn't match expected output");
    for mismatch in &mismatches {
        tracing::error!(
            "Line {}: expected {}, got {} for expression: {}",
            mismatch.index + 1,
            mismatch.expected,
            mismatch.actual,
            mismatch.expression
        );
    }
    Ok(CorrectnessReport::ValueMismatches { mismatches })
}
