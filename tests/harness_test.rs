#![cfg(unix)]

use anyhow::Result;
use math_stress::core::{oracle, verify};
use math_stress::domain::model::CorrectnessReport;
use math_stress::{ClientCommand, ClientPool, Expression, HarnessError, InputBatch, ProcessClient};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn script_client(dir: &Path, body: &str) -> Result<ProcessClient> {
    let path: PathBuf = dir.join("math-client");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body))?;
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    Ok(ProcessClient::new(ClientCommand {
        path,
        ..ClientCommand::default()
    }))
}

#[tokio::test]
async fn test_two_plus_two_single_process() -> Result<()> {
    let dir = TempDir::new()?;
    let client = script_client(dir.path(), "cat > /dev/null; printf '4\\r\\n'")?;

    let batch = InputBatch::new(vec![Expression::new("2 + 2")]);
    let expected = oracle::expected_output(&batch)?;
    assert_eq!(expected, vec![4.0]);

    let pool = ClientPool::new(client, 1);
    let outputs = pool.run_all(&batch.to_stdin()).await?;
    assert_eq!(outputs.len(), 1);

    assert!(verify::check_consistency(&outputs).is_consistent());
    let correctness =
        verify::check_correctness(&outputs[0], &batch, &expected, Default::default())?;
    assert_eq!(correctness, CorrectnessReport::Matched { values: 1 });
    Ok(())
}

#[tokio::test]
async fn test_every_process_gets_the_same_input() -> Result<()> {
    let dir = TempDir::new()?;
    let client = script_client(dir.path(), "cat")?;

    let batch = InputBatch::new(vec![
        Expression::new("1 + 2 * 3"),
        Expression::new("-4 / 2 - 1"),
    ]);
    let stdin = batch.to_stdin();

    let pool = ClientPool::new(client, 4);
    let outputs = pool.run_all(&stdin).await?;
    assert_eq!(outputs.len(), 4);
    for (i, output) in outputs.iter().enumerate() {
        assert_eq!(output.invocation, i);
        assert_eq!(output.stdout, stdin.as_bytes());
    }
    assert!(verify::check_consistency(&outputs).is_consistent());
    Ok(())
}

#[tokio::test]
async fn test_divergent_process_is_detected() -> Result<()> {
    let dir = TempDir::new()?;
    let lock = dir.path().join("odd-one-out");
    // 只有第一個搶到鎖的行程回傳不同結果
    let client = script_client(
        dir.path(),
        &format!(
            "cat > /dev/null; if mkdir '{}' 2>/dev/null; then echo 5; else echo 4; fi",
            lock.display()
        ),
    )?;

    let pool = ClientPool::new(client, 4);
    let outputs = pool.run_all("2 + 2\n").await?;
    let report = verify::check_consistency(&outputs);

    assert!(!report.is_consistent());
    assert!(report.first_divergence.is_some());
    let odd: Vec<usize> = outputs
        .iter()
        .filter(|o| o.stdout == b"5\n")
        .map(|o| o.invocation)
        .collect();
    assert_eq!(odd.len(), 1);
    if odd[0] == 0 {
        assert_eq!(report.diverging, vec![1, 2, 3]);
    } else {
        assert_eq!(report.diverging, odd);
    }
    Ok(())
}

#[tokio::test]
async fn test_client_reading_only_part_of_its_input_is_a_length_mismatch() -> Result<()> {
    let dir = TempDir::new()?;
    let client = script_client(dir.path(), "head -n 1 > /dev/null; echo 4")?;

    // 輸入大於 pipe 緩衝區
    let batch = InputBatch::new(vec![Expression::new("2 + 2"); 20_000]);
    let expected = oracle::expected_output(&batch)?;

    let pool = ClientPool::new(client, 2);
    let outputs = pool.run_all(&batch.to_stdin()).await?;
    assert!(verify::check_consistency(&outputs).is_consistent());

    let correctness =
        verify::check_correctness(&outputs[0], &batch, &expected, Default::default())?;
    assert_eq!(
        correctness,
        CorrectnessReport::LengthMismatch {
            expected: 20_000,
            actual: 1
        }
    );
    Ok(())
}

#[tokio::test]
async fn test_non_zero_exit_fails_the_pool() -> Result<()> {
    let dir = TempDir::new()?;
    let client = script_client(dir.path(), "cat > /dev/null; exit 7")?;

    let pool = ClientPool::new(client, 3);
    let err = pool.run_all("2 + 2\n").await.unwrap_err();
    match err {
        HarnessError::ClientExitError { status, .. } => assert!(status.contains('7')),
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_unparseable_output_is_reported_with_line() -> Result<()> {
    let dir = TempDir::new()?;
    let client = script_client(dir.path(), "cat > /dev/null; echo 4; echo 'division by zero'")?;

    let batch = InputBatch::new(vec![Expression::new("2 + 2"), Expression::new("1 / 0")]);
    let pool = ClientPool::new(client, 1);
    let outputs = pool.run_all(&batch.to_stdin()).await?;

    let err = verify::check_correctness(&outputs[0], &batch, &[4.0, 0.0], Default::default())
        .unwrap_err();
    match err {
        HarnessError::InvalidOutputError {
            line_number, line, ..
        } => {
            assert_eq!(line_number, 2);
            assert_eq!(line, "division by zero");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}
