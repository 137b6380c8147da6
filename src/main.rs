use clap::Parser;
use math_stress::domain::model::{CorrectnessReport, StressReport};
use math_stress::utils::{logger, validation::Validate};
use math_stress::{CliConfig, HarnessError, ProcessClient, StressTest};

fn fail(e: &HarnessError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

fn print_verdict(report: &StressReport) {
    if report.passed {
        println!(
            "✅ {} client(s) agreed on {} expression(s) and matched the expected output (seed {})",
            report.processes, report.expressions, report.seed
        );
        return;
    }

    println!("❌ Stress test failed (seed {})", report.seed);
    if let Some(pair) = &report.consistency.first_divergence {
        println!(
            "   {} client output(s) diverged, e.g. #{} vs #{}",
            report.consistency.diverging.len(),
            pair.reference,
            pair.other
        );
    }
    match &report.correctness {
        CorrectnessReport::Matched { .. } => {}
        CorrectnessReport::LengthMismatch { expected, actual } => {
            println!("   expected {} result(s), got {}", expected, actual);
        }
        CorrectnessReport::ValueMismatches { mismatches } => {
            println!("   {} result(s) outside tolerance", mismatches.len());
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.log_json {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting math-stress");
    tracing::debug!("CLI config: {:?}", config);

    let settings = config.resolve().unwrap_or_else(|e| fail(&e));

    // 驗證配置
    if let Err(e) = settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        fail(&e);
    }

    let test = StressTest::new(ProcessClient::new(settings.client.clone()), settings);

    if config.dry_run {
        tracing::info!("🔍 DRY RUN MODE - no client will be launched");
        // 種子由 prepare() 記錄，可用 --seed 重現
        let prepared = test.prepare().unwrap_or_else(|e| fail(&e));
        for (expr, value) in prepared.batch.expressions().iter().zip(&prepared.expected) {
            println!("{}", expr);
            println!("= {}", value);
        }
        return Ok(());
    }

    let report = test.run().await.unwrap_or_else(|e| fail(&e));

    if config.json {
        let json = report.to_json().unwrap_or_else(|e| fail(&e));
        println!("{}", json);
    } else {
        print_verdict(&report);
    }

    if !report.passed {
        std::process::exit(1);
    }
    Ok(())
}
