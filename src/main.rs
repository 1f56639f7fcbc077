use chunkcast::utils::error::ErrorSeverity;
use chunkcast::utils::{logger, validation::Validate};
use chunkcast::{BcastEngine, BcastScenario, CliConfig};
use clap::Parser;

fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting chunkcast");
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(exit_code(e.severity()));
    }

    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let engine = BcastEngine::from_config(&config, config.monitor)?;
    let scenario = BcastScenario::from_config(&config);

    match engine.run(&scenario).await {
        Ok(report) => {
            tracing::info!("✅ Broadcast verified on every rank");
            println!(
                "✅ {} elements reached {} ranks in {} chunks ({:?})",
                report.data_size, report.ranks, report.total_chunks, report.elapsed
            );
            if let Some(peak) = report.peak_memory_mb {
                println!("📊 Peak memory: {}MB, largest chunk: {} bytes", peak, report.max_chunk_bytes);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Broadcast failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let code = exit_code(e.severity());
            if code > 0 {
                std::process::exit(code);
            }
        }
    }

    Ok(())
}
