use chunkcast::config::toml_config::TomlConfig;
use chunkcast::utils::{logger, validation::Validate};
use chunkcast::{BcastEngine, BcastScenario};
use clap::Parser;

#[derive(Parser)]
#[command(name = "toml-bcast")]
#[command(about = "Chunked broadcast driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "chunkcast.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override the chunk length from config
    #[arg(long, allow_negative_numbers = true)]
    max_chunk_len: Option<i64>,

    /// Show the planned broadcast without running it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if config.json_logs() {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    if let Some(max_chunk_len) = args.max_chunk_len {
        config.broadcast.max_chunk_len = max_chunk_len;
        tracing::info!("🔧 Chunk length overridden to: {}", max_chunk_len);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let scenario = BcastScenario::from_config(&config);
    if args.dry_run {
        println!("🔍 Dry run");
        println!("   ranks:         {}", scenario.ranks);
        println!("   root:          {}", scenario.root);
        println!("   data size:     {}", scenario.data_size);
        println!("   max chunk len: {}", scenario.max_chunk_len);
        println!("   ceiling:       {}", config.ceiling());
        return Ok(());
    }

    let monitor = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    let engine = BcastEngine::from_config(&config, monitor)?;

    let report = engine.run(&scenario).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
