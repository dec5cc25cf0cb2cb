use clap::Parser;
use planning_extract::core::query::build_query;
use planning_extract::core::ConfigProvider;
use planning_extract::utils::{error::EtlError, logger, validation::Validate};
use planning_extract::{ApplicationsPipeline, ElasticsearchBackend, EtlEngine, LocalStorage, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-extract")]
#[command(about = "Export planning applications using a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "extract-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override the threshold from config
    #[arg(long)]
    threshold: Option<u64>,

    /// Print the query document and exit without contacting the backend
    #[arg(long)]
    dry_run: bool,
}

fn exit_with(e: &EtlError) -> ! {
    tracing::error!(
        "❌ Extraction failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code().max(1));
}

fn display_config_summary(config: &TomlConfig) {
    let params = config.filter_parameters();
    let scroll = config.scroll_settings();

    tracing::info!("📋 Pipeline: {}", config.pipeline.name);
    if let Some(description) = &config.pipeline.description {
        tracing::info!("   {}", description);
    }
    tracing::info!("🌐 Endpoint: {} (index '{}')", config.endpoint(), scroll.index);
    tracing::info!(
        "🔎 Filter: {} >= {}, valid_date in [{}, {})",
        config.variant(),
        params.threshold,
        params.since_date,
        params.until_date
    );
    tracing::info!(
        "📄 Scroll: {} per page, lease {:?}",
        scroll.page_size,
        scroll.lease
    );
    tracing::info!(
        "💾 Output: {} as {}",
        config.output_path(),
        config.output_formats().join(", ")
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
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
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    if let Some(threshold) = args.threshold {
        config.query.threshold = threshold;
        tracing::info!("🔧 Threshold overridden to: {}", threshold);
    }

    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    display_config_summary(&config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - the backend will not be contacted");
        let query = build_query(config.variant(), &config.filter_parameters());
        println!("{}", serde_json::to_string_pretty(&query)?);
        return Ok(());
    }

    let backend = match ElasticsearchBackend::from_config(&config) {
        Ok(backend) => backend,
        Err(e) => exit_with(&e),
    };

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = ApplicationsPipeline::new(storage, config, backend);
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Extraction completed successfully!");
            println!("✅ Extraction completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => exit_with(&e),
    }

    Ok(())
}
