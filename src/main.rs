use clap::Parser;
use planning_extract::core::ConfigProvider;
use planning_extract::utils::{error::EtlError, logger, validation::Validate};
use planning_extract::{ApplicationsPipeline, CliConfig, ElasticsearchBackend, EtlEngine, LocalStorage};

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

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting planning-extract");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    let backend = match ElasticsearchBackend::from_config(&config) {
        Ok(backend) => backend,
        Err(e) => exit_with(&e),
    };

    let monitor_enabled = config.monitor;
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
