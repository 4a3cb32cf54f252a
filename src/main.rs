use catalog_scraper::domain::ports::Storage;
use catalog_scraper::utils::{logger, validation::Validate};
use catalog_scraper::{
    CatalogPipeline, ChromeRenderer, CliConfig, LocalStorage, OutputConfig, ScrapeEngine,
    ScrapeError, ScrapeProfile,
};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.log_level.as_str(), config.log_format);

    tracing::info!("Starting catalog-scraper");
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        fail("Configuration validation failed", &e);
    }

    let profile = match config.load_profile() {
        Ok(profile) => profile,
        Err(e) => fail("Failed to load scrape profile", &e),
    };
    if let Err(e) = profile.validate() {
        fail("Scrape profile validation failed", &e);
    }

    let output = match config.output_config() {
        Ok(output) => output,
        Err(e) => fail("Invalid output settings", &e),
    };

    display_plan(&config, &profile, &output);

    if config.dry_run {
        tracing::info!("DRY RUN MODE - no browser will be launched");
        return Ok(());
    }

    let storage = LocalStorage::new(output.output_dir.clone());
    if let Err(e) = storage.ensure_dir().await {
        fail("Output directory is not usable", &e);
    }

    let renderer = match ChromeRenderer::launch(&profile, config.headless()).await {
        Ok(renderer) => renderer,
        Err(e) => fail("Browser launch failed", &e),
    };

    let pipeline = match CatalogPipeline::new(renderer, storage, config.clone(), output, &profile) {
        Ok(pipeline) => pipeline,
        Err(e) => fail("Pipeline setup failed", &e),
    };
    let engine = ScrapeEngine::new(pipeline);

    match engine.run().await {
        Ok(summary) => {
            tracing::info!("Scrape completed with {} products", summary.records);
            println!("✅ Collected {} products", summary.records);
            if summary.is_partial() {
                println!(
                    "⚠️  Only {} of {} requested products were available{}",
                    summary.records,
                    summary.requested,
                    if summary.retries_exhausted {
                        " (load retries exhausted)"
                    } else {
                        ""
                    }
                );
            }
            for path in &summary.written {
                println!("📁 {}", path.display());
            }
        }
        Err(e) => {
            tracing::error!(
                "Scrape failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn fail(context: &str, e: &ScrapeError) -> ! {
    tracing::error!("{}: {}", context, e);
    tracing::error!("Suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    std::process::exit(e.exit_code().max(1));
}

fn display_plan(config: &CliConfig, profile: &ScrapeProfile, output: &OutputConfig) {
    tracing::info!("Target: {}", config.url);
    tracing::info!("Minimum items: {}", config.min_items);
    tracing::info!(
        "Output: {} (prefix={}, json={}, csv={})",
        output.output_dir.display(),
        output.prefix,
        output.emit_json,
        output.emit_csv
    );
    tracing::info!(
        "Browser: headless={} card selector={} load more={}",
        config.headless(),
        profile.selectors.card,
        profile.selectors.load_more.as_deref().unwrap_or("<scroll>")
    );
    tracing::info!(
        "Loader: max_stalled_rounds={} max_rounds={} settle_delay={}ms",
        profile.loader.max_stalled_rounds,
        profile.loader.max_rounds,
        profile.loader.settle_delay_ms
    );
}
