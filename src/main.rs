use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use dossier::{
    AppState, DossierConfig, DossierConfigManager, ReportCache, ResearchPipeline,
    api::routes::create_app,
    cli::{Cli, Commands, output::Output},
    utils::toml_config::LogFormat,
};
use owo_colors::OwoColorize;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = Output::new(!cli.no_color);

    match cli.command() {
        Commands::Serve => {
            let manager = load_config(&cli.config, &output)?;
            init_tracing(&manager.config(), cli.verbose);
            serve(manager, &output).await
        }
        Commands::Research { query } => {
            let manager = load_config(&cli.config, &output)?;
            init_tracing(&manager.config(), cli.verbose);
            research(&manager.config(), query).await
        }
        Commands::CheckConfig => check_config(&cli.config, &output),
    }
}

/// Load the config file, or fall back to defaults when it does not exist
fn load_config(path: &Path, output: &Output) -> Result<DossierConfigManager> {
    if path.exists() {
        return DossierConfigManager::new(path)
            .with_context(|| format!("failed to load {}", path.display()));
    }

    output.warning(&format!(
        "{} not found, using built-in defaults",
        path.display()
    ));
    let config = DossierConfig::default();
    config.validate().context("default configuration is not usable")?;
    Ok(DossierConfigManager::from_config(config))
}

fn init_tracing(config: &DossierConfig, verbose: bool) {
    let fallback = if verbose {
        "debug"
    } else {
        config.server.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match config.server.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn serve(manager: DossierConfigManager, output: &Output) -> Result<()> {
    let config = manager.config();
    let cache = Arc::new(ReportCache::new());
    let pipeline = ResearchPipeline::from_config(&config, cache)
        .context("failed to build the research pipeline")?;

    let state = AppState::new(Arc::new(manager), Arc::new(pipeline));
    tokio::spawn(reload_on_hangup(state.clone()));
    let app = create_app(state);

    let address = config.server.address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;

    output.banner();
    output.kv("Listening", &format!("http://{}", address));
    output.kv("Model", &config.llm.model);
    output.kv("OpenAPI", &format!("http://{}/api-docs/openapi.json", address));
    if cfg!(unix) {
        output.kv("Reload", "send SIGHUP to re-read the configuration");
    }
    tracing::info!(%address, "Server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated with error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

/// Rebuild the pipeline from the config file on every SIGHUP
#[cfg(unix)]
async fn reload_on_hangup(state: AppState) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(hangup) => hangup,
        Err(e) => {
            tracing::warn!("Failed to listen for SIGHUP, configuration reload disabled: {}", e);
            return;
        }
    };

    while hangup.recv().await.is_some() {
        match state.reload() {
            Ok(true) => {}
            Ok(false) => tracing::warn!("No configuration file to reload, keeping built-in defaults"),
            Err(e) => tracing::error!("Configuration reload failed, keeping the running pipeline: {}", e),
        }
    }
}

#[cfg(not(unix))]
async fn reload_on_hangup(_state: AppState) {}

async fn research(config: &DossierConfig, query: &str) -> Result<()> {
    let pipeline = ResearchPipeline::from_config(config, Arc::new(ReportCache::new()))
        .context("failed to build the research pipeline")?;

    let report = pipeline.run(query).await?;
    println!("{}", serde_json::to_string_pretty(report.as_ref())?);
    Ok(())
}

fn check_config(path: &Path, output: &Output) -> Result<()> {
    output.header("Configuration");
    output.kv("File", &path.display().to_string());

    let config = match DossierConfig::load(path) {
        Ok(config) => config,
        Err(e) => {
            output.error(&e.to_string());
            return Err(e.into());
        }
    };

    output.success("Configuration is valid");
    output.kv("Address", &config.server.address());
    output.kv("Step budget", &config.pipeline.step_budget.to_string());
    output.kv("Max sources", &config.pipeline.max_sources.to_string());
    output.kv("Model", &format!("{} @ {}", config.llm.model, config.llm.base_url));
    output.kv("Search", &format!("{:?}", config.search.provider).to_lowercase());

    let images_key = config.resolve_env(config.images.api_key_env.as_deref());
    if images_key.is_none() {
        output.warning("No image API key set; reports will use placeholder images");
    }

    output.header("Report sections");
    for kind in dossier::report::SectionKind::ALL {
        output.list_item(kind.as_str());
    }
    Ok(())
}
