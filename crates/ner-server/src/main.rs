//! NER service HTTP server.
//!
//! # Usage
//!
//! ```bash
//! # Run with defaults (config/default.toml + environment variables)
//! ner-server
//!
//! # Run with an explicit config file
//! ner-server --config /path/to/config.toml
//!
//! # Bind overrides
//! ner-server --host 127.0.0.1 --port 9000
//!
//! # Load model weights before accepting traffic
//! ner-server --preload
//! ```
//!
//! Priority: CLI arguments > environment variables > config file > defaults.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use ner_core::config::Settings;
use ner_model::{ModelMetrics, NerModel};
use ner_server::{build_router, ApiMetrics, AppState};

/// Parsed CLI arguments.
struct CliArgs {
    /// Path to configuration file
    config_path: Option<PathBuf>,
    /// Bind address override (--host)
    host: Option<String>,
    /// Listen port override (--port)
    port: Option<u16>,
    /// Load model weights before serving (--preload)
    preload: bool,
    /// Show help
    help: bool,
}

impl CliArgs {
    /// Parse CLI arguments. Manual parsing, no external dependency.
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut cli = CliArgs {
            config_path: None,
            host: None,
            port: None,
            preload: false,
            help: false,
        };

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--help" | "-h" => {
                    cli.help = true;
                }
                "--config" => {
                    i += 1;
                    if i < args.len() {
                        cli.config_path = Some(PathBuf::from(&args[i]));
                    }
                }
                "--host" => {
                    i += 1;
                    if i < args.len() {
                        cli.host = Some(args[i].clone());
                    }
                }
                "--port" => {
                    i += 1;
                    if i < args.len() {
                        if let Ok(port) = args[i].parse::<u16>() {
                            cli.port = Some(port);
                        }
                    }
                }
                "--preload" => {
                    cli.preload = true;
                }
                _ => {} // Ignore unknown arguments
            }
            i += 1;
        }

        cli
    }
}

fn print_help() {
    eprintln!(
        r#"NER Service HTTP Server

USAGE:
    ner-server [OPTIONS]

OPTIONS:
    --config <PATH>   Path to configuration file (TOML)
    --host <ADDRESS>  Bind address (default: 0.0.0.0)
    --port <PORT>     Listen port (default: 8000)
    --preload         Load model weights before accepting traffic
    --help, -h        Show this help message

ENVIRONMENT VARIABLES:
    PROJECT_NAME      Service name used in logs
    HOST, PORT        Bind address and port
    MODEL_NAME        Checkpoint identifier (subdirectory of the cache dir)
    MODEL_CACHE_DIR   Root directory for local model files
    API_KEY_ENABLED   Enforce API keys on /api routes (default: true)
    API_KEY           The shared-secret API key
    CORS_ORIGINS      Comma-separated list of allowed origins
    LOG_LEVEL         Log level (error, warn, info, debug, trace)
    LOG_FORMAT        Log formatter: json or text
    STORAGE_TYPE      Storage backend name: local, s3, gcs, azure
    NER_ENV           Config file layer: config/{{NER_ENV}}.toml
    RUST_LOG          Overrides LOG_LEVEL when set

PRIORITY:
    CLI arguments > environment variables > config file > defaults
"#
    );
}

/// Apply CLI overrides to settings. Called before validation so invalid
/// overrides fail fast.
fn apply_cli_overrides(settings: &mut Settings, cli: &CliArgs) {
    if let Some(ref host) = cli.host {
        info!("CLI override: server.host = {}", host);
        settings.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        info!("CLI override: server.port = {}", port);
        settings.server.port = port;
    }
    if cli.preload {
        settings.model.preload = true;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CliArgs::parse();

    if cli.help {
        print_help();
        return Ok(());
    }

    // Load configuration (validation runs after overrides)
    let mut settings = if let Some(ref path) = cli.config_path {
        let mut settings = Settings::from_file(path)?;
        settings.apply_env_overrides();
        settings
    } else {
        Settings::load()?
    };

    apply_cli_overrides(&mut settings, &cli);
    settings.validate()?;

    ner_server::logging::init_logging(&settings.logging)?;

    info!("Starting {} API server", settings.project_name);

    let metrics = Arc::new(ApiMetrics::new()?);
    let model_metrics = ModelMetrics::register(metrics.registry())?;
    let model = Arc::new(NerModel::new(&settings.model, model_metrics));

    if settings.model.preload {
        info!("Preloading model weights before binding");
        model.ensure_loaded().await?;
    }

    let settings = Arc::new(settings);
    let state = AppState::new(settings.clone(), model, metrics);
    let app = build_router(state)?;

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down {} API server", settings.project_name);
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
