mod config;

use clap::{Parser, Subcommand};
use config::{CommonConfig, Config};
use metrics_exporter_statsd::StatsdBuilder;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(about = "Records web form submissions as sheets copied from a template")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Serve the webhook
    Run {
        #[arg(long)]
        config: PathBuf,
    },
    /// Load and validate a config file, then exit
    Validate {
        #[arg(long)]
        config: PathBuf,
    },
}

fn load_config(path: &Path) -> Config {
    match Config::from_file(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {e}", path.display());
            process::exit(1);
        }
    }
}

fn init_logging(common: &CommonConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = common
        .logging
        .sentry_dsn
        .as_deref()
        .and_then(|dsn| match dsn.parse::<sentry::types::Dsn>() {
            Ok(dsn) => Some(dsn),
            Err(e) => {
                eprintln!("Ignoring invalid Sentry DSN: {e}");
                None
            }
        });
    let guard = dsn.map(|dsn| {
        sentry::init(sentry::ClientOptions {
            dsn: Some(dsn),
            release: sentry::release_name!(),
            ..Default::default()
        })
    });

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&common.logging.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(guard.as_ref().map(|_| sentry::integrations::tracing::layer()))
        .init();

    guard
}

fn init_metrics(common: &CommonConfig) {
    let Some(metrics_config) = &common.metrics else {
        return;
    };

    let recorder = StatsdBuilder::from(
        metrics_config.statsd_host.as_str(),
        metrics_config.statsd_port,
    )
    .build(Some(metrics_config.prefix.as_str()));
    match recorder {
        Ok(recorder) => {
            if let Err(e) = metrics::set_global_recorder(recorder) {
                tracing::error!(error = %e, "Failed to install metrics recorder");
                return;
            }
            shared::metrics_defs::describe_all(intake::metrics_defs::ALL_METRICS);
        }
        Err(e) => tracing::error!(error = %e, "Failed to build statsd recorder"),
    }
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        CliCommand::Run { config } => {
            let config = load_config(&config);
            let _sentry = init_logging(&config.common);
            init_metrics(&config.common);

            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to start runtime");
                    process::exit(1);
                }
            };

            tracing::info!("Starting formsheet");
            if let Err(e) = rt.block_on(intake::run(config.intake)) {
                tracing::error!(error = %e, "formsheet exited");
                process::exit(1);
            }
        }
        CliCommand::Validate { config: path } => {
            let config = load_config(&path);
            println!(
                "{}: ok, {} mapped fields",
                path.display(),
                config.intake.field_map.len()
            );
        }
    }
}
