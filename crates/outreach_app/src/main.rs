mod app;
mod config;
mod effects;
mod logging;
mod render;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use outreach_core::SessionPhase;
use outreach_engine::EngineHandle;
use outreach_logging::outreach_error;

use crate::app::App;
use crate::config::AppConfig;
use crate::effects::EffectRunner;
use crate::logging::LogDestination;

/// Follow a source/target scrape as it streams in, stage by stage.
#[derive(Parser)]
#[command(name = "outreach_app")]
#[command(version)]
struct Args {
    /// RON configuration file (defaults to ./outreach.ron when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Streaming endpoint, overrides the config file
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Company lookup endpoint, overrides the config file
    #[arg(long, global = true)]
    lookup_endpoint: Option<String>,

    /// Where log output goes
    #[arg(long, global = true, value_enum, default_value = "file")]
    log: LogDestination,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Open a session for two company domains and print each stage as it completes
    Stream { source: String, target: String },
    /// Look up companies matching a name fragment
    Search { query: String },
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::initialize(args.log);

    match run(args) {
        Ok(code) => code,
        Err(err) => {
            outreach_error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<ExitCode> {
    let mut config = AppConfig::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(endpoint) = args.endpoint {
        config.stream.endpoint = endpoint;
    }
    if let Some(endpoint) = args.lookup_endpoint {
        config.lookup.endpoint = endpoint;
    }

    let lookup = config.lookup_settings();
    let min_query_len = lookup.min_query_len;
    let search_timeout = lookup.request_timeout + lookup.debounce + Duration::from_secs(1);
    let engine = EngineHandle::new(config.stream_settings(), lookup);
    let mut app = App::new(EffectRunner::new(engine), min_query_len, io::stdout());

    match args.command {
        Command::Stream { source, target } => {
            let phase = app.stream(&source, &target).context("streaming session")?;
            Ok(match phase {
                SessionPhase::Complete => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            })
        }
        Command::Search { query } => {
            let found = app
                .search(&query, search_timeout)
                .context("running lookup")?;
            Ok(match found {
                Some(_) => ExitCode::SUCCESS,
                None => ExitCode::from(2),
            })
        }
    }
}
