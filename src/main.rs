use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use simbox::config::Config;
use simbox::error::{LoadFailure, RuntimeError};
use simbox::plugins::builtin_registry;
use simbox::registry::Embed;

const DEFAULT_CONFIG_PATH: &str = "config/simbox.toml";

fn print_help() {
    println!(
        "\
simbox v{}

A sandboxed plugin runtime: runs restricted user scripts against a
plugin's capability object and prints the simulation model they drive.

USAGE:
    simbox [OPTIONS] <plugin> <program-file>
    simbox --list

ARGUMENTS:
    <plugin>          Plugin identity, e.g. sound-waves, planets, music, market
    <program-file>    Path to the user program to execute

OPTIONS:
    --language <id>   Language implementation to use [default: basic]
    --config <path>   Path to TOML configuration file [default: {DEFAULT_CONFIG_PATH}]
    --list            List registered plugins and their languages
    -h, --help        Print this help message and exit
    -V, --version     Print version and exit

ENVIRONMENT VARIABLES:
    Variables are referenced in the config file via ${{VAR_NAME}} syntax.

    RUST_LOG          Log level filter for tracing
                      (e.g. debug, simbox=debug,warn)

EXAMPLES:
    simbox sound-waves demos/waves.basic
    simbox --language basic planets demos/system.basic
    RUST_LOG=simbox=debug simbox market demos/drought.basic",
        env!("CARGO_PKG_VERSION"),
    );
}

struct CliArgs {
    plugin: String,
    program: PathBuf,
    language: String,
    config_path: Option<String>,
}

enum CliCommand {
    Run(CliArgs),
    List { config_path: Option<String> },
}

fn parse_args() -> Result<Option<CliCommand>> {
    let mut language = "basic".to_string();
    let mut config_path: Option<String> = None;
    let mut list = false;
    let mut positional: Vec<String> = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(None);
            }
            "--version" | "-V" => {
                println!("simbox v{}", env!("CARGO_PKG_VERSION"));
                return Ok(None);
            }
            "--list" => list = true,
            "--language" => {
                language = args
                    .next()
                    .ok_or_else(|| anyhow!("--language requires a value"))?;
            }
            "--config" => {
                config_path = Some(
                    args.next()
                        .ok_or_else(|| anyhow!("--config requires a value"))?,
                );
            }
            other if other.starts_with('-') => {
                return Err(anyhow!("unknown option: {other} (see --help)"));
            }
            other => positional.push(other.to_string()),
        }
    }

    if list {
        return Ok(Some(CliCommand::List { config_path }));
    }

    let mut positional = positional.into_iter();
    let (plugin, program) = match (positional.next(), positional.next()) {
        (Some(plugin), Some(program)) => (plugin, PathBuf::from(program)),
        _ => return Err(anyhow!("expected <plugin> <program-file> (see --help)")),
    };

    Ok(Some(CliCommand::Run(CliArgs {
        plugin,
        program,
        language,
        config_path,
    })))
}

fn load_config(config_path: Option<&str>) -> Result<Config> {
    match config_path {
        // An explicitly given path must exist.
        Some(path) => Config::load(path),
        None => Config::load_or_default(DEFAULT_CONFIG_PATH),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let command = match parse_args()? {
        Some(command) => command,
        None => return Ok(()),
    };

    // Logs go to stderr; stdout carries the final model snapshot.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("simbox=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match command {
        CliCommand::List { config_path } => {
            let config = load_config(config_path.as_deref())?;
            let registry = builtin_registry(&config);
            for id in registry.ids() {
                let entry = registry.resolve(id)?;
                println!("{id}  [{}]", entry.languages().join(", "));
            }
            Ok(())
        }
        CliCommand::Run(args) => run(args).await,
    }
}

async fn run(args: CliArgs) -> Result<()> {
    let config = load_config(args.config_path.as_deref())?;
    info!(
        step_budget = config.runtime.step_budget,
        "loaded configuration"
    );

    let registry = builtin_registry(&config);
    info!("plugins: {} registered", registry.len());

    let entry = registry.resolve(&args.plugin)?;

    let source =
        std::fs::read_to_string(&args.program).map_err(|e| LoadFailure::Program {
            plugin: args.plugin.clone(),
            path: args.program.clone(),
            source: e,
        })?;

    info!(
        plugin = %args.plugin,
        language = %args.language,
        program = %args.program.display(),
        "mounting embed"
    );

    let Embed {
        host: mut host_port,
        model: model_rx,
        driver: _driver,
    } = entry.spawn_embed();
    let outbound = host_port.outbound();

    // Advisory diagnostics from the embed (superseded sessions,
    // protocol violations).
    tokio::spawn(async move {
        while let Some(notice) = host_port.recv_notice().await {
            debug!(?notice, "embed notice");
        }
    });

    // Stream accepted transitions to the log as the embed publishes them.
    let mut trace_rx = model_rx.clone();
    tokio::spawn(async move {
        while trace_rx.changed().await.is_ok() {
            let snapshot = trace_rx.borrow_and_update().clone();
            debug!(model = %snapshot, "model transition");
        }
    });

    let execution = entry
        .execute(
            &args.language,
            &source,
            outbound,
            config.runtime.step_budget,
        )
        .await;

    let failure = match execution {
        Ok(report) => {
            info!(
                session = %report.session,
                statements = report.statements,
                messages = report.messages,
                "execution succeeded"
            );
            None
        }
        // Load failures (unknown language) abort before evaluation.
        Err(RuntimeError::Load(load)) => return Err(load.into()),
        // Execution failures are reported, but messages already
        // delivered stand; show the model they produced.
        Err(RuntimeError::Execution(failure)) => {
            error!(%failure, "execution failed");
            Some(failure)
        }
    };

    // Let in-flight envelopes reach the embed before snapshotting.
    tokio::time::sleep(Duration::from_millis(config.runtime.settle_ms)).await;

    let snapshot = model_rx.borrow().clone();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    match failure {
        Some(failure) => Err(failure.into()),
        None => Ok(()),
    }
}
