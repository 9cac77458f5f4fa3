use std::{
    env, fs,
    io::{self, Read},
    path::PathBuf,
    sync::{atomic::Ordering, Arc},
};

use clap::Parser;
use cli::{Args, Commands};
use events::{spawn_event_handler, EventGuard};
use logging::setup_logging;
use miette::{IntoDiagnostic, WrapErr};
use serde_json::Value as JsonValue;
use tally_config::{config_path, generate_default_config, Config, ConfigError};
use tally_db::{handle, seed, Database, DbCall, DbClient, DbError, ErrorEnvelope};
use tally_events::{ChannelSink, EventSinkHandle};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};
use utils::COLOR;

mod cli;
mod events;
mod logging;
mod utils;

/// Opens the configured database with diagnostics routed to a handler thread.
fn create_client(config: &Config) -> miette::Result<(DbClient, EventGuard)> {
    let (sink, receiver) = ChannelSink::new();
    let events: EventSinkHandle = Arc::new(sink);
    let db = Database::open(config, events)?;
    let guard = spawn_event_handler(receiver);
    Ok((DbClient::new(db), guard))
}

fn resolve_config_path(args: &Args) -> miette::Result<PathBuf> {
    let Some(ref path) = args.config else {
        return Ok(config_path());
    };

    let path = PathBuf::from(path);
    if path.is_absolute() {
        return Ok(path);
    }
    Ok(env::current_dir()
        .into_diagnostic()
        .wrap_err("retrieving current directory")?
        .join(path))
}

fn parse_call_args(raw: Option<&str>) -> miette::Result<JsonValue> {
    let raw = match raw {
        None => return Ok(JsonValue::Null),
        Some("-") => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .into_diagnostic()
                .wrap_err("reading call arguments from stdin")?;
            buffer
        }
        Some(raw) => raw.to_string(),
    };

    serde_json::from_str(&raw)
        .into_diagnostic()
        .wrap_err("parsing call arguments")
}

/// Answers one JSON call per stdin line until stdin closes.
async fn serve_stdio(client: &DbClient) -> miette::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.into_diagnostic()? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<DbCall>(line) {
            Ok(call) => handle(client, call).await,
            Err(err) => {
                debug!(error = %err, "malformed call");
                ErrorEnvelope::from(&DbError::from(err)).to_json()
            }
        };

        let mut out = serde_json::to_vec(&response).into_diagnostic()?;
        out.push(b'\n');
        stdout.write_all(&out).await.into_diagnostic()?;
        stdout.flush().await.into_diagnostic()?;
    }

    Ok(())
}

async fn handle_cli() -> miette::Result<()> {
    let args = Args::parse();

    setup_logging(&args);

    if args.no_color {
        COLOR.store(false, Ordering::Relaxed);
    }

    let config_path = resolve_config_path(&args)?;

    match args.command {
        Commands::Init => {
            match generate_default_config(&config_path) {
                Ok(_) => {}
                Err(ConfigError::ConfigAlreadyExists) => {
                    warn!("Config file {} already exists, keeping it", config_path.display());
                }
                Err(err) => return Err(err.into()),
            }

            let config = Config::load_from(&config_path)?;
            let (client, guard) = create_client(&config)?;
            info!("Database ready at {}", config.get_db_path()?.display());
            drop(client);
            guard.finish();
        }
        Commands::Config => {
            let content = match fs::read_to_string(&config_path) {
                Ok(v) => v,
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    warn!("Config file {} not found", config_path.display());
                    Config::default_config().to_toml()?
                }
                Err(err) => {
                    return Err(ConfigError::IoError(err))
                        .wrap_err(format!("reading {}", config_path.display()));
                }
            };
            info!("{}", content);
        }
        Commands::Env => {
            let config = Config::load_from(&config_path)?;
            info!("TALLY_CONFIG={}", config_path.display());
            info!("TALLY_DB={}", config.get_db_path()?.display());
        }
        command => {
            let config = Config::load_from(&config_path)?;
            let (client, guard) = create_client(&config)?;

            match command {
                Commands::Seed => {
                    let summary = seed(&client).await?;
                    info!(
                        "Seeded {} users, {} printers and {} invoice templates",
                        summary.users, summary.printers, summary.templates
                    );
                }
                Commands::Call {
                    model,
                    method,
                    args,
                } => {
                    let args = parse_call_args(args.as_deref())?;
                    let result = client.call(DbCall::new(model, method, args)).await?;
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&result).into_diagnostic()?
                    );
                }
                Commands::Stdio => serve_stdio(&client).await?,
                _ => unreachable!(),
            }

            // Drop the client first to close the event channel, then join the
            // handler thread so remaining diagnostics are rendered.
            drop(client);
            guard.finish();
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    handle_cli().await
}
