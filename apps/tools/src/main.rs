use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rpipe::{Action, Message, Pipeline, Receiver, SqliteSetStore};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, prepare_database_url, split_states, DEFAULT_CONFIG_PATH};

#[derive(Parser, Debug)]
#[command(name = "rpipe", about = "Inspect and drive set-backed state pipelines")]
struct Cli {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[arg(long)]
    database_url: Option<String>,
    #[arg(long)]
    group: Option<String>,
    /// Comma-separated configured states, collector excluded.
    #[arg(long)]
    states: Option<String>,
    #[arg(long)]
    suffix: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    States,
    Key {
        id: String,
        state: String,
    },
    ParseKey {
        key: String,
    },
    Register {
        id: String,
        action_type: String,
        #[arg(long)]
        name: Option<String>,
        /// JSON payload attached to the action.
        #[arg(long)]
        payload: Option<String>,
    },
    Add {
        id: String,
        state: String,
        value: String,
    },
    Members {
        id: String,
        state: String,
    },
    Next {
        id: String,
        state: String,
    },
    Move {
        id: String,
        from: String,
        to: String,
    },
    Merge {
        id: String,
        dest: String,
        #[arg(required = true)]
        sources: Vec<String>,
    },
    Clear {
        id: String,
        state: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings(&cli.config)?;
    if let Some(v) = cli.database_url {
        settings.database_url = v;
    }
    if let Some(v) = cli.group {
        settings.group = v;
    }
    if let Some(v) = cli.states {
        settings.states = split_states(&v);
    }
    if let Some(v) = cli.suffix {
        settings.suffix = Some(v);
    }

    let database_url = prepare_database_url(&settings.database_url)?;
    let store = SqliteSetStore::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let pipeline = Pipeline::new(settings.group.clone(), store, settings.pipeline_options())?;
    info!(group = %settings.group, %database_url, "pipeline ready");

    match cli.command {
        Command::States => println!("{}", pipeline.states().join(" -> ")),
        Command::Key { id, state } => println!("{}", pipeline.key(&id, &state)?),
        Command::ParseKey { key } => {
            let parsed = pipeline.parse_key(&key)?;
            println!("id={} state={}", parsed.id, parsed.state);
        }
        Command::Register {
            id,
            action_type,
            name,
            payload,
        } => {
            let payload = payload
                .map(|raw| serde_json::from_str::<serde_json::Value>(&raw))
                .transpose()
                .context("payload is not valid JSON")?;
            let message = Message::new(
                Receiver {
                    id: Some(id.clone()),
                    name,
                },
                Action {
                    kind: action_type,
                    payload,
                },
            );
            pipeline.register_messages(&[message]).await?;
            println!("registered id={id} state={}", pipeline.collector_name());
        }
        Command::Add { id, state, value } => {
            pipeline.add(&id, &state, &value).await?;
            println!("added id={id} state={state}");
        }
        Command::Members { id, state } => {
            let mut members = pipeline.members(&id, &state).await?;
            members.sort();
            for member in members {
                println!("{member}");
            }
        }
        Command::Next { id, state } => match pipeline.next(&id, &state).await? {
            Some(report) => println!(
                "moved {} of {} members of id={id} from {state}",
                report.moved, report.attempted
            ),
            None => println!("id={id} is in terminal state {state}"),
        },
        Command::Move { id, from, to } => {
            let report = pipeline.move_id(&id, &from, &to).await?;
            println!(
                "moved {} of {} members of id={id} from {from} to {to}",
                report.moved, report.attempted
            );
        }
        Command::Merge { id, dest, sources } => {
            let sources: Vec<&str> = sources.iter().map(String::as_str).collect();
            pipeline.merge(&id, &dest, &sources).await?;
            println!("merged {} into {dest} for id={id}", sources.join(","));
        }
        Command::Clear { id, state } => {
            pipeline.clear(&id, &state).await?;
            println!("cleared id={id} state={state}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_merge_with_many_sources() {
        let cli = Cli::try_parse_from([
            "rpipe",
            "--group",
            "testAggregator",
            "merge",
            "123",
            "collector",
            "processing",
            "done",
        ])
        .expect("parse");
        assert_eq!(cli.group.as_deref(), Some("testAggregator"));
        match cli.command {
            Command::Merge { id, dest, sources } => {
                assert_eq!(id, "123");
                assert_eq!(dest, "collector");
                assert_eq!(sources, ["processing", "done"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn merge_requires_a_source() {
        assert!(Cli::try_parse_from(["rpipe", "merge", "123", "collector"]).is_err());
    }
}
