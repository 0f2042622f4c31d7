//! Scripted driver for one resolution session.
//!
//! Reads commands from stdin (see [`script`] for the grammar), applies them
//! to a runtime session and prints each result.
//!
//! # Examples
//!
//! ```bash
//! MANOR_SESSION=game-1 MANOR_SCENARIO=seed.toml cargo run -p manor-cli < night1.txt
//! ```

mod config;
mod logging;
mod output;
mod script;

use anyhow::{Context, Result};
use game_content::{ConfigLoader, ScenarioLoader};
use runtime::{NullNotifier, Runtime, RuntimeBuilder, RuntimeConfig, RuntimeError, SessionHandle};
use tokio::io::{AsyncBufReadExt, BufReader};

use config::CliConfig;
use output::StdoutNotifier;
use script::{HELP, ScriptCommand};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = CliConfig::from_env();
    let _guard = logging::setup_logging(&cli.session_id, cli.log_dir.as_deref())?;

    let mut config = RuntimeConfig::from_env();
    if let Some(path) = &cli.session_config {
        config.session = ConfigLoader::load(path)
            .with_context(|| format!("loading session config {}", path.display()))?;
    }
    tracing::info!("Session ID: {}", cli.session_id);
    tracing::info!("Persistence: {:?}", config.save_dir);

    let builder: RuntimeBuilder = Runtime::builder().config(config);
    let mut runtime = if cli.echo_events {
        builder.notifier(StdoutNotifier).build()?
    } else {
        builder.notifier(NullNotifier).build()?
    };

    let handle = match &cli.scenario {
        Some(path) => {
            let seed = ScenarioLoader::load(path)
                .with_context(|| format!("loading scenario {}", path.display()))?;
            runtime.open_seeded(cli.session_id.clone(), &seed).await?
        }
        None => runtime.open_session(cli.session_id.clone()).await?,
    };

    run_script(&handle).await?;

    runtime.shutdown().await?;
    tracing::info!("Driver shutdown complete");
    Ok(())
}

async fn run_script(handle: &SessionHandle) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let command = match script::parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                println!("error: {err}");
                continue;
            }
        };

        match command {
            ScriptCommand::Apply(op) => match handle.execute(op).await {
                Ok(outcome) => println!("{}", output::describe(&outcome)),
                Err(RuntimeError::Engine(err)) => println!("rejected: {err}"),
                Err(err) => return Err(err.into()),
            },
            ScriptCommand::Pending => {
                let state = handle.query_state().await?;
                for action in state.queue.order() {
                    println!("{}", output::action_line(action));
                }
            }
            ScriptCommand::State => {
                let state = handle.query_state().await?;
                for line in output::summarize(&state) {
                    println!("{line}");
                }
            }
            ScriptCommand::Root => println!("{}", handle.state_root().await?),
            ScriptCommand::Help => println!("{HELP}"),
            ScriptCommand::Quit => break,
        }
    }

    Ok(())
}
