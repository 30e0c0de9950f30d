use std::path::PathBuf;
use std::sync::Arc;

use casepad_core::history::RankingMode;
use casepad_core::{CompanionClient, CompanionConfig};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod bridge;
mod commands;
mod store;
mod util;

use commands::automation::AutomationCommands;
use commands::case::CaseCommands;
use commands::notepad::NotepadCommands;
use commands::pulse::PulseCommands;

#[derive(Parser)]
#[command(
    name = "casepad",
    version,
    about = "casepad — case notepad companion for the case-assistant and guided-engineering backends"
)]
struct Cli {
    /// Host bridge base URL
    #[arg(long, env = "CASEPAD_BRIDGE_URL", default_value = "http://localhost:9230")]
    bridge_url: String,

    /// Force a backend environment for every request
    #[arg(long, env = "CASEPAD_ENV")]
    env: Option<String>,

    /// History ordering: "ordered" (default) or "legacy"
    #[arg(long, env = "CASEPAD_RANKING")]
    ranking: Option<RankingMode>,

    /// Notepad state file (defaults to <config dir>/casepad/notepad.json)
    #[arg(long, env = "CASEPAD_STORE")]
    store: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read or write case pulse records
    Pulse {
        #[command(subcommand)]
        command: PulseCommands,
    },
    /// Guided-engineering automations
    Automation {
        #[command(subcommand)]
        command: AutomationCommands,
    },
    /// List legacy host templates
    Templates,
    /// Send an analytics event
    Analytics {
        /// Action name
        action: String,
        /// Metadata as JSON
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Open a URL in the host quick-view window
    QuickView {
        url: String,
        /// Also open the URL in the local browser
        #[arg(long)]
        local: bool,
    },
    /// Case notifications
    Case {
        #[command(subcommand)]
        command: CaseCommands,
    },
    /// Local notepad state
    Notepad {
        #[command(subcommand)]
        command: NotepadCommands,
    },
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "casepad=info,casepad_core=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn build_config(cli: &Cli) -> CompanionConfig {
    let mut config = CompanionConfig::from_env();
    if let Some(env) = cli.env.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        config.env = Some(env.to_string());
    }
    if let Some(ranking) = cli.ranking {
        config.ranking = ranking;
    }
    config
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let bridge = match bridge::HttpBridge::new(&cli.bridge_url) {
        Ok(b) => b,
        Err(e) => util::exit_error(&e, Some("Set --bridge-url or CASEPAD_BRIDGE_URL")),
    };
    let client = CompanionClient::new(Arc::new(bridge), build_config(&cli))
        .with_busy_indicator(Arc::new(bridge::LogBusyIndicator));

    let code = match cli.command {
        Commands::Pulse { command } => commands::pulse::run(&client, command).await,
        Commands::Automation { command } => commands::automation::run(&client, command).await,
        Commands::Templates => commands::host::templates(&client).await,
        Commands::Analytics { action, metadata } => {
            commands::host::analytics(&client, &action, metadata.as_deref()).await
        }
        Commands::QuickView { url, local } => {
            commands::host::quick_view(&client, &url, local).await
        }
        Commands::Case { command } => commands::case::run(&client, command).await,
        Commands::Notepad { command } => {
            let path = cli.store.unwrap_or_else(store::default_store_path);
            commands::notepad::run(&client, store::FileStore::new(path), command).await
        }
    };

    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_execute_with_options() {
        let cli = Cli::try_parse_from([
            "casepad",
            "--bridge-url",
            "http://host:1",
            "automation",
            "execute",
            "auto-1",
            "INC1",
            "BC-DB",
            "--options",
            "[]",
        ])
        .unwrap();
        assert_eq!(cli.bridge_url, "http://host:1");
        assert!(matches!(
            cli.command,
            Commands::Automation {
                command: AutomationCommands::Execute { .. }
            }
        ));
    }

    #[test]
    fn ranking_flag_overrides_config() {
        let cli = Cli::try_parse_from(["casepad", "--ranking", "legacy", "templates"]).unwrap();
        assert_eq!(build_config(&cli).ranking, RankingMode::Legacy);
    }

    #[test]
    fn pulse_update_requires_data() {
        assert!(Cli::try_parse_from(["casepad", "pulse", "update", "42"]).is_err());
        assert!(
            Cli::try_parse_from(["casepad", "pulse", "update", "42", "--data", "{}"]).is_ok()
        );
    }

    #[test]
    fn feedback_vote_values() {
        for vote in ["up", "down", "none"] {
            assert!(
                Cli::try_parse_from(["casepad", "automation", "feedback", "a", "w", "--vote", vote])
                    .is_ok()
            );
        }
    }
}
