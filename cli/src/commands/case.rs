use casepad_core::CompanionClient;
use casepad_core::case::{CASE_FIELDS_OF_INTEREST, CaseTransition, CaseUpdate, case_label};
use clap::Subcommand;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::util::{EXIT_FAILED, EXIT_OK, print_json};

#[derive(Subcommand)]
pub enum CaseCommands {
    /// Track case notifications read from stdin (one JSON object per line)
    Follow,
}

pub async fn run(client: &CompanionClient, command: CaseCommands) -> i32 {
    match command {
        CaseCommands::Follow => follow(client).await,
    }
}

async fn follow(client: &CompanionClient) -> i32 {
    tracing::info!(fields = ?CASE_FIELDS_OF_INTEREST, "following case updates on stdin");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return EXIT_OK,
            Err(e) => {
                tracing::error!(error = %e, "failed to read stdin");
                return EXIT_FAILED;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let update: CaseUpdate = match serde_json::from_str(&line) {
            Ok(update) => update,
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed case update");
                continue;
            }
        };

        let transition = client.handle_case_update(&update).await;
        print_json(&describe(client, &transition));
    }
}

fn describe(client: &CompanionClient, transition: &CaseTransition) -> Value {
    let case = client.current_case();
    let kind = match transition {
        CaseTransition::Ignored => "ignored",
        CaseTransition::Cleared => "cleared",
        CaseTransition::Opened { .. } => "opened",
    };
    json!({
        "transition": kind,
        "case_id": case.as_ref().map(|c| c.id.clone()),
        "label": case_label(case.as_ref()),
        "pulse": client.current_pulse(),
    })
}
