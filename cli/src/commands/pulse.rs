use casepad_core::{CompanionClient, PulseLookup};
use clap::Subcommand;
use serde_json::json;

use crate::util::{EXIT_FAILED, exit_error, json_arg, print_json, print_result};

#[derive(Subcommand)]
pub enum PulseCommands {
    /// Show the pulse record of a case
    Get {
        /// Case id
        case_id: String,
    },
    /// Overwrite the pulse record of a case
    Update {
        /// Case id
        case_id: String,
        /// Pulse data as JSON string
        #[arg(long, short = 'd', required_unless_present = "data_file")]
        data: Option<String>,
        /// Read pulse data from file (use '-' for stdin)
        #[arg(long, short = 'f', conflicts_with = "data")]
        data_file: Option<String>,
    },
}

pub async fn run(client: &CompanionClient, command: PulseCommands) -> i32 {
    match command {
        PulseCommands::Get { case_id } => get(client, &case_id).await,
        PulseCommands::Update {
            case_id,
            data,
            data_file,
        } => {
            let data = match json_arg(data.as_deref(), data_file.as_deref(), "data") {
                Ok(Some(v)) => v,
                Ok(None) => exit_error(
                    "Either --data or --data-file is required",
                    Some("Use --data '{\"symptom\":\"<p>...</p>\"}' or --data-file pulse.json"),
                ),
                Err(e) => exit_error(&e, Some("Provide valid JSON")),
            };
            print_result(client.update_pulse(&case_id, &data).await)
        }
    }
}

async fn get(client: &CompanionClient, case_id: &str) -> i32 {
    match client.get_pulse(case_id).await {
        PulseLookup::Found(record) => print_json(&json!({
            "status": "found",
            "case_id": case_id,
            "pulse": record
        })),
        PulseLookup::NotYetCreated => print_json(&json!({
            "status": "new",
            "case_id": case_id
        })),
        PulseLookup::Unavailable => {
            print_json(&json!({
                "status": "unavailable",
                "case_id": case_id
            }));
            EXIT_FAILED
        }
    }
}
