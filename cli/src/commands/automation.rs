use casepad_core::CompanionClient;
use clap::{Subcommand, ValueEnum};
use serde_json::Value;

use crate::util::{exit_error, json_arg, print_result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Vote {
    Up,
    Down,
    /// Withdraw an earlier vote
    None,
}

impl Vote {
    fn as_option(self) -> Option<bool> {
        match self {
            Vote::Up => Some(true),
            Vote::Down => Some(false),
            Vote::None => None,
        }
    }
}

#[derive(Subcommand)]
pub enum AutomationCommands {
    /// Automation runs for a case, running first, newest first
    History {
        /// Correlation id (case number)
        correlation_id: String,
    },
    /// Automations available for a component
    List {
        /// Component (e.g. "BC-DB-HDB")
        component: String,
        /// Restrict to a product name
        #[arg(long)]
        product: Option<String>,
    },
    /// Execute an automation for a case
    Execute {
        automation_id: String,
        /// Correlation id (case number)
        correlation_id: String,
        component: String,
        /// Runtime options as JSON (object or array of option entries)
        #[arg(long)]
        options: Option<String>,
        /// Read runtime options from file (use '-' for stdin)
        #[arg(long, conflicts_with = "options")]
        options_file: Option<String>,
    },
    /// Rate an automation run
    Feedback {
        automation_id: String,
        workflow_id: String,
        #[arg(long, value_enum)]
        vote: Vote,
    },
}

pub async fn run(client: &CompanionClient, command: AutomationCommands) -> i32 {
    let ge = client.guided_engineering();
    match command {
        AutomationCommands::History { correlation_id } => {
            print_result(ge.get_history_data(&correlation_id).await)
        }
        AutomationCommands::List { component, product } => print_result(
            ge.get_available_automations_for_component(&component, product.as_deref())
                .await,
        ),
        AutomationCommands::Execute {
            automation_id,
            correlation_id,
            component,
            options,
            options_file,
        } => {
            let runtime_options =
                match json_arg(options.as_deref(), options_file.as_deref(), "options") {
                    Ok(v) => v.unwrap_or(Value::Null),
                    Err(e) => exit_error(&e, Some("Provide runtime options as JSON")),
                };
            print_result(
                ge.execute_automation(&automation_id, &correlation_id, &component, &runtime_options)
                    .await,
            )
        }
        AutomationCommands::Feedback {
            automation_id,
            workflow_id,
            vote,
        } => print_result(
            ge.add_feedback_for_automation(&automation_id, &workflow_id, vote.as_option())
                .await,
        ),
    }
}
