use casepad_core::notepad::{Notepad, NotepadMode, Position, PulseSection};
use casepad_core::{CompanionClient, PulseLookup};
use clap::{Subcommand, ValueEnum};
use serde_json::json;

use crate::store::FileStore;
use crate::util::{EXIT_FAILED, print_json, report_error};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Section {
    Symptom,
    Steps,
    DataCollected,
}

impl From<Section> for PulseSection {
    fn from(section: Section) -> Self {
        match section {
            Section::Symptom => PulseSection::Symptom,
            Section::Steps => PulseSection::Steps,
            Section::DataCollected => PulseSection::DataCollected,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Minimized,
    Maximized,
    Toggle,
}

#[derive(Subcommand)]
pub enum NotepadCommands {
    /// Print stored notepad state
    Show,
    /// Append a pulse field of a case to the notepad
    Copy {
        case_id: String,
        #[arg(value_enum)]
        section: Section,
    },
    /// Empty the notepad
    Clear,
    /// Set the window mode
    Mode {
        #[arg(value_enum)]
        mode: ModeArg,
    },
    /// Set the window position (CSS lengths, e.g. 120px)
    Position { left: String, top: String },
}

pub async fn run(client: &CompanionClient, store: FileStore, command: NotepadCommands) -> i32 {
    let mut pad = Notepad::load(store);
    let outcome = match command {
        NotepadCommands::Show => Ok(()),
        NotepadCommands::Copy { case_id, section } => {
            let pulse = match client.get_pulse(&case_id).await {
                PulseLookup::Found(pulse) => pulse,
                PulseLookup::NotYetCreated => {
                    return missing_pulse(&case_id, "new");
                }
                PulseLookup::Unavailable => {
                    return missing_pulse(&case_id, "unavailable");
                }
            };
            pad.append_section(section.into(), &pulse)
        }
        NotepadCommands::Clear => pad.clear(),
        NotepadCommands::Mode { mode } => {
            let mode = match mode {
                ModeArg::Minimized => NotepadMode::Minimized,
                ModeArg::Maximized => NotepadMode::Maximized,
                ModeArg::Toggle => pad.mode().toggled(),
            };
            pad.set_mode(mode)
        }
        NotepadCommands::Position { left, top } => pad.set_position(Position { left, top }),
    };

    if let Err(err) = outcome {
        return report_error(&err);
    }
    print_json(&json!({
        "position": { "left": pad.position().left, "top": pad.position().top },
        "mode": pad.mode().as_str(),
        "content": pad.content()
    }))
}

fn missing_pulse(case_id: &str, status: &str) -> i32 {
    let err = json!({
        "error": "pulse_missing",
        "message": format!("No pulse to copy from for case {case_id}"),
        "status": status
    });
    eprintln!("{}", serde_json::to_string_pretty(&err).unwrap_or_default());
    EXIT_FAILED
}
