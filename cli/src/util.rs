use casepad_core::CompanionError;
use casepad_core::error::BridgeError;
use serde::Serialize;
use serde_json::json;

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_CONNECTION: i32 = 3;
pub const EXIT_USAGE: i32 = 4;

pub fn exit_error(message: &str, docs_hint: Option<&str>) -> ! {
    let mut err = json!({
        "error": "cli_error",
        "message": message
    });
    if let Some(hint) = docs_hint {
        err["docs_hint"] = json!(hint);
    }
    eprintln!("{}", to_pretty(&err));
    std::process::exit(EXIT_USAGE);
}

/// Print a core error as structured JSON on stderr and pick the exit code.
///
/// Exit codes: 1=operation failed, 3=bridge unreachable
pub fn report_error(err: &CompanionError) -> i32 {
    let mut body = json!({
        "error": err.code(),
        "message": err.to_string()
    });
    let exit_code = match err {
        CompanionError::Bridge(BridgeError::Transport(_)) => {
            body["docs_hint"] = json!("Is the host bridge running? Check CASEPAD_BRIDGE_URL.");
            EXIT_CONNECTION
        }
        _ => EXIT_FAILED,
    };
    eprintln!("{}", to_pretty(&body));
    exit_code
}

pub fn print_json<T: Serialize>(value: &T) -> i32 {
    println!("{}", to_pretty(value));
    EXIT_OK
}

/// Print a core result: the value on stdout, or the error on stderr.
pub fn print_result<T: Serialize>(result: Result<T, CompanionError>) -> i32 {
    match result {
        Ok(value) => print_json(&value),
        Err(err) => report_error(&err),
    }
}

fn to_pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
}

/// Resolve a JSON argument given inline (`--data`) or as a file (`--data-file`, `-` for stdin).
pub fn json_arg(
    inline: Option<&str>,
    file: Option<&str>,
    flag: &str,
) -> Result<Option<serde_json::Value>, String> {
    if let Some(raw) = inline {
        return serde_json::from_str(raw)
            .map(Some)
            .map_err(|e| format!("Invalid JSON in --{flag}: {e}"));
    }
    match file {
        Some(path) => read_json_from_file(path).map(Some),
        None => Ok(None),
    }
}

/// Read JSON from a file path or stdin (when path is "-").
pub fn read_json_from_file(path: &str) -> Result<serde_json::Value, String> {
    let raw = if path == "-" {
        std::io::read_to_string(std::io::stdin())
            .map_err(|e| format!("Failed to read stdin: {e}"))?
    } else {
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read file '{path}': {e}"))?
    };
    serde_json::from_str(&raw).map_err(|e| format!("Invalid JSON in '{path}': {e}"))
}
