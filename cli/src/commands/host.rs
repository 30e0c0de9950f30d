use casepad_core::CompanionClient;
use serde_json::json;

use crate::util::{EXIT_FAILED, exit_error, json_arg, print_json, print_result};

pub async fn templates(client: &CompanionClient) -> i32 {
    match client.get_templates().await {
        Some(templates) => print_json(&templates),
        None => {
            print_json(&json!(null));
            EXIT_FAILED
        }
    }
}

pub async fn analytics(client: &CompanionClient, action: &str, metadata: Option<&str>) -> i32 {
    let metadata = match json_arg(metadata, None, "metadata") {
        Ok(v) => v,
        Err(e) => exit_error(&e, Some("Metadata must be a JSON value")),
    };
    print_result(
        client
            .send_analytics(action, metadata)
            .await
            .map(|()| json!({ "status": "sent", "action": action })),
    )
}

pub async fn quick_view(client: &CompanionClient, url: &str, local: bool) -> i32 {
    if let Err(e) = url::Url::parse(url) {
        exit_error(&format!("Invalid URL '{url}': {e}"), None);
    }
    if local {
        if let Err(e) = open::that(url) {
            tracing::warn!(error = %e, "could not open URL locally");
        }
    }
    print_result(
        client
            .open_quick_view(url)
            .await
            .map(|()| json!({ "status": "opened", "url": url })),
    )
}
