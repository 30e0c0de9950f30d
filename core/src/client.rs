use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use serde_json::{Value, json};

use crate::bridge::{BusyIndicator, HostBridge, events};
use crate::case::{CaseContext, CaseTracker, CaseTransition, CaseUpdate};
use crate::config::CompanionConfig;
use crate::error::Result;
use crate::gateway::RequestGateway;
use crate::history::{AutomationHistoryEntry, rank};
use crate::options::{NormalizedOption, normalize_options};
use crate::pulse::{PulseLookup, PulseRecord, pulse_path};
use crate::templates::{Template, parse_templates};
use crate::version::templates_suppressed_above;

const ANALYTICS_VIEW: &str = "case_assistant";

/// Session object for one host lifetime: owns both backend gateways, their
/// token slots, and the open-case holder.
pub struct CompanionClient {
    bridge: Arc<dyn HostBridge>,
    config: CompanionConfig,
    case_assistant: RequestGateway,
    guided_engineering: RequestGateway,
    tracker: Mutex<CaseTracker>,
}

impl CompanionClient {
    pub fn new(bridge: Arc<dyn HostBridge>, config: CompanionConfig) -> Self {
        let case_assistant = RequestGateway::new(
            bridge.clone(),
            config.case_assistant.clone(),
            config.env.clone(),
        );
        let guided_engineering = RequestGateway::new(
            bridge.clone(),
            config.guided_engineering.clone(),
            config.env.clone(),
        );
        Self {
            bridge,
            config,
            case_assistant,
            guided_engineering,
            tracker: Mutex::new(CaseTracker::default()),
        }
    }

    /// Show `indicator` around every guided-engineering request.
    pub fn with_busy_indicator(mut self, indicator: Arc<dyn BusyIndicator>) -> Self {
        self.guided_engineering = self.guided_engineering.with_busy_indicator(indicator);
        self
    }

    pub fn config(&self) -> &CompanionConfig {
        &self.config
    }

    /// Read the pulse for `case_id`. Never fails: errors are logged and
    /// reported as [`PulseLookup::Unavailable`].
    pub async fn get_pulse(&self, case_id: &str) -> PulseLookup {
        match self.case_assistant.get(&pulse_path(case_id)).await {
            Ok(reply) => PulseLookup::from_reply(reply),
            Err(err) => {
                tracing::error!(case_id, error = %err, "failed to load pulse");
                PulseLookup::Unavailable
            }
        }
    }

    /// Write `data` to the case's pulse verbatim and return the backend reply.
    pub async fn update_pulse(&self, case_id: &str, data: &Value) -> Result<Value> {
        self.case_assistant.post(&pulse_path(case_id), data).await
    }

    /// Legacy host templates. `Some(vec![])` when the host version gates them
    /// off, `None` when the host has none or anything fails.
    pub async fn get_templates(&self) -> Option<Vec<Template>> {
        match self.load_templates().await {
            Ok(templates) => templates,
            Err(err) => {
                tracing::error!(error = %err, "failed to load templates");
                None
            }
        }
    }

    async fn load_templates(&self) -> Result<Option<Vec<Template>>> {
        let version = self.bridge.host_version().await?;
        if templates_suppressed_above(&version, &self.config.min_template_version) {
            tracing::debug!(%version, "legacy templates suppressed for this host");
            return Ok(Some(Vec::new()));
        }

        let reply = self.bridge.send(events::GET_TEMPLATES, None).await?;
        let dump = match reply {
            Value::String(dump) if !dump.is_empty() => dump,
            _ => return Ok(None),
        };
        parse_templates(&dump).map(Some)
    }

    /// Ask the host to open `url` in its quick-view popup.
    pub async fn open_quick_view(&self, url: &str) -> Result<()> {
        self.bridge
            .send(events::OPEN_POPUP_WINDOW, Some(json!(url)))
            .await?;
        Ok(())
    }

    pub async fn send_analytics(&self, action: &str, metadata: Option<Value>) -> Result<()> {
        let mut payload = json!({ "view": ANALYTICS_VIEW, "action": action });
        if let Some(metadata) = metadata {
            payload["metadata"] = metadata;
        }
        self.bridge
            .send(events::TRACK_ANALYTICS, Some(payload))
            .await?;
        Ok(())
    }

    pub fn guided_engineering(&self) -> GuidedEngineering<'_> {
        GuidedEngineering { client: self }
    }

    /// React to a case notification: update the open case and, for a newly
    /// opened case, fetch its pulse. A pulse that arrives after another case
    /// was opened is dropped.
    pub async fn handle_case_update(&self, update: &CaseUpdate) -> CaseTransition {
        let transition = self.tracker().apply_update(update);
        if let CaseTransition::Opened { case_id } = &transition {
            let lookup = self.get_pulse(case_id).await;
            self.tracker().accept_pulse(case_id, lookup);
        }
        transition
    }

    pub fn current_case(&self) -> Option<CaseContext> {
        self.tracker().case().cloned()
    }

    /// Pulse of the open case, if it has been loaded and exists.
    pub fn current_pulse(&self) -> Option<PulseRecord> {
        self.tracker().pulse().and_then(PulseLookup::record).cloned()
    }

    fn tracker(&self) -> MutexGuard<'_, CaseTracker> {
        self.tracker.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Automation history as returned by [`GuidedEngineering::get_history_data`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HistoryReply {
    Entries(Vec<AutomationHistoryEntry>),
    /// Anything other than a non-empty list, passed through untouched.
    Other(Value),
}

#[derive(Debug, Serialize)]
struct ExecuteRequest<'a> {
    id: &'a str,
    incident_no: &'a str,
    component: &'a str,
    options: Vec<NormalizedOption>,
}

#[derive(Debug, Serialize)]
struct FeedbackRequest<'a> {
    automation_id: &'a str,
    workflow_id: &'a str,
    thumb_up: bool,
    thumb_down: bool,
}

/// Calls against the guided-engineering automation service. Errors propagate.
pub struct GuidedEngineering<'a> {
    client: &'a CompanionClient,
}

impl GuidedEngineering<'_> {
    fn gateway(&self) -> &RequestGateway {
        &self.client.guided_engineering
    }

    pub async fn get_history_data(&self, correlation_id: &str) -> Result<HistoryReply> {
        let reply = self
            .gateway()
            .get(&format!("/automations/history/{correlation_id}"))
            .await?;

        let is_populated_list = reply.as_array().is_some_and(|items| !items.is_empty());
        if !is_populated_list {
            return Ok(HistoryReply::Other(reply));
        }
        match serde_json::from_value::<Vec<AutomationHistoryEntry>>(reply.clone()) {
            Ok(entries) => Ok(HistoryReply::Entries(rank(
                entries,
                self.client.config.ranking,
            ))),
            Err(err) => {
                tracing::warn!(error = %err, "history entries have an unexpected shape, not ranking");
                Ok(HistoryReply::Other(reply))
            }
        }
    }

    pub async fn get_available_automations_for_component(
        &self,
        component: &str,
        product_name: Option<&str>,
    ) -> Result<Value> {
        let path = match product_name.filter(|p| !p.is_empty()) {
            Some(product) => format!(
                "/automations/{component}?product={}",
                urlencoding::encode(product)
            ),
            None => format!("/automations/{component}"),
        };
        self.gateway().get(&path).await
    }

    pub async fn execute_automation(
        &self,
        automation_id: &str,
        correlation_id: &str,
        component: &str,
        runtime_options: &Value,
    ) -> Result<Value> {
        let body = ExecuteRequest {
            id: automation_id,
            incident_no: correlation_id,
            component,
            options: normalize_options(runtime_options)?,
        };
        let body = serde_json::to_value(&body)?;
        self.gateway().post("/automation/execute", &body).await
    }

    /// `vote`: `Some(true)` thumbs up, `Some(false)` thumbs down, `None` withdraws.
    pub async fn add_feedback_for_automation(
        &self,
        automation_id: &str,
        workflow_id: &str,
        vote: Option<bool>,
    ) -> Result<Value> {
        let body = FeedbackRequest {
            automation_id,
            workflow_id,
            thumb_up: vote == Some(true),
            thumb_down: vote == Some(false),
        };
        let body = serde_json::to_value(&body)?;
        self.gateway().post("/automation/feedback", &body).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::history::RankingMode;
    use crate::testing::{CountingIndicator, ScriptedBridge};

    fn client(bridge: &Arc<ScriptedBridge>) -> CompanionClient {
        CompanionClient::new(bridge.clone(), CompanionConfig::default())
    }

    fn last_request(bridge: &ScriptedBridge) -> Value {
        bridge
            .payloads(events::ENGINE_REQUEST)
            .pop()
            .flatten()
            .unwrap()
    }

    #[tokio::test]
    async fn pulse_reply_shapes() {
        let bridge = Arc::new(ScriptedBridge::new());
        bridge.reply(events::SSO_REQUEST, json!({ "token": "ca" }));
        bridge.reply(events::ENGINE_REQUEST, json!([]));
        bridge.reply(events::ENGINE_REQUEST, json!([{ "symptom": "s" }]));
        bridge.fail(events::ENGINE_REQUEST, "offline");

        let client = client(&bridge);
        assert_eq!(client.get_pulse("1").await, PulseLookup::NotYetCreated);
        assert_eq!(
            client.get_pulse("1").await.record().unwrap().symptom().as_deref(),
            Some("s")
        );
        assert_eq!(client.get_pulse("1").await, PulseLookup::Unavailable);
        assert_eq!(last_request(&bridge)["path"], "/case/pulse/1");
        assert_eq!(bridge.count(events::SSO_REQUEST), 1);
    }

    #[tokio::test]
    async fn update_pulse_propagates_errors() {
        let bridge = Arc::new(ScriptedBridge::new());
        bridge.reply(events::SSO_REQUEST, json!({ "token": "ca" }));
        bridge.reply(events::ENGINE_REQUEST, json!({ "saved": true }));
        bridge.fail(events::ENGINE_REQUEST, "offline");

        let client = client(&bridge);
        let data = json!({ "symptom": "<p>x</p>" });
        assert_eq!(
            client.update_pulse("7", &data).await.unwrap(),
            json!({ "saved": true })
        );
        assert_eq!(last_request(&bridge)["body"], data);
        assert!(client.update_pulse("7", &data).await.is_err());
    }

    #[tokio::test]
    async fn guided_engineering_token_fetched_per_call() {
        let bridge = Arc::new(ScriptedBridge::new());
        bridge.reply(events::SSO_REQUEST, json!({ "token": "ge-1" }));
        bridge.reply(events::SSO_REQUEST, json!({ "token": "ge-2" }));

        let client = client(&bridge);
        let ge = client.guided_engineering();
        ge.get_available_automations_for_component("BC-CCM", None).await.unwrap();
        ge.get_available_automations_for_component("BC-CCM", Some("SAP S/4HANA"))
            .await
            .unwrap();

        assert_eq!(bridge.count(events::SSO_REQUEST), 2);
        let sent = bridge.payloads(events::ENGINE_REQUEST);
        let first = sent[0].clone().unwrap();
        let second = sent[1].clone().unwrap();
        assert_eq!(first["path"], "/automations/BC-CCM");
        assert_eq!(first["service"], "backend-guided-engineering");
        assert_eq!(
            second["path"],
            "/automations/BC-CCM?product=SAP%20S%2F4HANA"
        );
        assert_eq!(second["headers"]["Authorization"], "Bearer ge-2");
    }

    #[tokio::test]
    async fn history_is_ranked() {
        let bridge = Arc::new(ScriptedBridge::new());
        bridge.reply(
            events::ENGINE_REQUEST,
            json!([
                { "id": 1, "status": "SUCCESS", "completed_ts": "2024-01-01T00:00:00Z" },
                { "id": 2, "status": "RUNNING" },
                { "id": 3, "status": "SUCCESS", "completed_ts": "2024-02-01T00:00:00Z" }
            ]),
        );
        bridge.reply(events::ENGINE_REQUEST, json!([]));

        let client = client(&bridge);
        let HistoryReply::Entries(entries) =
            client.guided_engineering().get_history_data("INC1").await.unwrap()
        else {
            panic!("expected entries");
        };
        let ids: Vec<i64> = entries.iter().map(|e| e.extra["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(last_request(&bridge)["path"], "/automations/history/INC1");

        assert_eq!(
            client.guided_engineering().get_history_data("INC1").await.unwrap(),
            HistoryReply::Other(json!([]))
        );
    }

    #[tokio::test]
    async fn legacy_ranking_is_configurable() {
        let bridge = Arc::new(ScriptedBridge::new());
        bridge.reply(
            events::ENGINE_REQUEST,
            json!([
                { "id": 1, "status": "SUCCESS", "completed_ts": "2024-01-01T00:00:00Z" },
                { "id": 2, "status": "SUCCESS", "completed_ts": "2024-02-01T00:00:00Z" }
            ]),
        );
        let config = CompanionConfig {
            ranking: RankingMode::Legacy,
            ..CompanionConfig::default()
        };
        let client = CompanionClient::new(bridge.clone(), config);
        let reply = client.guided_engineering().get_history_data("X").await.unwrap();
        let HistoryReply::Entries(entries) = reply else {
            panic!("expected entries");
        };
        assert_eq!(entries[0].extra["id"], 2);
    }

    #[tokio::test]
    async fn execute_sends_normalized_options() {
        let bridge = Arc::new(ScriptedBridge::new());
        bridge.reply(events::ENGINE_REQUEST, json!({ "workflow_id": "w1" }));

        let indicator = Arc::new(CountingIndicator::default());
        let client = client(&bridge).with_busy_indicator(indicator.clone());
        let options = json!({
            "a": { "control": "selectbox", "option": { "name": "sid" }, "values": { "value": "PRD" } },
            "b": { "control": "freetext", "option": { "name": "comment" } }
        });

        let reply = client
            .guided_engineering()
            .execute_automation("auto-1", "INC9", "BC-DB", &options)
            .await
            .unwrap();
        assert_eq!(reply["workflow_id"], "w1");
        assert_eq!(
            last_request(&bridge)["body"],
            json!({
                "id": "auto-1",
                "incident_no": "INC9",
                "component": "BC-DB",
                "options": [
                    { "name": "sid", "values": ["PRD"] },
                    { "name": "comment", "values": [""] }
                ]
            })
        );
        assert_eq!(*indicator.calls.lock().unwrap(), vec!["show", "hide"]);
    }

    #[tokio::test]
    async fn invalid_options_never_reach_the_bridge() {
        let bridge = Arc::new(ScriptedBridge::new());
        let client = client(&bridge);
        let result = client
            .guided_engineering()
            .execute_automation("a", "c", "x", &json!([{ "value": "no name" }]))
            .await;
        assert!(result.is_err());
        assert_eq!(bridge.count(events::ENGINE_REQUEST), 0);
    }

    #[tokio::test]
    async fn feedback_votes() {
        let bridge = Arc::new(ScriptedBridge::new());
        let client = client(&bridge);
        let ge = client.guided_engineering();

        for (vote, up, down) in [(Some(true), true, false), (Some(false), false, true), (None, false, false)] {
            ge.add_feedback_for_automation("a1", "w1", vote).await.unwrap();
            let body = last_request(&bridge)["body"].clone();
            assert_eq!(
                body,
                json!({ "automation_id": "a1", "workflow_id": "w1", "thumb_up": up, "thumb_down": down })
            );
        }
        assert_eq!(last_request(&bridge)["path"], "/automation/feedback");
    }

    #[tokio::test]
    async fn analytics_and_quick_view_events() {
        let bridge = Arc::new(ScriptedBridge::new());
        let client = client(&bridge);

        client.send_analytics("copy_symptom", None).await.unwrap();
        client
            .send_analytics("open", Some(json!({ "case": "1" })))
            .await
            .unwrap();
        client.open_quick_view("https://example.test/kb/1").await.unwrap();

        let analytics = bridge.payloads(events::TRACK_ANALYTICS);
        assert_eq!(
            analytics[0],
            Some(json!({ "view": "case_assistant", "action": "copy_symptom" }))
        );
        assert_eq!(analytics[1].as_ref().unwrap()["metadata"]["case"], "1");
        assert_eq!(
            bridge.payloads(events::OPEN_POPUP_WINDOW)[0],
            Some(json!("https://example.test/kb/1"))
        );
    }

    #[tokio::test]
    async fn templates_follow_version_gate() {
        let bridge = Arc::new(ScriptedBridge::new());
        bridge.set_version("1.7.0");
        let client = client(&bridge);
        assert_eq!(client.get_templates().await, Some(Vec::new()));
        assert_eq!(bridge.count(events::GET_TEMPLATES), 0);

        let bridge = Arc::new(ScriptedBridge::new());
        bridge.set_version("1.6.44");
        bridge.reply(
            events::GET_TEMPLATES,
            json!(json!({
                "template_metadata_1": "{\"id\":1,\"title\":\"Greeting\"}",
                "template_text_1": "Hello"
            })
            .to_string()),
        );
        bridge.reply(events::GET_TEMPLATES, json!(""));
        let client = self::client(&bridge);
        let templates = client.get_templates().await.unwrap();
        assert_eq!(templates[0].content, "Hello");
        assert_eq!(client.get_templates().await, None);
    }

    #[tokio::test]
    async fn templates_swallow_failures() {
        let bridge = Arc::new(ScriptedBridge::new());
        let client = client(&bridge);
        // No version scripted: the host lookup fails.
        assert_eq!(client.get_templates().await, None);
    }

    #[tokio::test]
    async fn case_update_loads_pulse_for_open_case() {
        let bridge = Arc::new(ScriptedBridge::new());
        bridge.reply(events::SSO_REQUEST, json!({ "token": "ca" }));
        bridge.reply(events::ENGINE_REQUEST, json!([{ "symptom": "<p>s</p>" }]));

        let client = client(&bridge);
        let update: CaseUpdate = serde_json::from_value(json!({
            "types": ["headers"],
            "id": "c1",
            "title": "Short dump",
            "headers": { "data": { "number": "0001" } }
        }))
        .unwrap();

        assert_eq!(
            client.handle_case_update(&update).await,
            CaseTransition::Opened { case_id: "c1".into() }
        );
        assert_eq!(client.current_case().unwrap().label(), "0001 - Short dump...");
        assert_eq!(client.current_pulse().unwrap().symptom().as_deref(), Some("<p>s</p>"));

        let cleared: CaseUpdate = serde_json::from_value(json!({ "types": ["nocase"] })).unwrap();
        assert_eq!(client.handle_case_update(&cleared).await, CaseTransition::Cleared);
        assert!(client.current_case().is_none());
        assert!(client.current_pulse().is_none());
    }
}
