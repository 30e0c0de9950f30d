use crate::history::RankingMode;

pub const ENV_OVERRIDE_ENV: &str = "CASEPAD_ENV";
pub const RANKING_ENV: &str = "CASEPAD_RANKING";
pub const CACHE_GE_TOKEN_ENV: &str = "CASEPAD_CACHE_GE_TOKEN";

/// Oldest host version that still serves the legacy template event.
pub const MIN_TEMPLATE_HOST_VERSION: &str = "1.6.44";

/// How long a bearer token, once fetched, is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPolicy {
    /// Fetch once, reuse for the rest of the session.
    Session,
    /// Ask the SSO broker again before every request.
    EveryCall,
}

/// One backend service reachable through the host bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Service name the host routes `engine-request` to.
    pub backend: String,
    /// Token-service identifier passed to the SSO broker.
    pub token_service: String,
    pub token_policy: TokenPolicy,
}

impl ServiceConfig {
    pub fn case_assistant() -> Self {
        Self {
            backend: "backend-case-assistant".to_string(),
            token_service: "supportportal_token".to_string(),
            token_policy: TokenPolicy::Session,
        }
    }

    pub fn guided_engineering() -> Self {
        Self {
            backend: "backend-guided-engineering".to_string(),
            token_service: "guided-engineering-token".to_string(),
            token_policy: TokenPolicy::EveryCall,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanionConfig {
    /// Forces every bridge request onto a named backend environment.
    pub env: Option<String>,
    pub case_assistant: ServiceConfig,
    pub guided_engineering: ServiceConfig,
    pub min_template_version: String,
    pub ranking: RankingMode,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            env: None,
            case_assistant: ServiceConfig::case_assistant(),
            guided_engineering: ServiceConfig::guided_engineering(),
            min_template_version: MIN_TEMPLATE_HOST_VERSION.to_string(),
            ranking: RankingMode::default(),
        }
    }
}

impl CompanionConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        config.env = lookup(ENV_OVERRIDE_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        if let Some(raw) = lookup(RANKING_ENV) {
            match raw.parse::<RankingMode>() {
                Ok(mode) => config.ranking = mode,
                Err(_) => tracing::warn!(value = %raw, "ignoring unknown {RANKING_ENV}"),
            }
        }

        if parse_env_bool_flag(lookup(CACHE_GE_TOKEN_ENV), false) {
            config.guided_engineering.token_policy = TokenPolicy::Session;
        }
        config
    }
}

fn parse_env_bool_flag(raw: Option<String>, default: bool) -> bool {
    match raw {
        Some(value) => matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        None => default,
    }
}
