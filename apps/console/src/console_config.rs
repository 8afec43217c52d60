use std::env;
use std::path::PathBuf;
use std::time::Duration;

use harvestgate_core::AppError;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Debug, Clone)]
pub struct ConsoleCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub api_base_url: Url,
    pub storage_path: PathBuf,
    pub route: String,
    pub credentials: Option<ConsoleCredentials>,
    pub sso_code: Option<String>,
    pub search_query: Option<String>,
    pub reconcile_interval: Duration,
    pub refresh_cooldown: Duration,
    pub http_timeout: Duration,
    pub logout_on_exit: bool,
}

impl ConsoleConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let optional = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let raw_base_url = optional("HARVESTGATE_API_BASE_URL")
            .unwrap_or_else(|| "http://127.0.0.1:8000".to_owned());
        let api_base_url = Url::parse(&raw_base_url).map_err(|error| {
            AppError::Validation(format!(
                "invalid HARVESTGATE_API_BASE_URL '{raw_base_url}': {error}"
            ))
        })?;

        let storage_path = optional("HARVESTGATE_STORAGE_PATH")
            .map_or_else(|| PathBuf::from(".harvestgate-session.json"), PathBuf::from);
        let route = optional("HARVESTGATE_ROUTE").unwrap_or_else(|| "/dashboard".to_owned());
        if !route.starts_with('/') {
            return Err(AppError::Validation(format!(
                "HARVESTGATE_ROUTE must start with '/', got '{route}'"
            )));
        }

        let credentials = match (
            optional("HARVESTGATE_EMAIL"),
            lookup("HARVESTGATE_PASSWORD").filter(|value| !value.is_empty()),
        ) {
            (Some(email), Some(password)) => Some(ConsoleCredentials { email, password }),
            (None, None) => None,
            _ => {
                return Err(AppError::Validation(
                    "HARVESTGATE_EMAIL and HARVESTGATE_PASSWORD must be set together".to_owned(),
                ));
            }
        };

        Ok(Self {
            api_base_url,
            storage_path,
            route,
            credentials,
            sso_code: optional("HARVESTGATE_SSO_CODE"),
            search_query: optional("HARVESTGATE_SEARCH_QUERY"),
            reconcile_interval: parse_secs(
                "HARVESTGATE_RECONCILE_INTERVAL_SECS",
                optional("HARVESTGATE_RECONCILE_INTERVAL_SECS"),
                300,
            )?,
            refresh_cooldown: parse_secs(
                "HARVESTGATE_REFRESH_COOLDOWN_SECS",
                optional("HARVESTGATE_REFRESH_COOLDOWN_SECS"),
                10,
            )?,
            http_timeout: parse_secs(
                "HARVESTGATE_HTTP_TIMEOUT_SECS",
                optional("HARVESTGATE_HTTP_TIMEOUT_SECS"),
                15,
            )?,
            logout_on_exit: optional("HARVESTGATE_LOGOUT_ON_EXIT")
                .is_some_and(|value| value.eq_ignore_ascii_case("true")),
        })
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn parse_secs(name: &str, value: Option<String>, default: u64) -> Result<Duration, AppError> {
    let seconds = match value {
        Some(value) => value
            .parse::<u64>()
            .map_err(|error| AppError::Validation(format!("invalid {name}: {error}")))?,
        None => default,
    };
    if seconds == 0 {
        return Err(AppError::Validation(format!(
            "{name} must be greater than zero"
        )));
    }

    Ok(Duration::from_secs(seconds))
}
