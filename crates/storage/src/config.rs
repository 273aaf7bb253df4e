//! Client configuration loading.
//!
//! Options come either from environment variables or from a flat JSON
//! settings file with PascalCase keys:
//!
//! ```json
//! {
//!   "AccountEndpoint": "docpersist.db",
//!   "AccountKey": "",
//!   "DatabaseId": "samples",
//!   "ContainerId": "documents",
//!   "ItemsPerRequest": "50"
//! }
//! ```

use std::{env, fs, path::Path};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use docpersist_core::options::{
    ConcurrencyMode, DocumentClientOptions, OptionsError, DEFAULT_ITEMS_PER_REQUEST,
};

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse settings file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Options(#[from] OptionsError),
}

/// Settings file contents. Missing keys fall back to defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Settings {
    #[serde(default)]
    account_endpoint: Option<String>,
    #[serde(default)]
    account_key: Option<String>,
    #[serde(default)]
    database_id: Option<String>,
    #[serde(default)]
    container_id: Option<String>,
    #[serde(default)]
    items_per_request: Option<Value>,
    #[serde(default)]
    concurrency_mode: Option<String>,
}

impl Settings {
    fn into_options(self) -> Result<DocumentClientOptions, ConfigError> {
        let items_per_request = match self.items_per_request {
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(DEFAULT_ITEMS_PER_REQUEST),
            Some(Value::String(s)) => parse_items_per_request(Some(&s)),
            _ => DEFAULT_ITEMS_PER_REQUEST,
        };

        build_options(
            self.account_endpoint,
            self.account_key,
            self.database_id,
            self.container_id,
            items_per_request,
            self.concurrency_mode,
        )
    }
}

/// Parse `ItemsPerRequest`, falling back to the default when it is absent or
/// not a number.
pub fn parse_items_per_request(value: Option<&str>) -> usize {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_ITEMS_PER_REQUEST)
}

/// Load options from environment variables.
///
/// Environment variables:
/// - `ACCOUNT_ENDPOINT` - Backend endpoint or database path (default: "")
/// - `ACCOUNT_KEY` - Backend credentials (default: "")
/// - `DATABASE_ID` - Database name (required)
/// - `CONTAINER_ID` - Container name (required)
/// - `ITEMS_PER_REQUEST` - Page size for enumeration (default: 50)
/// - `CONCURRENCY_MODE` - `optimistic` or `last-writer-wins` (default: optimistic)
pub fn from_env() -> Result<DocumentClientOptions, ConfigError> {
    from_lookup(|name| env::var(name).ok())
}

/// Load options through a variable lookup function.
pub fn from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<DocumentClientOptions, ConfigError> {
    build_options(
        lookup("ACCOUNT_ENDPOINT"),
        lookup("ACCOUNT_KEY"),
        lookup("DATABASE_ID"),
        lookup("CONTAINER_ID"),
        parse_items_per_request(lookup("ITEMS_PER_REQUEST").as_deref()),
        lookup("CONCURRENCY_MODE"),
    )
}

/// Load options from a JSON settings file.
pub fn from_settings_file(path: impl AsRef<Path>) -> Result<DocumentClientOptions, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    from_settings_str(&contents).map_err(|err| match err {
        ConfigError::Parse { source, .. } => ConfigError::Parse {
            path: path.display().to_string(),
            source,
        },
        other => other,
    })
}

/// Load options from JSON settings text.
pub fn from_settings_str(contents: &str) -> Result<DocumentClientOptions, ConfigError> {
    let settings: Settings =
        serde_json::from_str(contents).map_err(|source| ConfigError::Parse {
            path: "<inline>".to_string(),
            source,
        })?;
    settings.into_options()
}

fn build_options(
    account_endpoint: Option<String>,
    account_key: Option<String>,
    database_id: Option<String>,
    container_id: Option<String>,
    items_per_request: usize,
    concurrency_mode: Option<String>,
) -> Result<DocumentClientOptions, ConfigError> {
    let database_id = database_id
        .filter(|v| !v.is_empty())
        .ok_or(OptionsError::Missing("DatabaseId"))?;
    let container_id = container_id
        .filter(|v| !v.is_empty())
        .ok_or(OptionsError::Missing("ContainerId"))?;
    let concurrency = match concurrency_mode.filter(|v| !v.trim().is_empty()) {
        Some(mode) => mode.parse::<ConcurrencyMode>()?,
        None => ConcurrencyMode::default(),
    };

    let options = DocumentClientOptions::new(database_id, container_id)
        .with_endpoint(account_endpoint.unwrap_or_default())
        .with_key(account_key.unwrap_or_default())
        .with_items_per_request(items_per_request)
        .with_concurrency(concurrency);
    options.validate()?;

    Ok(options)
}
