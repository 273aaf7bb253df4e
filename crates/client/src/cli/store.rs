//! Store connection arguments.

use std::path::PathBuf;

use clap::Args;
use docpersist_core::options::{ConcurrencyMode, DocumentClientOptions};
use docpersist_storage::config;

use crate::error::Result;

/// Options that select and configure the document store.
///
/// Flags fall back to the environment variables `docpersist_storage::config`
/// reads. With `--settings`, the file provides the defaults and any flag
/// given overrides it.
#[derive(Debug, Default, Args)]
pub struct StoreArgs {
    /// JSON settings file with PascalCase keys.
    #[arg(long, env = "DOCPERSIST_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Store endpoint (SQLite path or DynamoDB endpoint URL).
    #[arg(long, env = "ACCOUNT_ENDPOINT")]
    pub account_endpoint: Option<String>,

    /// Store credentials.
    #[arg(long, env = "ACCOUNT_KEY", hide_env_values = true)]
    pub account_key: Option<String>,

    /// Database name.
    #[arg(long, env = "DATABASE_ID")]
    pub database_id: Option<String>,

    /// Container name.
    #[arg(long, env = "CONTAINER_ID")]
    pub container_id: Option<String>,

    /// Page size for queries (default: 50).
    #[arg(long, env = "ITEMS_PER_REQUEST")]
    pub items_per_request: Option<String>,

    /// `optimistic` or `last-writer-wins`.
    #[arg(long, env = "CONCURRENCY_MODE")]
    pub concurrency: Option<String>,
}

impl StoreArgs {
    /// Resolve the client options.
    pub fn to_options(&self) -> Result<DocumentClientOptions> {
        let Some(path) = &self.settings else {
            return Ok(config::from_lookup(|name| self.lookup(name))?);
        };

        let mut options = config::from_settings_file(path)?;
        if let Some(endpoint) = &self.account_endpoint {
            options.account_endpoint = endpoint.clone();
        }
        if let Some(key) = &self.account_key {
            options.account_key = key.clone();
        }
        if let Some(database_id) = &self.database_id {
            options.database_id = database_id.clone();
        }
        if let Some(container_id) = &self.container_id {
            options.container_id = container_id.clone();
        }
        if let Some(items_per_request) = &self.items_per_request {
            options.items_per_request = config::parse_items_per_request(Some(items_per_request));
        }
        if let Some(concurrency) = &self.concurrency {
            options.concurrency = concurrency.parse::<ConcurrencyMode>()?;
        }
        options.validate()?;

        Ok(options)
    }

    fn lookup(&self, name: &str) -> Option<String> {
        match name {
            "ACCOUNT_ENDPOINT" => self.account_endpoint.clone(),
            "ACCOUNT_KEY" => self.account_key.clone(),
            "DATABASE_ID" => self.database_id.clone(),
            "CONTAINER_ID" => self.container_id.clone(),
            "ITEMS_PER_REQUEST" => self.items_per_request.clone(),
            "CONCURRENCY_MODE" => self.concurrency.clone(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use docpersist_core::OptionsError;

    fn args() -> StoreArgs {
        StoreArgs {
            database_id: Some("samples".to_string()),
            container_id: Some("documents".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_options_from_flags() {
        let args = StoreArgs {
            items_per_request: Some("7".to_string()),
            concurrency: Some("LastWriterWins".to_string()),
            ..args()
        };

        let options = args.to_options().unwrap();

        assert_eq!(options.database_id, "samples");
        assert_eq!(options.items_per_request, 7);
        assert_eq!(options.concurrency, ConcurrencyMode::LastWriterWins);
    }

    #[test]
    fn test_missing_container() {
        let args = StoreArgs {
            container_id: None,
            ..args()
        };

        assert!(matches!(
            args.to_options(),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn test_settings_file_with_override() {
        let path = std::env::temp_dir().join(format!("docpersist-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"{ "DatabaseId": "samples", "ContainerId": "documents", "ItemsPerRequest": "10" }"#,
        )
        .unwrap();
        let args = StoreArgs {
            settings: Some(path.clone()),
            container_id: Some("others".to_string()),
            ..Default::default()
        };

        let options = args.to_options();
        std::fs::remove_file(&path).unwrap();
        let options = options.unwrap();

        assert_eq!(options.container_id, "others");
        assert_eq!(options.items_per_request, 10);
    }

    #[test]
    fn test_settings_override_is_validated() {
        let path = std::env::temp_dir().join(format!("docpersist-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"{ "DatabaseId": "samples", "ContainerId": "documents" }"#)
            .unwrap();
        let args = StoreArgs {
            settings: Some(path.clone()),
            container_id: Some("bad name".to_string()),
            ..Default::default()
        };

        let result = args.to_options();
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(
            result,
            Err(ClientError::Options(OptionsError::InvalidIdentifier { .. }))
        ));
    }
}
