//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, sync::Arc};

use serde::Deserialize;

use super::types::Res;

/// Default store location: an embedded SurrealKV file in the working directory.
fn default_db_endpoint() -> String {
    "surrealkv://ledger.db".to_string()
}

/// Configuration for the ledger-bot application.
#[derive(Debug, Clone)]
pub struct Config {
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConfigInner {
    /// Slack app token, used for the socket mode connection (`LEDGER_BOT_SLACK_APP_TOKEN`).
    pub slack_app_token: String,
    /// Slack bot token (`LEDGER_BOT_SLACK_BOT_TOKEN`).
    pub slack_bot_token: String,
    /// Store location (`LEDGER_BOT_DB_ENDPOINT`).
    ///
    /// The scheme selects the engine: `mem://`, `surrealkv://<path>`, `ws://<host>` or `wss://<host>`.
    #[serde(default = "default_db_endpoint")]
    pub db_endpoint: String,
    /// Database username, for remote stores only (`LEDGER_BOT_DB_USERNAME`).
    #[serde(default)]
    pub db_username: Option<String>,
    /// Database password, for remote stores only (`LEDGER_BOT_DB_PASSWORD`).
    #[serde(default)]
    pub db_password: Option<String>,
}

impl Config {
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("LEDGER_BOT"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    fn validate(&self) -> Res<()> {
        if self.slack_app_token.trim().is_empty() {
            return Err(anyhow::anyhow!("Slack app token must not be empty."));
        }

        if self.slack_bot_token.trim().is_empty() {
            return Err(anyhow::anyhow!("Slack bot token must not be empty."));
        }

        if self.db_endpoint.trim().is_empty() {
            return Err(anyhow::anyhow!("Database endpoint must not be empty."));
        }

        if self.db_username.is_some() != self.db_password.is_some() {
            return Err(anyhow::anyhow!("Database username and password must be set together."));
        }

        Ok(())
    }
}
