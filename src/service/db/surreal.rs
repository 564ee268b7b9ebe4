//! SurrealDB implementation for ledger-bot data storage.

use std::sync::Arc;

use async_trait::async_trait;
use surrealdb::{
    Surreal,
    engine::any::{self, Any},
    opt::auth::Root,
};
use tracing::{debug, info, instrument};

use crate::base::{
    config::Config,
    types::{Account, Res},
};

use super::{DbClient, GenericDbClient};

// Extra methods on `DbClient` applied by the surreal implementation.

impl DbClient {
    /// Opens the store at the configured endpoint.
    pub async fn surreal(config: &Config) -> Res<Self> {
        let credentials = config.db_username.as_deref().zip(config.db_password.as_deref());
        let client = SurrealDbClient::new(&config.db_endpoint, credentials).await?;

        Ok(Self { inner: Arc::new(client) })
    }

    /// Opens a fresh in-memory store.
    pub async fn surreal_memory() -> Res<Self> {
        let client = SurrealDbClient::new("mem://", None).await?;

        Ok(Self { inner: Arc::new(client) })
    }
}

// Structs.

/// SurrealDB client implementation.
#[derive(Clone)]
struct SurrealDbClient {
    db: Surreal<Any>,
}

impl SurrealDbClient {
    #[instrument(name = "SurrealDbClient::new", skip(credentials))]
    async fn new(endpoint: &str, credentials: Option<(&str, &str)>) -> Res<Self> {
        let db = any::connect(endpoint).await?;

        if let Some((username, password)) = credentials {
            db.signin(Root { username, password }).await?;
        }

        db.use_ns("ledger").use_db("bot").await?;

        // Define schemas.

        db.query(
            "
            DEFINE TABLE IF NOT EXISTS account SCHEMAFULL;
            DEFINE FIELD IF NOT EXISTS user_id ON account TYPE string;
            DEFINE FIELD IF NOT EXISTS balance ON account TYPE int DEFAULT 0;
            DEFINE FIELD IF NOT EXISTS created_at ON account TYPE int;
            DEFINE FIELD IF NOT EXISTS updated_at ON account TYPE int;
            DEFINE INDEX IF NOT EXISTS account_user_id ON account FIELDS user_id UNIQUE;
            ",
        )
        .await?
        .check()?;

        info!("Database initialized successfully.");

        Ok(Self { db })
    }

    /// Runs a single-statement balance update against an existing account.
    async fn update_balance(&self, query: &'static str, user_id: &str, amount: i64) -> Res<Account> {
        let mut response = self
            .db
            .query(query)
            .bind(("user_id", user_id.to_string()))
            .bind(("amount", amount))
            .bind(("now", now()))
            .await?
            .check()?;

        let account: Option<Account> = response.take(0)?;

        account.ok_or_else(|| anyhow::anyhow!("Account `{}` does not exist.", user_id))
    }
}

#[async_trait]
impl GenericDbClient for SurrealDbClient {
    #[instrument(skip(self))]
    async fn get_or_create_account(&self, user_id: &str) -> Res<Account> {
        let account: Option<Account> = self.db.select(("account", user_id)).await?;

        if let Some(account) = account {
            debug!("Account `{}` found.", user_id);

            return Ok(account);
        }

        info!("Account `{}` not found, creating a new one.", user_id);

        let now = now();
        let new_account = Account {
            user_id: user_id.to_string(),
            balance: 0,
            created_at: now,
            updated_at: now,
        };

        let account: Option<Account> = self.db.create(("account", user_id)).content(new_account).await?;

        account.ok_or_else(|| anyhow::anyhow!("Failed to create account `{}`.", user_id))
    }

    #[instrument(skip(self))]
    async fn increment_balance(&self, user_id: &str, amount: i64) -> Res<Account> {
        self.update_balance(
            "UPDATE type::thing('account', $user_id) SET balance += $amount, updated_at = math::max([updated_at, $now]) RETURN AFTER",
            user_id,
            amount,
        )
        .await
    }

    #[instrument(skip(self))]
    async fn overwrite_balance(&self, user_id: &str, amount: i64) -> Res<Account> {
        self.update_balance(
            "UPDATE type::thing('account', $user_id) SET balance = $amount, updated_at = math::max([updated_at, $now]) RETURN AFTER",
            user_id,
            amount,
        )
        .await
    }
}

/// Current time in seconds since the Unix epoch.
fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
