pub mod surreal;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::base::types::{Account, DebitOutcome, Res, TransferOutcome};

// Traits.

/// Generic database client trait that storage backends must implement.
///
/// This trait defines the single-statement primitives over the account table.
/// The ledger operations on [`DbClient`] are composed from these, so every
/// backend shares the same balance rules.
#[async_trait]
pub trait GenericDbClient: Send + Sync + 'static {
    /// Gets the account from the database by its user ID; or, creates a new account with a zero balance if it doesn't exist.
    async fn get_or_create_account(&self, user_id: &str) -> Res<Account>;

    /// Adds `amount` (which may be negative) to the stored balance in one statement, refreshing `updated_at`.
    ///
    /// The account must already exist.
    async fn increment_balance(&self, user_id: &str, amount: i64) -> Res<Account>;

    /// Overwrites the stored balance in one statement, refreshing `updated_at`.
    ///
    /// The account must already exist.
    async fn overwrite_balance(&self, user_id: &str, amount: i64) -> Res<Account>;
}

// Structs.

/// Database client for ledger-bot.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct DbClient {
    /// The database client instance.
    inner: Arc<dyn GenericDbClient>,
}

impl Deref for DbClient {
    type Target = dyn GenericDbClient;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl DbClient {
    pub fn new(inner: Arc<dyn GenericDbClient>) -> Self {
        Self { inner }
    }

    /// Returns the balance for the user, creating the account at zero if it doesn't exist.
    #[instrument(skip(self))]
    pub async fn get_balance(&self, user_id: &str) -> Res<i64> {
        Ok(self.get_or_create_account(user_id).await?.balance)
    }

    /// Adds `amount` to the user's balance and returns the new balance.
    ///
    /// There is no bound check: a negative `amount` can drive the balance below zero.
    #[instrument(skip(self))]
    pub async fn add_balance(&self, user_id: &str, amount: i64) -> Res<i64> {
        // Ensure the account exists.
        self.get_balance(user_id).await?;

        Ok(self.increment_balance(user_id, amount).await?.balance)
    }

    /// Subtracts `amount` from the user's balance, unless the balance is smaller than `amount`.
    ///
    /// The check and the write are separate round-trips.
    #[instrument(skip(self))]
    pub async fn subtract_balance(&self, user_id: &str, amount: i64) -> Res<DebitOutcome> {
        let current = self.get_balance(user_id).await?;

        if current < amount {
            info!("Insufficient funds for `{}`: has {}, needs {}.", user_id, current, amount);
            return Ok(DebitOutcome::InsufficientFunds { balance: current, requested: amount });
        }

        let negated = amount.checked_neg().ok_or_else(|| anyhow::anyhow!("Debit amount {} cannot be negated.", amount))?;
        let balance = self.add_balance(user_id, negated).await?;

        Ok(DebitOutcome::Applied { balance })
    }

    /// Overwrites the user's balance with `amount`, which may be negative, and returns it.
    #[instrument(skip(self))]
    pub async fn set_balance(&self, user_id: &str, amount: i64) -> Res<i64> {
        // Ensure the account exists.
        self.get_balance(user_id).await?;

        self.overwrite_balance(user_id, amount).await?;

        Ok(amount)
    }

    /// Moves `amount` from one user to another.
    ///
    /// The debit and the credit are two independent writes with no enclosing transaction:
    /// a failure between them leaves the sender debited and the receiver not yet credited.
    #[instrument(skip(self))]
    pub async fn transfer_balance(&self, from_user_id: &str, to_user_id: &str, amount: i64) -> Res<TransferOutcome> {
        let from_balance = match self.subtract_balance(from_user_id, amount).await? {
            DebitOutcome::Applied { balance } => balance,
            DebitOutcome::InsufficientFunds { balance, requested } => return Ok(TransferOutcome::InsufficientFunds { balance, requested }),
        };

        let to_balance = self.add_balance(to_user_id, amount).await?;

        info!("Transferred {} from `{}` to `{}`.", amount, from_user_id, to_user_id);

        Ok(TransferOutcome::Completed { from_balance, to_balance })
    }
}

// Tests.
