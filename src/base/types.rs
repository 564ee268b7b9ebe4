use serde::{Deserialize, Serialize};

pub type Err = anyhow::Error;
pub type Res<T> = Result<T, Err>;
pub type Void = Res<()>;

/// A single ledger account, keyed by the chat user ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub user_id: String,
    pub balance: i64,
    /// Seconds since the Unix epoch.
    pub created_at: i64,
    /// Seconds since the Unix epoch; refreshed on every balance write.
    pub updated_at: i64,
}

/// The result of a guarded debit.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitOutcome {
    /// The debit was written; `balance` is the resulting balance.
    Applied { balance: i64 },
    /// The account held less than `requested`, so nothing was written.
    InsufficientFunds { balance: i64, requested: i64 },
}

impl DebitOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// The balance after the operation, which is unchanged when funds were short.
    pub fn balance(&self) -> i64 {
        match self {
            Self::Applied { balance } | Self::InsufficientFunds { balance, .. } => *balance,
        }
    }
}

/// The result of a transfer between two accounts.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    Completed { from_balance: i64, to_balance: i64 },
    /// The sender held less than `requested`; neither account was touched.
    InsufficientFunds { balance: i64, requested: i64 },
}

impl TransferOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}
