use cnc_common::Money;

use crate::db::traits::DebitOutcome;
use crate::db_types::{Wallet, WalletTransaction};

/// Wallet ledger contract.
///
/// Wallets are created lazily on first use. Every call appends exactly one ledger row whose signed amount
/// mirrors the balance delta, so the signed sum of a wallet's ledger always equals its cached balance.
/// The sufficient-funds check and the balance mutation of a debit execute in one atomic unit.
#[allow(async_fn_in_trait)]
pub trait WalletManagement: Clone {
    type Error: std::error::Error;

    async fn credit_wallet(
        &self,
        user_id: i64,
        amount: Money,
        description: &str,
        source: &str,
        source_reference: Option<&str>,
    ) -> Result<WalletTransaction, Self::Error>;

    /// Overdraw is reported as [`DebitOutcome::InsufficientFunds`] and leaves the wallet untouched.
    async fn debit_wallet(
        &self,
        user_id: i64,
        amount: Money,
        description: &str,
        source: &str,
        source_reference: Option<&str>,
    ) -> Result<DebitOutcome, Self::Error>;

    async fn fetch_wallet(&self, user_id: i64) -> Result<Option<Wallet>, Self::Error>;

    /// Ledger entries, newest first.
    async fn wallet_history(&self, user_id: i64) -> Result<Vec<WalletTransaction>, Self::Error>;

    /// Whether a credit with this source reference was already issued to the user. Used to make refund
    /// retries safe.
    async fn credit_exists(&self, user_id: i64, source_reference: &str) -> Result<bool, Self::Error>;
}
