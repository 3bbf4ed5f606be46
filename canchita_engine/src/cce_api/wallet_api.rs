use std::fmt::Debug;

use cnc_common::Money;
use log::*;

use crate::{
    cce_api::errors::WalletApiError,
    db::traits::{DebitOutcome, WalletManagement},
    db_types::{Wallet, WalletTransaction},
};

/// `WalletApi` fronts the per-user ledger. Every credit or debit moves the balance and appends exactly
/// one ledger row in the same transaction, so the signed ledger sum always reconciles with the balance.
pub struct WalletApi<B> {
    db: B,
}

impl<B> Debug for WalletApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WalletApi")
    }
}

impl<B> WalletApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> WalletApi<B>
where B: WalletManagement
{
    pub async fn credit(
        &self,
        user_id: i64,
        amount: Money,
        description: &str,
        source: &str,
        source_reference: Option<&str>,
    ) -> Result<WalletTransaction, WalletApiError> {
        if amount.value() <= 0 {
            return Err(WalletApiError::NonPositiveAmount(amount.value()));
        }
        let entry = self
            .db
            .credit_wallet(user_id, amount, description, source, source_reference)
            .await
            .map_err(|e| WalletApiError::DatabaseError(e.to_string()))?;
        debug!("💰️ Credited {amount} to user {user_id} ({source})");
        Ok(entry)
    }

    pub async fn debit(
        &self,
        user_id: i64,
        amount: Money,
        description: &str,
        source: &str,
        source_reference: Option<&str>,
    ) -> Result<DebitOutcome, WalletApiError> {
        if amount.value() <= 0 {
            return Err(WalletApiError::NonPositiveAmount(amount.value()));
        }
        let outcome = self
            .db
            .debit_wallet(user_id, amount, description, source, source_reference)
            .await
            .map_err(|e| WalletApiError::DatabaseError(e.to_string()))?;
        match &outcome {
            DebitOutcome::Debited(_) => debug!("💰️ Debited {amount} from user {user_id} ({source})"),
            DebitOutcome::InsufficientFunds { requested, available } => {
                debug!("💰️ Debit of {requested} refused for user {user_id}; only {available} available");
            },
        }
        Ok(outcome)
    }

    pub async fn wallet(&self, user_id: i64) -> Result<Option<Wallet>, WalletApiError> {
        self.db.fetch_wallet(user_id).await.map_err(|e| WalletApiError::DatabaseError(e.to_string()))
    }

    /// The user's balance; zero if no wallet exists yet.
    pub async fn balance(&self, user_id: i64) -> Result<Money, WalletApiError> {
        let wallet = self.wallet(user_id).await?;
        Ok(wallet.map(|w| w.balance).unwrap_or_else(|| Money::from(0)))
    }

    pub async fn history(&self, user_id: i64) -> Result<Vec<WalletTransaction>, WalletApiError> {
        self.db.wallet_history(user_id).await.map_err(|e| WalletApiError::DatabaseError(e.to_string()))
    }
}
