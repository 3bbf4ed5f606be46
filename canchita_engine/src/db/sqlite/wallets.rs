use cnc_common::Money;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{LedgerEntryType, Wallet, WalletTransaction},
};

const WALLET_COLUMNS: &str = "id, user_id, balance, status, created_at, updated_at";
const TX_COLUMNS: &str = "id, wallet_id, entry_type, amount, description, source, source_reference, created_at";

pub async fn fetch_wallet(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<Wallet>, SqliteDatabaseError> {
    let q = format!("SELECT {WALLET_COLUMNS} FROM wallets WHERE user_id = $1");
    let wallet = sqlx::query_as::<_, Wallet>(&q).bind(user_id).fetch_optional(conn).await?;
    Ok(wallet)
}

/// Fetch the user's wallet, creating an empty one if this is their first ledger touch.
pub async fn fetch_or_create_wallet(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Wallet, SqliteDatabaseError> {
    if let Some(wallet) = fetch_wallet(user_id, &mut *conn).await? {
        return Ok(wallet);
    }
    let q = format!("INSERT INTO wallets (user_id) VALUES ($1) RETURNING {WALLET_COLUMNS}");
    let wallet = sqlx::query_as::<_, Wallet>(&q).bind(user_id).fetch_one(conn).await?;
    debug!("💳️ Created wallet #{} for user {user_id}", wallet.id);
    Ok(wallet)
}

async fn append_entry(
    wallet_id: i64,
    entry_type: LedgerEntryType,
    amount: Money,
    description: &str,
    source: &str,
    source_reference: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<WalletTransaction, SqliteDatabaseError> {
    let q = format!(
        "INSERT INTO wallet_transactions (wallet_id, entry_type, amount, description, source, source_reference) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {TX_COLUMNS}"
    );
    let tx = sqlx::query_as::<_, WalletTransaction>(&q)
        .bind(wallet_id)
        .bind(entry_type)
        .bind(amount)
        .bind(description)
        .bind(source)
        .bind(source_reference)
        .fetch_one(conn)
        .await?;
    Ok(tx)
}

/// Credit the wallet: one balance increment paired with exactly one ledger row. Must run inside the
/// caller's transaction.
pub async fn credit(
    user_id: i64,
    amount: Money,
    description: &str,
    source: &str,
    source_reference: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<WalletTransaction, SqliteDatabaseError> {
    let wallet = fetch_or_create_wallet(user_id, &mut *conn).await?;
    sqlx::query("UPDATE wallets SET balance = balance + $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(amount)
        .bind(wallet.id)
        .execute(&mut *conn)
        .await?;
    let tx = append_entry(wallet.id, LedgerEntryType::Credit, amount, description, source, source_reference, conn).await?;
    debug!("💳️ Credited {amount} to wallet #{} ({description})", wallet.id);
    Ok(tx)
}

/// Debit the wallet. The sufficient-funds check is the conditional update itself, so two concurrent
/// debits cannot both pass it and overdraw.
pub async fn debit(
    user_id: i64,
    amount: Money,
    description: &str,
    source: &str,
    source_reference: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<WalletTransaction, SqliteDatabaseError> {
    let wallet = fetch_or_create_wallet(user_id, &mut *conn).await?;
    let res = sqlx::query(
        "UPDATE wallets SET balance = balance - $1, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $2 AND balance >= $1",
    )
    .bind(amount)
    .bind(wallet.id)
    .execute(&mut *conn)
    .await?;
    if res.rows_affected() != 1 {
        return Err(SqliteDatabaseError::InsufficientFunds { user_id, requested: amount, available: wallet.balance });
    }
    let tx = append_entry(wallet.id, LedgerEntryType::Debit, amount, description, source, source_reference, conn).await?;
    debug!("💳️ Debited {amount} from wallet #{} ({description})", wallet.id);
    Ok(tx)
}

pub async fn history(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<WalletTransaction>, SqliteDatabaseError> {
    let q = format!(
        "SELECT t.id, t.wallet_id, t.entry_type, t.amount, t.description, t.source, t.source_reference, \
         t.created_at FROM wallet_transactions t JOIN wallets w ON w.id = t.wallet_id \
         WHERE w.user_id = $1 ORDER BY t.id DESC"
    );
    let entries = sqlx::query_as::<_, WalletTransaction>(&q).bind(user_id).fetch_all(conn).await?;
    Ok(entries)
}

pub async fn fetch_credit_by_reference(
    user_id: i64,
    source_reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<WalletTransaction>, SqliteDatabaseError> {
    let q = format!(
        "SELECT t.id, t.wallet_id, t.entry_type, t.amount, t.description, t.source, t.source_reference, \
         t.created_at FROM wallet_transactions t JOIN wallets w ON w.id = t.wallet_id \
         WHERE w.user_id = $1 AND t.entry_type = $2 AND t.source_reference = $3 LIMIT 1"
    );
    let entry = sqlx::query_as::<_, WalletTransaction>(&q)
        .bind(user_id)
        .bind(LedgerEntryType::Credit)
        .bind(source_reference)
        .fetch_optional(conn)
        .await?;
    Ok(entry)
}

/// The refund-already-issued guard: has this user already received a credit with this reference?
pub async fn credit_exists(
    user_id: i64,
    source_reference: &str,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let hit: Option<(i64,)> = sqlx::query_as(
        "SELECT t.id FROM wallet_transactions t JOIN wallets w ON w.id = t.wallet_id \
         WHERE w.user_id = $1 AND t.entry_type = $2 AND t.source_reference = $3 LIMIT 1",
    )
    .bind(user_id)
    .bind(LedgerEntryType::Credit)
    .bind(source_reference)
    .fetch_optional(conn)
    .await?;
    Ok(hit.is_some())
}
