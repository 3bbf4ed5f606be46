use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use cnc_common::Money;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value for {0}: {1}")]
pub struct ConversionError(pub &'static str, pub String);

//--------------------------------------     GameType       ----------------------------------------------------------
/// The pickup-game format. It fixes the per-side headcount, and therefore the match capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    Fut5,
    Fut7,
}

impl GameType {
    pub fn players_per_side(&self) -> i64 {
        match self {
            GameType::Fut5 => 5,
            GameType::Fut7 => 7,
        }
    }

    /// Total capacity of a match of this format (two full sides).
    pub fn match_capacity(&self) -> i64 {
        2 * self.players_per_side()
    }
}

impl Display for GameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameType::Fut5 => write!(f, "Fut5"),
            GameType::Fut7 => write!(f, "Fut7"),
        }
    }
}

impl FromStr for GameType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fut5" => Ok(Self::Fut5),
            "fut7" => Ok(Self::Fut7),
            other => Err(ConversionError("game type", other.to_string())),
        }
    }
}

//--------------------------------------    MatchStatus     ----------------------------------------------------------
/// Lifecycle state of a [`DailyMatch`]. `Confirmed` and `Cancelled` are terminal; a match never returns
/// to `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    /// Accepting joins.
    Open,
    /// All seats filled and paid for.
    Confirmed,
    /// Cancelled by the lifecycle sweep or an admin.
    Cancelled,
}

impl Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Open => write!(f, "Open"),
            MatchStatus::Confirmed => write!(f, "Confirmed"),
            MatchStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for MatchStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(Self::Open),
            "Confirmed" => Ok(Self::Confirmed),
            "Cancelled" => Ok(Self::Cancelled),
            other => Err(ConversionError("match status", other.to_string())),
        }
    }
}

//--------------------------------------   OrderStatusType  ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// The order has been created and no approved payment has been seen yet.
    Pending,
    /// An approved payment was applied. Terminal apart from metadata enrichment.
    Completed,
    /// The gateway reported a terminal failure for the payment.
    Failed,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Completed => write!(f, "Completed"),
            OrderStatusType::Failed => write!(f, "Failed"),
        }
    }
}

//--------------------------------------    SeatPayment     ----------------------------------------------------------
/// How a seat in a match was funded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatPayment {
    /// Free join; no money changed hands.
    Free,
    /// Paid through the checkout gateway; `payment_id` references the gateway transaction.
    Completed,
    /// Funded by consuming one entry of a [`UserBono`].
    Bono,
}

//--------------------------------------      DailyMatch    ----------------------------------------------------------
/// One scheduled pickup-game instance at a field/date/time.
///
/// Invariants: `0 <= player_count <= max_players` at all times, and `max_players` equals the sum of the
/// two team capacities.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DailyMatch {
    pub id: i64,
    pub name: String,
    pub field_id: i64,
    pub game_type: GameType,
    pub schedule_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub price: Money,
    pub max_players: i64,
    pub player_count: i64,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DailyMatch {
    /// Kickoff instant, UTC.
    pub fn kickoff(&self) -> DateTime<Utc> {
        self.schedule_date.and_time(self.start_time).and_utc()
    }

    /// Final-whistle instant, UTC.
    pub fn full_time(&self) -> DateTime<Utc> {
        self.schedule_date.and_time(self.end_time).and_utc()
    }

    pub fn is_full(&self) -> bool {
        self.player_count >= self.max_players
    }
}

/// Input for creating one match slot. Capacity and teams are derived from `game_type`.
#[derive(Debug, Clone)]
pub struct NewMatch {
    pub name: String,
    pub field_id: i64,
    pub game_type: GameType,
    pub schedule_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub price: Money,
}

//--------------------------------------      MatchTeam     ----------------------------------------------------------
/// One of exactly two sides within a match. Invariant: `player_count <= max_players`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MatchTeam {
    pub id: i64,
    pub match_id: i64,
    pub name: String,
    pub color: String,
    pub emoji: String,
    pub player_count: i64,
    pub max_players: i64,
}

//--------------------------------------     MatchPlayer    ----------------------------------------------------------
/// A roster entry. A given `(match_id, player_id)` pair is unique: a player belongs to at most one team
/// per match.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MatchPlayer {
    pub id: i64,
    pub match_id: i64,
    pub player_id: i64,
    pub team_id: i64,
    pub position: Option<String>,
    pub payment_status: SeatPayment,
    pub payment_id: Option<String>,
    pub amount: Money,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------   PaymentPurpose   ----------------------------------------------------------
/// Business context carried by an order through the gateway round-trip, as a tagged union rather than a
/// loose key bag, so the apply side can pattern-match on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "purpose", rename_all = "snake_case")]
pub enum PaymentPurpose {
    MatchJoin {
        match_id: i64,
        team_id: i64,
        position: Option<String>,
    },
    BonoPurchase {
        bono_type: String,
        entries: i64,
        valid_days: i64,
    },
    WalletTopUp,
}

//--------------------------------------        Order       ----------------------------------------------------------
/// A payment intent correlated with an external gateway transaction. A given `payment_id` maps to at most
/// one completed business effect.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub total: Money,
    pub status: OrderStatusType,
    pub payment_id: Option<String>,
    pub purpose: Json<PaymentPurpose>,
    pub gateway_response: Option<Json<JsonValue>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: i64,
    pub total: Money,
    pub purpose: PaymentPurpose,
    /// Known up-front when the gateway assigns the payment id at preference-creation time.
    pub payment_id: Option<String>,
}

impl NewOrder {
    pub fn new(user_id: i64, total: Money, purpose: PaymentPurpose) -> Self {
        Self { user_id, total, purpose, payment_id: None }
    }

    pub fn with_payment_id(mut self, payment_id: impl Into<String>) -> Self {
        self.payment_id = Some(payment_id.into());
        self
    }
}

//--------------------------------------  PaymentConfirmation -------------------------------------------------------
/// The gateway's view of a payment, normalised from whichever notification or polling path delivered it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub payment_id: String,
    pub status: GatewayPaymentStatus,
    pub amount: Money,
    /// The raw gateway response, merged into the order for audit.
    pub raw: JsonValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayPaymentStatus {
    Approved,
    Pending,
    InProcess,
    Rejected,
    Refunded,
    Cancelled,
}

impl GatewayPaymentStatus {
    pub fn is_approved(&self) -> bool {
        matches!(self, GatewayPaymentStatus::Approved)
    }
}

impl Display for GatewayPaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GatewayPaymentStatus::Approved => "approved",
            GatewayPaymentStatus::Pending => "pending",
            GatewayPaymentStatus::InProcess => "in_process",
            GatewayPaymentStatus::Rejected => "rejected",
            GatewayPaymentStatus::Refunded => "refunded",
            GatewayPaymentStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

impl FromStr for GatewayPaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approved" => Ok(Self::Approved),
            "pending" => Ok(Self::Pending),
            "in_process" => Ok(Self::InProcess),
            "rejected" => Ok(Self::Rejected),
            "refunded" => Ok(Self::Refunded),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ConversionError("gateway payment status", other.to_string())),
        }
    }
}

//--------------------------------------       Wallet       ----------------------------------------------------------
/// Per-user balance, lazily created on first credit or debit. Invariant: `balance >= 0`, and the balance
/// equals the signed sum of the wallet's ledger entries.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Wallet {
    pub id: i64,
    pub user_id: i64,
    pub balance: Money,
    pub status: WalletStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletStatus {
    Active,
    Frozen,
}

//--------------------------------------  WalletTransaction ----------------------------------------------------------
/// Append-only ledger entry. Never mutated or deleted.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WalletTransaction {
    pub id: i64,
    pub wallet_id: i64,
    pub entry_type: LedgerEntryType,
    pub amount: Money,
    pub description: String,
    pub source: String,
    pub source_reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerEntryType {
    Credit,
    Debit,
}

impl WalletTransaction {
    /// The entry's contribution to the wallet balance.
    pub fn signed_amount(&self) -> Money {
        match self.entry_type {
            LedgerEntryType::Credit => self.amount,
            LedgerEntryType::Debit => -self.amount,
        }
    }
}

//--------------------------------------     MatchRating    ----------------------------------------------------------
/// One peer rating. Unique per `(match_id, rater_id, rated_id)` and immutable once created.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MatchRating {
    pub id: i64,
    pub match_id: i64,
    pub rater_id: i64,
    pub rated_id: i64,
    /// Derived overall score: `round((attitude + participation) / 2)`.
    pub rating: i64,
    pub attitude_rating: i64,
    pub participation_rating: i64,
    pub comment: Option<String>,
    pub mvp_vote: bool,
    pub created_at: DateTime<Utc>,
}

/// One entry of a rating batch, as submitted by a rater.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingEntry {
    pub rated_id: i64,
    pub attitude_rating: i64,
    pub participation_rating: i64,
    #[serde(default)]
    pub comment: Option<String>,
}

impl RatingEntry {
    pub fn is_valid(&self) -> bool {
        (1..=5).contains(&self.attitude_rating) && (1..=5).contains(&self.participation_rating)
    }

    /// Overall score derived from the two sub-ratings, rounded half-up.
    pub fn overall(&self) -> i64 {
        (self.attitude_rating + self.participation_rating + 1) / 2
    }
}

//--------------------------------------      UserStats     ----------------------------------------------------------
/// Rolling per-user aggregate, fully recomputed from the rating history whenever new ratings land for a
/// match the user played in.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserStats {
    pub user_id: i64,
    pub total_matches: i64,
    pub average_rating: f64,
    pub average_attitude: f64,
    pub average_participation: f64,
    pub mvp_count: i64,
}

impl UserStats {
    pub fn empty(user_id: i64) -> Self {
        Self {
            user_id,
            total_matches: 0,
            average_rating: 0.0,
            average_attitude: 0.0,
            average_participation: 0.0,
            mvp_count: 0,
        }
    }
}

//--------------------------------------  NotificationEvent ----------------------------------------------------------
/// A scheduled reminder for a match. Consumed by the reminder sweep; never re-sent once sent.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationEvent {
    pub id: i64,
    pub match_id: i64,
    pub event_type: String,
    pub scheduled_at: DateTime<Utc>,
    pub is_sent: bool,
}

pub const EVENT_MATCH_REMINDER: &str = "match_reminder";

//--------------------------------------      UserBono      ----------------------------------------------------------
/// A prepaid credit pack granting a fixed number of match entries until it expires.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserBono {
    pub id: i64,
    pub user_id: i64,
    pub bono_type: String,
    pub matches_remaining: i64,
    pub expires_at: DateTime<Utc>,
    pub payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserBono {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

//--------------------------------------    FieldBooking    ----------------------------------------------------------
/// A confirmed reservation of a field for one hour slot. Created alongside a match; cancelled with it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FieldBooking {
    pub id: i64,
    pub field_id: i64,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

//--------------------------------------        Field       ----------------------------------------------------------
/// A physical venue. Read-mostly; owned by the facility-management collaborator. The availability map is
/// keyed by lowercase weekday name and holds ordered `HH:MM` strings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Field {
    pub id: i64,
    pub name: String,
    pub price: Money,
    pub availability: Json<std::collections::HashMap<String, Vec<String>>>,
}
