use canchita_engine::{
    db_types::{
        DailyMatch,
        GameType,
        MatchPlayer,
        MatchStatus,
        NewMatch,
        NewOrder,
        Order,
        PaymentConfirmation,
        SeatPayment,
    },
    BatchSlotOutcome,
    JoinOutcome,
    LeaveOutcome,
    MatchManagement,
    PaymentOutcome,
    PaymentTracking,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use cnc_common::Money;
use mockall::mock;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("mock backend error")]
pub struct MockBackendError;

mock! {
    pub Backend {}

    impl Clone for Backend {
        fn clone(&self) -> Self;
    }

    impl MatchManagement for Backend {
        type Error = MockBackendError;

        async fn create_match_slot(&self, new_match: NewMatch) -> Result<BatchSlotOutcome, MockBackendError>;
        async fn fetch_match(&self, match_id: i64) -> Result<Option<DailyMatch>, MockBackendError>;
        async fn fetch_teams(&self, match_id: i64) -> Result<Vec<canchita_engine::db_types::MatchTeam>, MockBackendError>;
        async fn fetch_roster(&self, match_id: i64) -> Result<Vec<MatchPlayer>, MockBackendError>;
        async fn join_match(&self, match_id: i64, team_id: i64, user_id: i64) -> Result<JoinOutcome, MockBackendError>;
        async fn paid_join(&self, match_id: i64, team_id: i64, user_id: i64, payment_id: &str) -> Result<JoinOutcome, MockBackendError>;
        async fn bono_join(&self, match_id: i64, team_id: i64, user_id: i64, bono_id: i64, now: DateTime<Utc>) -> Result<JoinOutcome, MockBackendError>;
        async fn leave_match(&self, match_id: i64, user_id: i64) -> Result<LeaveOutcome, MockBackendError>;
        async fn roster_device_tokens(&self, match_id: i64, except_user: Option<i64>) -> Result<Vec<String>, MockBackendError>;
    }

    impl PaymentTracking for Backend {
        type Error = MockBackendError;

        async fn insert_order(&self, order: NewOrder) -> Result<Order, MockBackendError>;
        async fn attach_payment_id(&self, order_id: i64, payment_id: &str) -> Result<(), MockBackendError>;
        async fn fetch_order_by_payment_id(&self, payment_id: &str) -> Result<Option<Order>, MockBackendError>;
        async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, MockBackendError>;
        async fn apply_payment(&self, confirmation: &PaymentConfirmation) -> Result<PaymentOutcome, MockBackendError>;
    }
}

pub fn sample_match(id: i64) -> DailyMatch {
    DailyMatch {
        id,
        name: "Fut5 nocturno".to_string(),
        field_id: 1,
        game_type: GameType::Fut5,
        schedule_date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
        start_time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
        price: Money::from_units(50),
        max_players: 10,
        player_count: 3,
        status: MatchStatus::Open,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn sample_seat(match_id: i64, team_id: i64, player_id: i64) -> MatchPlayer {
    MatchPlayer {
        id: 77,
        match_id,
        player_id,
        team_id,
        position: None,
        payment_status: SeatPayment::Free,
        payment_id: None,
        amount: Money::from(0),
        created_at: Utc::now(),
    }
}
