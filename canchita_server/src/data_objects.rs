use std::{fmt::Display, str::FromStr};

use canchita_engine::{
    db_types::{GameType, PaymentPurpose, RatingEntry},
    helpers::TargetWeek,
    BatchReport,
    MatchBatchTemplate,
    SkippedSlot,
};
use chrono::Weekday;
use cnc_common::Money;
use serde::{Deserialize, Serialize};

use crate::errors::ServerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// Wire form of a batch-creation request. Week, weekday and game-type names arrive as strings and are
/// validated into the engine's template before any slot is touched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchBatchRequest {
    pub name: String,
    pub field_id: i64,
    pub game_type: String,
    pub week: String,
    pub days: Vec<String>,
    pub slots: Vec<String>,
    pub price: Money,
}

impl MatchBatchRequest {
    pub fn into_template(self) -> Result<MatchBatchTemplate, ServerError> {
        let game_type = GameType::from_str(&self.game_type)
            .map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?;
        let week =
            TargetWeek::from_str(&self.week).map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?;
        let days = self
            .days
            .iter()
            .map(|d| Weekday::from_str(d).map_err(|_| ServerError::InvalidRequestBody(format!("Invalid weekday: {d}"))))
            .collect::<Result<Vec<Weekday>, ServerError>>()?;
        Ok(MatchBatchTemplate {
            name: self.name,
            field_id: self.field_id,
            game_type,
            week,
            days,
            slots: self.slots,
            price: self.price,
        })
    }
}

/// Batch result in wire form. `BatchReport` itself carries fixed-size team arrays that do not serialize.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResponse {
    pub created: Vec<serde_json::Value>,
    pub skipped_count: usize,
    pub skipped: Vec<SkippedSlot>,
}

impl From<BatchReport> for BatchResponse {
    fn from(report: BatchReport) -> Self {
        let created = report
            .created
            .into_iter()
            .map(|c| {
                serde_json::json!({
                    "game": c.game,
                    "teams": c.teams.to_vec(),
                })
            })
            .collect();
        Self { created, skipped_count: report.skipped.len(), skipped: report.skipped }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    pub team_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaidJoinRequest {
    pub team_id: i64,
    pub user_id: i64,
    pub payment_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BonoJoinRequest {
    pub team_id: i64,
    pub user_id: i64,
    pub bono_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub user_id: i64,
}

/// An order creation request. The purpose carries everything needed to apply the payment later, so
/// nothing about the request has to be re-derived when the gateway notification arrives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub user_id: i64,
    pub total: Money,
    #[serde(flatten)]
    pub purpose: PaymentPurpose,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResponse {
    pub order_id: i64,
    pub preference_id: String,
    /// The URL the client opens to complete the payment.
    pub init_point: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingSubmission {
    pub rater_id: i64,
    pub entries: Vec<RatingEntry>,
    pub mvp_vote: i64,
}

#[cfg(test)]
mod tests {
    use canchita_engine::db_types::RatingEntry;

    use super::RatingSubmission;

    #[test]
    fn rating_submissions_serialize_both_ways() {
        let submission = RatingSubmission {
            rater_id: 7,
            entries: vec![RatingEntry {
                rated_id: 9,
                attitude_rating: 4,
                participation_rating: 5,
                comment: Some("Gran arquero".to_string()),
            }],
            mvp_vote: 9,
        };
        let json = serde_json::to_string(&submission).unwrap();
        let back: RatingSubmission = serde_json::from_str(&json).unwrap();
        assert_eq!(back.rater_id, 7);
        assert_eq!(back.entries.len(), 1);
        assert_eq!(back.entries[0].rated_id, 9);
        assert_eq!(back.mvp_vote, 9);
    }
}
