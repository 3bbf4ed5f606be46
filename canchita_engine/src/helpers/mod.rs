//! Scheduling helpers shared by the match-creation flow and the lifecycle sweeps.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use rand::{seq::SliceRandom, Rng};

use crate::db_types::ConversionError;

/// Which week a batch-creation request targets, anchored on that week's Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetWeek {
    Current,
    Next,
}

impl std::str::FromStr for TargetWeek {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "current" => Ok(Self::Current),
            "next" => Ok(Self::Next),
            other => Err(ConversionError("target week", other.to_string())),
        }
    }
}

/// The Monday of the week containing `today`, or of the following week.
pub fn monday_of(week: TargetWeek, today: NaiveDate) -> NaiveDate {
    let back = today.weekday().num_days_from_monday() as i64;
    let monday = today - Duration::days(back);
    match week {
        TargetWeek::Current => monday,
        TargetWeek::Next => monday + Duration::days(7),
    }
}

/// The concrete date for a weekday within the week starting at `monday`.
pub fn date_for_weekday(monday: NaiveDate, weekday: Weekday) -> NaiveDate {
    monday + Duration::days(weekday.num_days_from_monday() as i64)
}

/// Parse an `HH:MM` slot string.
pub fn parse_slot_time(s: &str) -> Result<NaiveTime, ConversionError> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| ConversionError("slot time", s.to_string()))
}

/// Matches occupy one-hour slots.
pub fn slot_end(start: NaiveTime) -> NaiveTime {
    start + Duration::hours(1)
}

/// The fixed team identity palette. Pairs are sampled without replacement, so the two sides of a match
/// never share a color or emoji.
pub const TEAM_PALETTE: [(&str, &str, &str); 6] = [
    ("Rojo", "#E53935", "🔴"),
    ("Azul", "#1E88E5", "🔵"),
    ("Verde", "#43A047", "🟢"),
    ("Amarillo", "#FDD835", "🟡"),
    ("Naranja", "#FB8C00", "🟠"),
    ("Morado", "#8E24AA", "🟣"),
];

/// Draw the two team identities for a new match.
pub fn draw_team_pair<R: Rng + ?Sized>(rng: &mut R) -> [(&'static str, &'static str, &'static str); 2] {
    let mut picks = TEAM_PALETTE;
    picks.shuffle(rng);
    [picks[0], picks[1]]
}

#[cfg(test)]
mod test {
    use chrono::Weekday;

    use super::*;

    #[test]
    fn monday_anchoring() {
        // 2024-06-05 is a Wednesday
        let today = NaiveDate::from_ymd_opt(2024, 6, 5).unwrap();
        assert_eq!(monday_of(TargetWeek::Current, today), NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        assert_eq!(monday_of(TargetWeek::Next, today), NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
        // A Monday anchors to itself
        let monday = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        assert_eq!(monday_of(TargetWeek::Current, monday), monday);
    }

    #[test]
    fn weekday_dates() {
        let monday = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        assert_eq!(date_for_weekday(monday, Weekday::Mon), monday);
        assert_eq!(date_for_weekday(monday, Weekday::Sun), NaiveDate::from_ymd_opt(2024, 6, 9).unwrap());
    }

    #[test]
    fn slot_times() {
        let t = parse_slot_time("18:00").unwrap();
        assert_eq!(slot_end(t), parse_slot_time("19:00").unwrap());
        assert!(parse_slot_time("25:99").is_err());
        assert!(parse_slot_time("6pm").is_err());
    }

    #[test]
    fn team_pair_is_distinct() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let [a, b] = draw_team_pair(&mut rng);
            assert_ne!(a.0, b.0);
            assert_ne!(a.2, b.2);
        }
    }
}
