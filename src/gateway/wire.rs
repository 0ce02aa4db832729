//! Decoding of backend payloads that need reshaping
//!
//! The head-to-head endpoint keys its fields by player name
//! (`"{name}_wins"`, `"{name}_score"`, ...). This module turns that payload
//! into the structured `HeadToHead` record.

use serde_json::{Map, Value};

use crate::models::{timestamp, HeadToHead, HeadToHeadMatch, PlayerSummary};
use crate::stats::ordered_pair;

use super::error::{GatewayError, GatewayResult};

/// Decode a head-to-head payload for players `a` and `b`
pub fn decode_head_to_head(payload: &Value, a: &str, b: &str) -> GatewayResult<HeadToHead> {
    let object = payload
        .as_object()
        .ok_or_else(|| GatewayError::Decode("head-to-head payload is not an object".to_string()))?;

    let (first, second) = ordered_pair(a, b);
    let total_matches = number(object, "total_matches") as u32;

    let mut match_history = object
        .get("match_history")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .map(|entry| decode_history_entry(entry, first, second))
                .collect::<GatewayResult<Vec<_>>>()
        })
        .transpose()?
        .unwrap_or_default();
    match_history.sort_by_key(|m| m.date);

    let summary = |name: &str| PlayerSummary {
        name: name.to_string(),
        wins: number(object, &format!("{}_wins", name)) as u32,
        win_rate: number(object, &format!("{}_win_rate", name)),
        average_score: number(object, &format!("{}_average_score", name)),
    };

    // The backend reports the difference from the first path argument's side
    let reported_difference = number(object, "average_score_difference");
    let average_score_difference = if a == first {
        reported_difference
    } else {
        -reported_difference
    };

    Ok(HeadToHead {
        total_matches,
        first: summary(first),
        second: summary(second),
        average_score_difference,
        match_history,
    })
}

fn decode_history_entry(entry: &Value, first: &str, second: &str) -> GatewayResult<HeadToHeadMatch> {
    let object = entry
        .as_object()
        .ok_or_else(|| GatewayError::Decode("match history entry is not an object".to_string()))?;

    let id = text(object, "id").ok_or_else(|| GatewayError::Decode("match history entry without id".to_string()))?;
    let raw_date = text(object, "date").unwrap_or_default();
    let date = timestamp::parse(&raw_date)
        .ok_or_else(|| GatewayError::Decode(format!("invalid match date: {}", raw_date)))?;

    Ok(HeadToHeadMatch {
        id,
        date,
        first_score: number(object, &format!("{}_score", first)) as i64,
        second_score: number(object, &format!("{}_score", second)) as i64,
        winner: text(object, "winner").unwrap_or_default(),
    })
}

fn number(object: &Map<String, Value>, field: &str) -> f64 {
    object.get(field).and_then(Value::as_f64).unwrap_or(0.0)
}

fn text(object: &Map<String, Value>, field: &str) -> Option<String> {
    object.get(field).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> Value {
        json!({
            "total_matches": 3,
            "zed_wins": 2,
            "amy_wins": 1,
            "zed_win_rate": 66.67,
            "amy_win_rate": 33.33,
            "average_score_difference": 4.0,
            "zed_average_score": 9.67,
            "amy_average_score": 5.67,
            "match_history": [
                {"id": "m3", "date": "2024-01-04T12:00:00", "amy_score": 9, "zed_score": 8, "winner": "amy"},
                {"id": "m1", "date": "2024-01-02T12:00:00", "zed_score": 10, "amy_score": 5, "winner": "zed"},
                {"id": "m2", "date": "2024-01-03T12:00:00Z", "zed_score": 11, "amy_score": 3, "winner": "zed"}
            ]
        })
    }

    #[test]
    fn test_decode_orders_players_and_history() {
        let h2h = decode_head_to_head(&payload(), "zed", "amy").unwrap();

        assert_eq!(h2h.total_matches, 3);
        assert_eq!(h2h.first.name, "amy");
        assert_eq!(h2h.first.wins, 1);
        assert_eq!(h2h.second.name, "zed");
        assert_eq!(h2h.second.wins, 2);
        assert_eq!(h2h.record_for("zed"), Some((2, 1)));
        // Reported from zed's side, stored from amy's
        assert_eq!(h2h.average_score_difference, -4.0);

        let ids: Vec<&str> = h2h.match_history.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
        assert_eq!(h2h.match_history[0].first_score, 5);
        assert_eq!(h2h.match_history[0].second_score, 10);
    }

    #[test]
    fn test_decode_empty_record() {
        let payload = json!({
            "total_matches": 0,
            "a_wins": 0,
            "b_wins": 0,
            "a_win_rate": 0.0,
            "b_win_rate": 0.0,
            "average_score_difference": 0.0,
            "match_history": []
        });

        let h2h = decode_head_to_head(&payload, "a", "b").unwrap();
        assert_eq!(h2h.total_matches, 0);
        assert_eq!(h2h.first.average_score, 0.0);
        assert!(h2h.match_history.is_empty());
    }

    #[test]
    fn test_decode_rejects_non_object() {
        assert!(matches!(
            decode_head_to_head(&json!([]), "a", "b"),
            Err(GatewayError::Decode(_))
        ));
    }
}
