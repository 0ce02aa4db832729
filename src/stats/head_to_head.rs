//! Head-to-head aggregation
//!
//! Restricts the match list to games between exactly two players and
//! summarizes them as a structured pair record.

use crate::models::{HeadToHead, HeadToHeadMatch, Match, PlayerSummary};

use super::player::{chronological, percentage};

/// Order a pair of names so the same pair always maps to the same record
pub fn ordered_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Build the head-to-head record for `a` and `b`
///
/// Argument order does not matter: `first` is always the
/// lexicographically smaller name.
pub fn head_to_head(matches: &[Match], a: &str, b: &str) -> HeadToHead {
    let (first, second) = ordered_pair(a, b);
    let history = chronological(matches.iter().filter(|m| m.is_between(first, second)));

    let mut first_wins = 0u32;
    let mut second_wins = 0u32;
    let mut first_total = 0i64;
    let mut second_total = 0i64;
    let mut match_history = Vec::with_capacity(history.len());

    for m in &history {
        let first_score = m.score_of(first).unwrap_or(0);
        let second_score = m.score_of(second).unwrap_or(0);

        if m.is_won_by(first) {
            first_wins += 1;
        } else if m.is_won_by(second) {
            second_wins += 1;
        }
        first_total += first_score;
        second_total += second_score;

        match_history.push(HeadToHeadMatch {
            id: m.id.clone(),
            date: m.created_at,
            first_score,
            second_score,
            winner: m.winner.clone(),
        });
    }

    let total = history.len() as u32;
    let mean = |sum: i64| {
        if total == 0 {
            0.0
        } else {
            sum as f64 / total as f64
        }
    };

    HeadToHead {
        total_matches: total,
        first: PlayerSummary {
            name: first.to_string(),
            wins: first_wins,
            win_rate: percentage(first_wins, total),
            average_score: mean(first_total),
        },
        second: PlayerSummary {
            name: second.to_string(),
            wins: second_wins,
            win_rate: percentage(second_wins, total),
            average_score: mean(second_total),
        },
        average_score_difference: mean(first_total - second_total),
        match_history,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::test_support::game;

    fn scenario() -> Vec<Match> {
        vec![
            game("m3", "B", 9, "A", 8, 3),
            game("m1", "A", 10, "B", 5, 1),
            game("m2", "A", 11, "B", 3, 2),
            game("m4", "A", 4, "C", 2, 4),
        ]
    }

    #[test]
    fn test_scenario_record() {
        let h2h = head_to_head(&scenario(), "A", "B");

        assert_eq!(h2h.total_matches, 3);
        assert_eq!(h2h.record_for("A"), Some((2, 1)));
        assert_eq!(h2h.record_for("B"), Some((1, 2)));
        assert!((h2h.first.average_score - 29.0 / 3.0).abs() < 1e-9);
        assert!((h2h.second.average_score - 17.0 / 3.0).abs() < 1e-9);
        assert!((h2h.average_score_difference - 4.0).abs() < 1e-9);

        let ids: Vec<&str> = h2h.match_history.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
        assert_eq!(h2h.match_history[2].first_score, 8);
        assert_eq!(h2h.match_history[2].second_score, 9);
    }

    #[test]
    fn test_argument_order_is_irrelevant() {
        let matches = scenario();
        assert_eq!(
            head_to_head(&matches, "A", "B"),
            head_to_head(&matches, "B", "A")
        );
    }

    #[test]
    fn test_symmetry_with_opponent_records() {
        let matches = scenario();
        let a = crate::stats::opponent_records(&matches, "A");
        let b = crate::stats::opponent_records(&matches, "B");

        let a_vs_b = a.iter().find(|r| r.opponent == "B").unwrap();
        let b_vs_a = b.iter().find(|r| r.opponent == "A").unwrap();
        assert_eq!(a_vs_b.wins, b_vs_a.losses);
        assert_eq!(a_vs_b.losses, b_vs_a.wins);
    }

    #[test]
    fn test_no_shared_matches() {
        let h2h = head_to_head(&scenario(), "B", "C");
        assert_eq!(h2h.total_matches, 0);
        assert_eq!(h2h.first.win_rate, 0.0);
        assert_eq!(h2h.average_score_difference, 0.0);
        assert!(h2h.match_history.is_empty());
    }
}
