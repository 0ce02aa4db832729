//! League-wide aggregation: rankings and summary figures

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{LeagueSummary, Match, PlayerStats};

use super::player::{chronological, fold_history};

/// Stats for every player in the league, best first
///
/// Players come from the match list plus `registered`, so players without
/// a match yet are listed with all-zero stats.
pub fn rankings(matches: &[Match], registered: &[String]) -> Vec<PlayerStats> {
    let history = chronological(matches.iter());

    let mut per_player: BTreeMap<&str, Vec<&Match>> = BTreeMap::new();
    for m in &history {
        per_player.entry(m.player1.as_str()).or_default().push(m);
        per_player.entry(m.player2.as_str()).or_default().push(m);
    }
    for name in registered {
        per_player.entry(name.as_str()).or_default();
    }

    let mut ranked: Vec<PlayerStats> = per_player
        .into_iter()
        .map(|(name, games)| fold_history(name, &games))
        .collect();
    ranked.sort_by(rank_order);
    ranked
}

/// Win rate, then wins, then average score, then highest score, all
/// descending; ties broken by name
pub fn rank_order(a: &PlayerStats, b: &PlayerStats) -> Ordering {
    b.win_rate
        .total_cmp(&a.win_rate)
        .then_with(|| b.matches_won.cmp(&a.matches_won))
        .then_with(|| b.average_score.total_cmp(&a.average_score))
        .then_with(|| b.highest_score.cmp(&a.highest_score))
        .then_with(|| a.player_name.cmp(&b.player_name))
}

/// Totals across the whole league
pub fn league_summary(matches: &[Match], registered: &[String]) -> LeagueSummary {
    let mut players: BTreeSet<&str> = registered.iter().map(String::as_str).collect();
    let mut total_score = 0i64;
    let mut highest_score: Option<i64> = None;

    for m in matches {
        players.insert(&m.player1);
        players.insert(&m.player2);
        total_score += m.player1_score + m.player2_score;
        let best = m.player1_score.max(m.player2_score);
        highest_score = Some(highest_score.map_or(best, |h| h.max(best)));
    }

    let average_score = if matches.is_empty() {
        0.0
    } else {
        total_score as f64 / (matches.len() * 2) as f64
    };

    LeagueSummary {
        total_matches: matches.len() as u32,
        total_players: players.len() as u32,
        average_score,
        highest_score: highest_score.unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::test_support::game;

    #[test]
    fn test_rankings_order() {
        let matches = vec![
            game("m1", "A", 10, "B", 5, 1),
            game("m2", "C", 11, "B", 3, 2),
            game("m3", "C", 2, "A", 1, 3),
            game("m4", "A", 6, "B", 4, 4),
        ];

        let ranked = rankings(&matches, &["D".to_string()]);
        let names: Vec<&str> = ranked.iter().map(|s| s.player_name.as_str()).collect();
        // B and D both sit at 0% with no wins; B's average score puts it ahead
        assert_eq!(names, vec!["C", "A", "B", "D"]);

        let d = ranked.iter().find(|s| s.player_name == "D").unwrap();
        assert_eq!(*d, PlayerStats::empty("D"));
    }

    #[test]
    fn test_rankings_tie_break_on_wins_then_name() {
        let matches = vec![
            game("m1", "A", 3, "X", 1, 1),
            game("m2", "B", 3, "Y", 1, 2),
            game("m3", "B", 3, "Y", 1, 3),
        ];

        let ranked = rankings(&matches, &[]);
        // A and B both at 100%, B has more wins
        assert_eq!(ranked[0].player_name, "B");
        assert_eq!(ranked[1].player_name, "A");
        // X and Y are level on every figure, so the name decides
        assert_eq!(ranked[2].player_name, "X");
        assert_eq!(ranked[3].player_name, "Y");
    }

    #[test]
    fn test_removed_match_changes_rankings() {
        let mut matches = vec![
            game("m1", "A", 10, "B", 5, 1),
            game("m2", "B", 10, "A", 5, 2),
        ];
        let before = rankings(&matches, &[]);
        assert_eq!(before[0].win_rate, 50.0);

        matches.retain(|m| m.id != "m2");
        let after = rankings(&matches, &[]);
        assert_eq!(after[0].player_name, "A");
        assert_eq!(after[0].win_rate, 100.0);
        assert_eq!(after[1].matches_played, 1);
    }

    #[test]
    fn test_league_summary() {
        let matches = vec![
            game("m1", "A", 10, "B", 5, 1),
            game("m2", "C", 11, "B", 3, 2),
        ];

        let summary = league_summary(&matches, &["A".to_string(), "Z".to_string()]);
        assert_eq!(summary.total_matches, 2);
        assert_eq!(summary.total_players, 4);
        assert_eq!(summary.highest_score, 11);
        assert!((summary.average_score - 29.0 / 4.0).abs() < 1e-9);

        assert_eq!(league_summary(&[], &[]), LeagueSummary::default());
    }

    #[test]
    fn test_league_summary_all_negative_scores() {
        let matches = vec![
            game("m1", "A", -3, "B", -5, 1),
            game("m2", "B", -2, "C", -7, 2),
        ];

        let summary = league_summary(&matches, &[]);
        assert_eq!(summary.highest_score, -2);

        let best_player = rankings(&matches, &[])
            .iter()
            .map(|s| s.highest_score)
            .max()
            .unwrap();
        assert_eq!(summary.highest_score, best_player);
    }
}
