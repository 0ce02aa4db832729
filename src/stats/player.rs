//! Per-player aggregation
//!
//! Folds a player's match history into `PlayerStats` and per-opponent
//! records. Streaks are computed over the history in ascending
//! `created_at` order regardless of the order matches are supplied in.

use std::collections::BTreeMap;

use crate::models::{Match, OpponentRecord, PlayerStats};

/// Compute stats for `player` from any list of matches
///
/// Matches the player did not take part in are ignored.
pub fn player_stats(matches: &[Match], player: &str) -> PlayerStats {
    let history = chronological(matches.iter().filter(|m| m.involves(player)));
    fold_history(player, &history)
}

/// Win/loss record of `player` against every opponent they have faced
///
/// Sorted by opponent name.
pub fn opponent_records(matches: &[Match], player: &str) -> Vec<OpponentRecord> {
    let mut tally: BTreeMap<&str, (u32, u32)> = BTreeMap::new();

    for m in matches {
        let Some(opponent) = m.opponent_of(player) else {
            continue;
        };
        let entry = tally.entry(opponent).or_insert((0, 0));
        if m.is_won_by(player) {
            entry.0 += 1;
        } else {
            entry.1 += 1;
        }
    }

    tally
        .into_iter()
        .map(|(opponent, (wins, losses))| OpponentRecord {
            opponent: opponent.to_string(),
            wins,
            losses,
            win_rate: percentage(wins, wins + losses),
        })
        .collect()
}

/// Sort match references oldest first; ties keep their input order
pub(crate) fn chronological<'a>(matches: impl Iterator<Item = &'a Match>) -> Vec<&'a Match> {
    let mut history: Vec<&Match> = matches.collect();
    history.sort_by_key(|m| m.created_at);
    history
}

/// Fold an already chronological history into stats
pub(crate) fn fold_history(player: &str, history: &[&Match]) -> PlayerStats {
    let mut stats = PlayerStats::empty(player);
    let mut streak = Streak::default();

    for m in history {
        let score = m.score_of(player).unwrap_or(0);
        let won = m.is_won_by(player);

        stats.matches_played += 1;
        if won {
            stats.matches_won += 1;
        } else {
            stats.matches_lost += 1;
        }
        stats.total_score += score;
        stats.highest_score = if stats.matches_played == 1 {
            score
        } else {
            stats.highest_score.max(score)
        };
        streak.record(won);
    }

    if stats.matches_played > 0 {
        stats.win_rate = percentage(stats.matches_won, stats.matches_played);
        stats.average_score = stats.total_score as f64 / stats.matches_played as f64;
    }
    stats.current_streak = streak.current;
    stats.win_streak = streak.best_win;
    stats
}

/// Running signed streak
#[derive(Debug, Default, Clone, Copy)]
struct Streak {
    current: i64,
    best_win: i64,
}

impl Streak {
    fn record(&mut self, won: bool) {
        self.current = match (won, self.current) {
            (true, c) if c > 0 => c + 1,
            (true, _) => 1,
            (false, c) if c < 0 => c - 1,
            (false, _) => -1,
        };
        self.best_win = self.best_win.max(self.current);
    }
}

/// `part / whole * 100`, 0 when `whole` is 0
pub(crate) fn percentage(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
