//! League data types
//!
//! Wire types exchanged with the league backend and the derived records
//! produced by the stats aggregator:
//! - `League`, `Match`, `Player`: resources owned by the backend
//! - `PlayerStats`, `HeadToHead`, `LeagueSummary`: derived views
//! - `NewLeague`, `NewMatch`, `NewPlayer`, ...: request bodies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named competition container owning players and matches
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct League {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A recorded match result
///
/// `winner` always names one of the two players; the backend derives it
/// from the scores when the match is written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Match {
    pub id: String,
    pub league_id: String,
    pub player1: String,
    pub player2: String,
    pub player1_score: i64,
    pub player2_score: i64,
    pub winner: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Match {
    /// Whether `player` occupies either slot of this match
    pub fn involves(&self, player: &str) -> bool {
        self.player1 == player || self.player2 == player
    }

    /// Whether this match was played between exactly `a` and `b`
    pub fn is_between(&self, a: &str, b: &str) -> bool {
        (self.player1 == a && self.player2 == b) || (self.player1 == b && self.player2 == a)
    }

    /// The score `player` put up in this match
    pub fn score_of(&self, player: &str) -> Option<i64> {
        if self.player1 == player {
            Some(self.player1_score)
        } else if self.player2 == player {
            Some(self.player2_score)
        } else {
            None
        }
    }

    /// The other participant, seen from `player`
    pub fn opponent_of(&self, player: &str) -> Option<&str> {
        if self.player1 == player {
            Some(&self.player2)
        } else if self.player2 == player {
            Some(&self.player1)
        } else {
            None
        }
    }

    pub fn is_won_by(&self, player: &str) -> bool {
        self.winner == player
    }
}

/// A player registered in a league
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub league_id: String,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Derived performance figures for one player
///
/// Streak sign: positive for consecutive wins, negative for consecutive
/// losses, 0 when the player has no matches.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlayerStats {
    pub player_name: String,
    #[serde(default)]
    pub matches_played: u32,
    #[serde(default)]
    pub matches_won: u32,
    #[serde(default)]
    pub matches_lost: u32,
    #[serde(default)]
    pub total_score: i64,
    #[serde(default)]
    pub win_rate: f64,
    #[serde(default)]
    pub average_score: f64,
    #[serde(default)]
    pub highest_score: i64,
    #[serde(default)]
    pub win_streak: i64,
    #[serde(default)]
    pub current_streak: i64,
}

impl PlayerStats {
    /// Stats for a player without any recorded match
    pub fn empty(player_name: impl Into<String>) -> Self {
        Self {
            player_name: player_name.into(),
            ..Default::default()
        }
    }

    /// Human-readable streak, e.g. "3 Win Streak"
    pub fn streak_label(&self) -> String {
        match self.current_streak {
            s if s > 0 => format!("{} Win Streak", s),
            s if s < 0 => format!("{} Loss Streak", -s),
            _ => "No Streak".to_string(),
        }
    }
}

/// A player's record against a single opponent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpponentRecord {
    pub opponent: String,
    pub wins: u32,
    pub losses: u32,
    pub win_rate: f64,
}

/// A player's stats together with their record against each opponent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerReport {
    pub stats: PlayerStats,
    pub opponents: Vec<OpponentRecord>,
}

/// One side of a head-to-head record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlayerSummary {
    pub name: String,
    pub wins: u32,
    pub win_rate: f64,
    pub average_score: f64,
}

/// A match as seen from a head-to-head pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeadToHeadMatch {
    pub id: String,
    pub date: DateTime<Utc>,
    pub first_score: i64,
    pub second_score: i64,
    pub winner: String,
}

/// Aggregated record between exactly two players
///
/// `first` and `second` are ordered lexicographically by name so the same
/// pair always produces the same record regardless of argument order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeadToHead {
    pub total_matches: u32,
    pub first: PlayerSummary,
    pub second: PlayerSummary,
    /// Mean of `first_score - second_score` over all matches
    pub average_score_difference: f64,
    /// Oldest match first
    pub match_history: Vec<HeadToHeadMatch>,
}

impl HeadToHead {
    /// Summary for `player`, if they are part of this pair
    pub fn summary_for(&self, player: &str) -> Option<&PlayerSummary> {
        if self.first.name == player {
            Some(&self.first)
        } else if self.second.name == player {
            Some(&self.second)
        } else {
            None
        }
    }

    /// Wins and losses from `player`'s perspective
    pub fn record_for(&self, player: &str) -> Option<(u32, u32)> {
        if self.first.name == player {
            Some((self.first.wins, self.second.wins))
        } else if self.second.name == player {
            Some((self.second.wins, self.first.wins))
        } else {
            None
        }
    }
}

/// League-wide figures
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LeagueSummary {
    pub total_matches: u32,
    pub total_players: u32,
    /// Mean score per player slot across all matches
    pub average_score: f64,
    pub highest_score: i64,
}

/// Generic acknowledgement returned by delete endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiMessage {
    pub success: bool,
    pub message: String,
}

// ============================================
// Request bodies
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewLeague {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewLeague {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    /// Builder method: set description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Trim fields and reject an empty name
    pub fn validate(self) -> Result<Self, InputError> {
        Ok(Self {
            name: required("name", &self.name)?,
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeagueUpdate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl LeagueUpdate {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    pub fn validate(self) -> Result<Self, InputError> {
        Ok(Self {
            name: required("name", &self.name)?,
            description: self.description.map(|d| d.trim().to_string()),
        })
    }
}

/// A match result to record (also used for edits)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewMatch {
    pub player1: String,
    pub player2: String,
    pub player1_score: i64,
    pub player2_score: i64,
}

/// Match edits carry the full result
pub type MatchUpdate = NewMatch;

impl NewMatch {
    pub fn new(
        player1: impl Into<String>,
        player1_score: i64,
        player2: impl Into<String>,
        player2_score: i64,
    ) -> Self {
        Self {
            player1: player1.into(),
            player2: player2.into(),
            player1_score,
            player2_score,
        }
    }

    /// Check the result before it is sent
    ///
    /// The winner is derived from the scores, so a drawn score has no
    /// winner and is rejected here.
    pub fn validate(self) -> Result<Self, InputError> {
        let player1 = required("player1", &self.player1)?;
        let player2 = required("player2", &self.player2)?;
        if player1 == player2 {
            return Err(InputError::SamePlayer(player1));
        }
        if self.player1_score == self.player2_score {
            return Err(InputError::EqualScores(self.player1_score));
        }
        Ok(Self {
            player1,
            player2,
            ..self
        })
    }

    /// The player the backend will record as winner
    pub fn expected_winner(&self) -> &str {
        if self.player1_score > self.player2_score {
            &self.player1
        } else {
            &self.player2
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPlayer {
    pub name: String,
}

impl NewPlayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn validate(self) -> Result<Self, InputError> {
        Ok(Self {
            name: required("name", &self.name)?,
        })
    }
}

/// Pagination for match listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchPage {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl MatchPage {
    /// Page size the backend uses when no limit is given
    pub const DEFAULT_LIMIT: u32 = 50;

    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.to_string()));
        }
        pairs
    }
}

/// Rejected request input, caught before anything is sent
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InputError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("A match needs two different players, got {0} twice")]
    SamePlayer(String),

    #[error("Scores cannot be equal ({0}-{0}): a match needs a winner")]
    EqualScores(i64),

    #[error("Invalid score: {0}")]
    InvalidScore(String),
}

fn required(field: &'static str, value: &str) -> Result<String, InputError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(InputError::Empty(field))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Timestamps from the backend are RFC 3339, or naive ISO-8601 in UTC
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(dt) => serializer.serialize_some(&dt.to_rfc3339()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw))),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_deserializes_naive_timestamp() {
        let json = r#"{
            "id": "m1",
            "league_id": "l1",
            "player1": "alice",
            "player2": "bob",
            "player1_score": 10,
            "player2_score": 5,
            "winner": "alice",
            "created_at": "2024-03-01T12:30:00.123456",
            "updated_at": null
        }"#;

        let m: Match = serde_json::from_str(json).unwrap();
        assert_eq!(m.created_at.to_rfc3339(), "2024-03-01T12:30:00.123456+00:00");
        assert!(m.updated_at.is_none());
        assert_eq!(m.score_of("bob"), Some(5));
        assert_eq!(m.opponent_of("alice"), Some("bob"));
        assert!(m.is_won_by("alice"));
    }

    #[test]
    fn test_league_without_optional_fields() {
        let json = r#"{"id": "l1", "name": "Office Pong", "created_at": "2024-03-01T12:30:00Z"}"#;
        let league: League = serde_json::from_str(json).unwrap();
        assert_eq!(league.description, None);
        assert_eq!(league.updated_at, None);
    }

    #[test]
    fn test_new_match_validation() {
        let m = NewMatch::new(" alice ", 11, "bob", 7).validate().unwrap();
        assert_eq!(m.player1, "alice");
        assert_eq!(m.expected_winner(), "alice");

        assert_eq!(
            NewMatch::new("alice", 5, "alice", 3).validate(),
            Err(InputError::SamePlayer("alice".to_string()))
        );
        assert_eq!(
            NewMatch::new("alice", 5, "bob", 5).validate(),
            Err(InputError::EqualScores(5))
        );
        assert_eq!(
            NewMatch::new("  ", 5, "bob", 3).validate(),
            Err(InputError::Empty("player1"))
        );
    }

    #[test]
    fn test_new_league_drops_blank_description() {
        let league = NewLeague::new("  Chess Club ").description("   ").validate().unwrap();
        assert_eq!(league.name, "Chess Club");
        assert_eq!(league.description, None);

        let json = serde_json::to_value(&league).unwrap();
        assert!(json.get("description").is_none());
    }

    #[test]
    fn test_match_page_query() {
        assert!(MatchPage::default().query_pairs().is_empty());
        assert_eq!(
            MatchPage::new(20, 40).query_pairs(),
            vec![("limit", "20".to_string()), ("offset", "40".to_string())]
        );
    }

    #[test]
    fn test_streak_label() {
        let mut stats = PlayerStats::empty("alice");
        assert_eq!(stats.streak_label(), "No Streak");
        stats.current_streak = -2;
        assert_eq!(stats.streak_label(), "2 Loss Streak");
        stats.current_streak = 3;
        assert_eq!(stats.streak_label(), "3 Win Streak");
    }
}
