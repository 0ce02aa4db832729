//! Query Cache
//!
//! Keyed store of read results with explicit invalidation. Every read the
//! gateway performs is stored under a `CacheKey` mirroring the endpoint it
//! came from; mutations invalidate the keys they affect and the gateway
//! refetches them. Interested views call `subscribe(key)` and are told when
//! their entry is updated or dropped.
//!
//! Uses a tokio broadcast channel for change notification.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::{broadcast, RwLock};

use crate::models::MatchPage;
use crate::stats::ordered_pair;

/// Identifies one read view
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Leagues,
    League(String),
    Matches { league_id: String, page: MatchPage },
    RecentMatches { league_id: String, limit: u32 },
    Players(String),
    Player { league_id: String, name: String },
    PlayerStats(String),
    Rankings(String),
    /// Players are stored as an ordered pair
    HeadToHead {
        league_id: String,
        first: String,
        second: String,
    },
    LeagueSummary(String),
}

impl CacheKey {
    pub fn matches(league_id: &str, page: MatchPage) -> Self {
        CacheKey::Matches {
            league_id: league_id.to_string(),
            page,
        }
    }

    pub fn head_to_head(league_id: &str, a: &str, b: &str) -> Self {
        let (first, second) = ordered_pair(a, b);
        CacheKey::HeadToHead {
            league_id: league_id.to_string(),
            first: first.to_string(),
            second: second.to_string(),
        }
    }

    /// The league this view belongs to, if any
    pub fn league_id(&self) -> Option<&str> {
        match self {
            CacheKey::Leagues => None,
            CacheKey::League(id)
            | CacheKey::Players(id)
            | CacheKey::PlayerStats(id)
            | CacheKey::Rankings(id)
            | CacheKey::LeagueSummary(id) => Some(id.as_str()),
            CacheKey::Matches { league_id, .. }
            | CacheKey::RecentMatches { league_id, .. }
            | CacheKey::Player { league_id, .. }
            | CacheKey::HeadToHead { league_id, .. } => Some(league_id.as_str()),
        }
    }

    /// Views whose content is derived from the league's match list
    pub fn depends_on_matches(&self) -> bool {
        matches!(
            self,
            CacheKey::Matches { .. }
                | CacheKey::RecentMatches { .. }
                | CacheKey::Player { .. }
                | CacheKey::PlayerStats(_)
                | CacheKey::Rankings(_)
                | CacheKey::HeadToHead { .. }
                | CacheKey::LeagueSummary(_)
        )
    }

    /// Views that list or count the league's players
    pub fn depends_on_players(&self) -> bool {
        matches!(
            self,
            CacheKey::Players(_)
                | CacheKey::Player { .. }
                | CacheKey::PlayerStats(_)
                | CacheKey::Rankings(_)
                | CacheKey::LeagueSummary(_)
        )
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Leagues => write!(f, "/api/leagues"),
            CacheKey::League(id) => write!(f, "/api/leagues/{}", id),
            CacheKey::Matches { league_id, page } => {
                write!(f, "/api/leagues/{}/matches", league_id)?;
                let query: Vec<String> = page
                    .query_pairs()
                    .into_iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect();
                if !query.is_empty() {
                    write!(f, "?{}", query.join("&"))?;
                }
                Ok(())
            }
            CacheKey::RecentMatches { league_id, limit } => {
                write!(f, "/api/leagues/{}/recent?limit={}", league_id, limit)
            }
            CacheKey::Players(id) => write!(f, "/api/leagues/{}/players", id),
            CacheKey::Player { league_id, name } => {
                write!(f, "/api/leagues/{}/players/{}", league_id, name)
            }
            CacheKey::PlayerStats(id) => write!(f, "/api/leagues/{}/player-stats", id),
            CacheKey::Rankings(id) => write!(f, "/api/leagues/{}/rankings", id),
            CacheKey::HeadToHead {
                league_id,
                first,
                second,
            } => write!(f, "/api/leagues/{}/head-to-head/{}/{}", league_id, first, second),
            CacheKey::LeagueSummary(id) => write!(f, "/api/leagues/{}/stats", id),
        }
    }
}

/// Change notification for a cache entry
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEvent {
    /// A fresh value was stored
    Updated(CacheKey),
    /// The entry was dropped; readers should refetch
    Invalidated(CacheKey),
}

impl CacheEvent {
    pub fn key(&self) -> &CacheKey {
        match self {
            CacheEvent::Updated(key) | CacheEvent::Invalidated(key) => key,
        }
    }
}

/// A stored read result
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: serde_json::Value,
    pub fetched_at: DateTime<Utc>,
}

/// Process-wide store of read results
pub struct QueryCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    events: broadcast::Sender<CacheEvent>,
}

impl QueryCache {
    /// Create an empty cache; `event_capacity` bounds how far a slow
    /// subscriber may lag before it misses events
    pub fn new(event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            entries: RwLock::new(HashMap::new()),
            events,
        }
    }

    /// Read a cached value
    ///
    /// An entry that no longer decodes as `T` is treated as a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        match serde_json::from_value(entry.value.clone()) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cached value has unexpected shape");
                None
            }
        }
    }

    /// Raw entry, including when it was fetched
    pub async fn entry(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn contains(&self, key: &CacheKey) -> bool {
        self.entries.read().await.contains_key(key)
    }

    /// Store a value and notify subscribers
    pub async fn insert<T: Serialize>(&self, key: CacheKey, value: &T) -> Result<(), serde_json::Error> {
        let entry = CacheEntry {
            value: serde_json::to_value(value)?,
            fetched_at: Utc::now(),
        };
        self.entries.write().await.insert(key.clone(), entry);
        tracing::trace!(key = %key, "Cache updated");
        let _ = self.events.send(CacheEvent::Updated(key));
        Ok(())
    }

    /// Drop one entry
    ///
    /// Returns whether anything was cached under `key`. Subscribers are
    /// notified only when an entry was actually removed.
    pub async fn invalidate(&self, key: &CacheKey) -> bool {
        let removed = self.entries.write().await.remove(key).is_some();
        if removed {
            tracing::debug!(key = %key, "Cache invalidated");
            let _ = self.events.send(CacheEvent::Invalidated(key.clone()));
        }
        removed
    }

    /// Drop every entry whose key satisfies `predicate`
    ///
    /// Returns the removed keys.
    pub async fn invalidate_where<F>(&self, predicate: F) -> Vec<CacheKey>
    where
        F: Fn(&CacheKey) -> bool,
    {
        let removed: Vec<CacheKey> = {
            let mut entries = self.entries.write().await;
            let keys: Vec<CacheKey> = entries.keys().filter(|&k| predicate(k)).cloned().collect();
            for key in &keys {
                entries.remove(key);
            }
            keys
        };

        for key in &removed {
            tracing::debug!(key = %key, "Cache invalidated");
            let _ = self.events.send(CacheEvent::Invalidated(key.clone()));
        }
        removed
    }

    /// Drop everything
    pub async fn clear(&self) -> usize {
        self.invalidate_where(|_| true).await.len()
    }

    pub async fn keys(&self) -> Vec<CacheKey> {
        self.entries.read().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Watch one key for updates and invalidations
    pub fn subscribe(&self, key: CacheKey) -> Subscription {
        Subscription {
            key,
            rx: self.events.subscribe(),
        }
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Receives the events for a single key
pub struct Subscription {
    key: CacheKey,
    rx: broadcast::Receiver<CacheEvent>,
}

impl Subscription {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Wait for the next event on this key
    ///
    /// Returns `None` once the cache is dropped. If events were missed
    /// because the subscriber lagged, an `Invalidated` event is reported
    /// so the reader refetches.
    pub async fn next(&mut self) -> Option<CacheEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.key() == &self.key => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(key = %self.key, missed, "Cache subscriber lagged");
                    return Some(CacheEvent::Invalidated(self.key.clone()));
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next pending event on this key without waiting
    pub fn try_next(&mut self) -> Option<CacheEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if event.key() == &self.key => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Lagged(_)) => {
                    return Some(CacheEvent::Invalidated(self.key.clone()));
                }
                Err(_) => return None,
            }
        }
    }
}
