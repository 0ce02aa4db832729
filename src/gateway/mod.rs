//! Remote Data Gateway
//!
//! Translates league operations into REST calls against the backend and
//! keeps the `QueryCache` consistent with the writes it performs.
//!
//! ## Reads
//!
//! Every read goes through the cache: a hit is returned as is, a miss is
//! fetched, stored under its `CacheKey` and returned.
//!
//! ## Writes
//!
//! A successful mutation invalidates every cached view it affects and then
//! refetches those views, in that order, only after the backend has
//! acknowledged the write. A failed mutation touches nothing.
//!
//! | Mutation        | Views refreshed (same league)                          |
//! |-----------------|--------------------------------------------------------|
//! | create league   | league list                                            |
//! | update league   | league list, the league                                |
//! | delete league   | league list; everything of the league is dropped      |
//! | create/edit/delete match | matches, recent, player stats, rankings, head-to-head, summary |
//! | create player   | players, player stats, rankings, summary               |
//! | delete player   | all of the above except the league itself              |

mod client;
mod error;
mod wire;

pub use client::{segment, ApiClient};
pub use error::{ErrorKind, GatewayError, GatewayResult};
pub use wire::decode_head_to_head;

use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheKey, QueryCache, Subscription};
use crate::config::Config;
use crate::models::{
    ApiMessage, HeadToHead, League, LeagueSummary, LeagueUpdate, Match, MatchPage, MatchUpdate,
    NewLeague, NewMatch, NewPlayer, Player, PlayerReport, PlayerStats,
};
use crate::stats;

/// Number of matches the backend returns for "recent matches" by default
pub const DEFAULT_RECENT_LIMIT: u32 = 10;

/// Gateway settings
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Backend base URL, e.g. "http://localhost:8000"
    pub base_url: String,
    /// Per-request timeout; `None` waits indefinitely
    pub request_timeout: Option<Duration>,
    /// Refetch invalidated views right after a mutation
    pub refetch_on_invalidate: bool,
    /// Capacity of the cache's change channel
    pub event_capacity: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout: Some(Duration::from_secs(30)),
            refetch_on_invalidate: true,
            event_capacity: 256,
        }
    }
}

impl From<&Config> for GatewayConfig {
    fn from(config: &Config) -> Self {
        Self {
            base_url: config.api.base_url.clone(),
            request_timeout: match config.api.request_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            refetch_on_invalidate: config.cache.refetch_on_invalidate,
            event_capacity: config.cache.event_capacity,
        }
    }
}

/// Cached access to the league backend
pub struct Gateway {
    client: ApiClient,
    cache: Arc<QueryCache>,
    refetch_on_invalidate: bool,
}

impl Gateway {
    /// Create a gateway with its own cache
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        let cache = Arc::new(QueryCache::new(config.event_capacity));
        Self::with_cache(config, cache)
    }

    /// Create a gateway sharing an existing cache
    pub fn with_cache(config: GatewayConfig, cache: Arc<QueryCache>) -> GatewayResult<Self> {
        let client = ApiClient::new(&config.base_url, config.request_timeout)?;
        Ok(Self {
            client,
            cache,
            refetch_on_invalidate: config.refetch_on_invalidate,
        })
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    /// Watch a view for refreshes and invalidations
    pub fn subscribe(&self, key: CacheKey) -> Subscription {
        self.cache.subscribe(key)
    }

    // ============================================
    // Leagues
    // ============================================

    pub async fn list_leagues(&self) -> GatewayResult<Vec<League>> {
        self.read(CacheKey::Leagues).await
    }

    pub async fn get_league(&self, league_id: &str) -> GatewayResult<League> {
        self.read(CacheKey::League(league_id.to_string())).await
    }

    pub async fn create_league(&self, league: NewLeague) -> GatewayResult<League> {
        let league = league.validate()?;
        let created: League = self.client.post("/api/leagues", &league).await?;

        tracing::info!(league_id = %created.id, name = %created.name, "League created");
        self.revalidate(|key| matches!(key, CacheKey::Leagues)).await;
        Ok(created)
    }

    pub async fn update_league(&self, league_id: &str, update: LeagueUpdate) -> GatewayResult<League> {
        let update = update.validate()?;
        let path = format!("/api/leagues/{}", segment(league_id));
        let updated: League = self.client.put(&path, &update).await?;

        tracing::info!(league_id = %league_id, name = %updated.name, "League updated");
        self.revalidate(|key| match key {
            CacheKey::Leagues => true,
            CacheKey::League(id) => id == league_id,
            _ => false,
        })
        .await;
        Ok(updated)
    }

    /// Delete a league; the backend removes its players and matches too
    pub async fn delete_league(&self, league_id: &str) -> GatewayResult<ApiMessage> {
        let path = format!("/api/leagues/{}", segment(league_id));
        let message: ApiMessage = self.client.delete(&path).await?;

        tracing::info!(league_id = %league_id, "League deleted");
        let dropped = self
            .cache
            .invalidate_where(|key| key.league_id() == Some(league_id))
            .await;
        tracing::debug!(league_id = %league_id, dropped = dropped.len(), "Dropped league views");
        self.revalidate(|key| matches!(key, CacheKey::Leagues)).await;
        Ok(message)
    }

    // ============================================
    // Matches
    // ============================================

    pub async fn list_matches(&self, league_id: &str, page: MatchPage) -> GatewayResult<Vec<Match>> {
        self.read(CacheKey::matches(league_id, page)).await
    }

    /// Every match of a league, newest first, fetched page by page
    pub async fn all_matches(&self, league_id: &str) -> GatewayResult<Vec<Match>> {
        let limit = MatchPage::DEFAULT_LIMIT;
        let mut all = Vec::new();
        let mut offset = 0;

        loop {
            let page = self.list_matches(league_id, MatchPage::new(limit, offset)).await?;
            let fetched = page.len() as u32;
            all.extend(page);
            if fetched < limit {
                break;
            }
            offset += limit;
        }

        Ok(all)
    }

    pub async fn recent_matches(&self, league_id: &str, limit: u32) -> GatewayResult<Vec<Match>> {
        self.read(CacheKey::RecentMatches {
            league_id: league_id.to_string(),
            limit,
        })
        .await
    }

    pub async fn create_match(&self, league_id: &str, result: NewMatch) -> GatewayResult<Match> {
        let result = result.validate()?;
        let path = format!("/api/leagues/{}/matches", segment(league_id));
        let created: Match = self.client.post(&path, &result).await?;

        tracing::info!(
            league_id = %league_id,
            match_id = %created.id,
            winner = %created.winner,
            "Match recorded"
        );
        self.revalidate_matches(Some(league_id)).await;
        Ok(created)
    }

    pub async fn update_match(&self, match_id: &str, update: MatchUpdate) -> GatewayResult<Match> {
        let update = update.validate()?;
        let path = format!("/api/matches/{}", segment(match_id));
        let updated: Match = self.client.put(&path, &update).await?;

        tracing::info!(match_id = %match_id, league_id = %updated.league_id, "Match updated");
        self.revalidate_matches(Some(updated.league_id.as_str())).await;
        Ok(updated)
    }

    /// Delete a match
    ///
    /// The backend does not say which league the match belonged to; it is
    /// looked up in the cached match lists, and when unknown every league's
    /// match-derived views are refreshed.
    pub async fn delete_match(&self, match_id: &str) -> GatewayResult<ApiMessage> {
        let league_id = self.cached_match_league(match_id).await;
        let path = format!("/api/matches/{}", segment(match_id));
        let message: ApiMessage = self.client.delete(&path).await?;

        tracing::info!(match_id = %match_id, league_id = ?league_id, "Match deleted");
        self.revalidate_matches(league_id.as_deref()).await;
        Ok(message)
    }

    // ============================================
    // Players
    // ============================================

    pub async fn list_players(&self, league_id: &str) -> GatewayResult<Vec<Player>> {
        self.read(CacheKey::Players(league_id.to_string())).await
    }

    pub async fn list_player_stats(&self, league_id: &str) -> GatewayResult<Vec<PlayerStats>> {
        self.read(CacheKey::PlayerStats(league_id.to_string())).await
    }

    pub async fn get_player_stats(&self, league_id: &str, name: &str) -> GatewayResult<PlayerStats> {
        self.read(CacheKey::Player {
            league_id: league_id.to_string(),
            name: name.to_string(),
        })
        .await
    }

    pub async fn create_player(&self, league_id: &str, player: NewPlayer) -> GatewayResult<Player> {
        let player = player.validate()?;
        let path = format!("/api/leagues/{}/players", segment(league_id));
        let created: Player = self.client.post(&path, &player).await?;

        tracing::info!(league_id = %league_id, player = %created.name, "Player created");
        self.revalidate(|key| key.league_id() == Some(league_id) && key.depends_on_players())
            .await;
        Ok(created)
    }

    /// Delete a player and, on the backend, every match they played
    pub async fn delete_player(&self, league_id: &str, name: &str) -> GatewayResult<ApiMessage> {
        let path = format!(
            "/api/leagues/{}/players/{}",
            segment(league_id),
            segment(name)
        );
        let message: ApiMessage = self.client.delete(&path).await?;

        tracing::info!(league_id = %league_id, player = %name, "Player deleted");
        self.revalidate(|key| {
            key.league_id() == Some(league_id)
                && (key.depends_on_players() || key.depends_on_matches())
        })
        .await;
        Ok(message)
    }

    // ============================================
    // Derived views
    // ============================================

    pub async fn get_rankings(&self, league_id: &str) -> GatewayResult<Vec<PlayerStats>> {
        self.read(CacheKey::Rankings(league_id.to_string())).await
    }

    pub async fn get_head_to_head(&self, league_id: &str, a: &str, b: &str) -> GatewayResult<HeadToHead> {
        self.read(CacheKey::head_to_head(league_id, a, b)).await
    }

    pub async fn get_league_summary(&self, league_id: &str) -> GatewayResult<LeagueSummary> {
        self.read(CacheKey::LeagueSummary(league_id.to_string())).await
    }

    /// Rankings computed locally from the full match list
    pub async fn local_rankings(&self, league_id: &str) -> GatewayResult<Vec<PlayerStats>> {
        let matches = self.all_matches(league_id).await?;
        let registered = self.registered_names(league_id).await?;
        Ok(stats::rankings(&matches, &registered))
    }

    /// League summary computed locally from the full match list
    pub async fn local_league_summary(&self, league_id: &str) -> GatewayResult<LeagueSummary> {
        let matches = self.all_matches(league_id).await?;
        let registered = self.registered_names(league_id).await?;
        Ok(stats::league_summary(&matches, &registered))
    }

    /// One player's stats and per-opponent records, computed locally
    pub async fn player_report(&self, league_id: &str, name: &str) -> GatewayResult<PlayerReport> {
        let matches = self.all_matches(league_id).await?;
        Ok(PlayerReport {
            stats: stats::player_stats(&matches, name),
            opponents: stats::opponent_records(&matches, name),
        })
    }

    /// Drop a view and fetch it again
    pub async fn refresh(&self, key: CacheKey) -> GatewayResult<()> {
        self.cache.invalidate(&key).await;
        self.fetch_value(&key).await.map(|_| ())
    }

    // ============================================
    // Internals
    // ============================================

    async fn read<T>(&self, key: CacheKey) -> GatewayResult<T>
    where
        T: DeserializeOwned,
    {
        if let Some(value) = self.cache.get::<T>(&key).await {
            tracing::trace!(key = %key, "Cache hit");
            return Ok(value);
        }
        let value = self.fetch_value(&key).await?;
        serde_json::from_value(value).map_err(|e| GatewayError::Decode(e.to_string()))
    }

    /// Fetch the view behind `key` and store it
    async fn fetch_value(&self, key: &CacheKey) -> GatewayResult<serde_json::Value> {
        let value = self.load(key).await?;
        self.cache
            .insert(key.clone(), &value)
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        Ok(value)
    }

    /// Issue the GET request for `key`
    async fn load(&self, key: &CacheKey) -> GatewayResult<serde_json::Value> {
        match key {
            CacheKey::Leagues => self.client.get("/api/leagues").await,
            CacheKey::League(id) => self.client.get(&format!("/api/leagues/{}", segment(id))).await,
            CacheKey::Matches { league_id, page } => {
                let path = format!("/api/leagues/{}/matches", segment(league_id));
                self.client.get_with_query(&path, &page.query_pairs()).await
            }
            CacheKey::RecentMatches { league_id, limit } => {
                let path = format!("/api/leagues/{}/recent", segment(league_id));
                self.client
                    .get_with_query(&path, &[("limit", limit.to_string())])
                    .await
            }
            CacheKey::Players(id) => {
                self.client
                    .get(&format!("/api/leagues/{}/players", segment(id)))
                    .await
            }
            CacheKey::Player { league_id, name } => {
                let path = format!(
                    "/api/leagues/{}/players/{}",
                    segment(league_id),
                    segment(name)
                );
                self.client.get(&path).await
            }
            CacheKey::PlayerStats(id) => {
                self.client
                    .get(&format!("/api/leagues/{}/player-stats", segment(id)))
                    .await
            }
            CacheKey::Rankings(id) => {
                self.client
                    .get(&format!("/api/leagues/{}/rankings", segment(id)))
                    .await
            }
            CacheKey::HeadToHead {
                league_id,
                first,
                second,
            } => {
                let path = format!(
                    "/api/leagues/{}/head-to-head/{}/{}",
                    segment(league_id),
                    segment(first),
                    segment(second)
                );
                let payload: serde_json::Value = self.client.get(&path).await?;
                let record = decode_head_to_head(&payload, first, second)?;
                serde_json::to_value(record).map_err(|e| GatewayError::Decode(e.to_string()))
            }
            CacheKey::LeagueSummary(id) => {
                self.client
                    .get(&format!("/api/leagues/{}/stats", segment(id)))
                    .await
            }
        }
    }

    /// Invalidate matching views, then refetch them
    ///
    /// Refetch failures are logged and leave the view uncached so the next
    /// read tries again.
    async fn revalidate<F>(&self, predicate: F) -> Vec<CacheKey>
    where
        F: Fn(&CacheKey) -> bool,
    {
        let stale = self.cache.invalidate_where(predicate).await;
        if !self.refetch_on_invalidate {
            return stale;
        }

        for key in &stale {
            match self.fetch_value(key).await {
                Ok(_) => tracing::debug!(key = %key, "Refetched"),
                Err(e) => tracing::warn!(key = %key, error = %e, "Refetch failed"),
            }
        }
        stale
    }

    /// Refresh match-derived views of one league, or of every league
    async fn revalidate_matches(&self, league_id: Option<&str>) -> Vec<CacheKey> {
        self.revalidate(|key| {
            key.depends_on_matches()
                && match league_id {
                    Some(id) => key.league_id() == Some(id),
                    None => true,
                }
        })
        .await
    }

    /// League of a match, if any cached match list contains it
    async fn cached_match_league(&self, match_id: &str) -> Option<String> {
        for key in self.cache.keys().await {
            if !matches!(key, CacheKey::Matches { .. } | CacheKey::RecentMatches { .. }) {
                continue;
            }
            if let Some(matches) = self.cache.get::<Vec<Match>>(&key).await {
                if let Some(m) = matches.iter().find(|m| m.id == match_id) {
                    return Some(m.league_id.clone());
                }
            }
        }
        None
    }

    async fn registered_names(&self, league_id: &str) -> GatewayResult<Vec<String>> {
        Ok(self
            .list_players(league_id)
            .await?
            .into_iter()
            .map(|p| p.name)
            .collect())
    }
}
