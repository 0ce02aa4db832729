//! # Versus
//!
//! Client library for tracking head-to-head competitions: leagues, players
//! and match results kept by a REST backend, with the derived statistics
//! (player stats, rankings, head-to-head records) computed or fetched on
//! demand.
//!
//! ## Modules
//!
//! - [`stats`]: pure statistics over a league's match list
//! - [`gateway`]: REST client with a shared read cache and write-through invalidation
//! - [`cache`]: keyed read cache with change subscriptions
//! - [`form`]: create/edit dialog state machine
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use versus::{Gateway, GatewayConfig, NewMatch};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = Gateway::new(GatewayConfig::default())?;
//!
//!     let league = gateway.list_leagues().await?.remove(0);
//!     gateway
//!         .create_match(&league.id, NewMatch::new("alice", 11, "bob", 7))
//!         .await?;
//!
//!     // Rankings were refreshed by the write above
//!     for (rank, stats) in gateway.get_rankings(&league.id).await?.iter().enumerate() {
//!         println!("{}. {} ({:.1}%)", rank + 1, stats.player_name, stats.win_rate);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod form;
pub mod gateway;
pub mod models;
pub mod stats;

pub use cache::{CacheEvent, CacheKey, QueryCache, Subscription};

pub use config::{generate_default_config, Config, ConfigError, LoggingConfig};

pub use form::{Dialog, DialogState, FormError, LeagueForm, MatchForm, PlayerForm};

pub use gateway::{ErrorKind, Gateway, GatewayConfig, GatewayError, GatewayResult};

pub use models::{
    ApiMessage, HeadToHead, HeadToHeadMatch, InputError, League, LeagueSummary, LeagueUpdate,
    Match, MatchPage, MatchUpdate, NewLeague, NewMatch, NewPlayer, OpponentRecord, Player,
    PlayerReport, PlayerStats, PlayerSummary,
};
