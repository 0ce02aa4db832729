//! Stats Aggregator
//!
//! Pure functions turning a league's match list into derived views.
//! Nothing here performs I/O; the gateway feeds it whatever match list it
//! fetched and the results are recomputed after every refetch.
//!
//! - [`player_stats`]: one player's record, scores and streaks
//! - [`opponent_records`]: one player's record against each opponent
//! - [`head_to_head`]: the structured record between two players
//! - [`rankings`] / [`league_summary`]: league-wide views

mod head_to_head;
mod player;
mod rankings;

pub use head_to_head::{head_to_head, ordered_pair};
pub use player::{opponent_records, player_stats};
pub use rankings::{league_summary, rank_order, rankings};
