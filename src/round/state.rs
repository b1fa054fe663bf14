//! Round lifecycle states.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a round.
///
/// Betting and dealing happen inside `start`, so a persisted round is always
/// at least in `PlayerTurn`. `Settled` rounds are deleted, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundState {
    /// Waiting for player actions on one or more spots.
    PlayerTurn,
    /// All spots terminal; dealer plays out their hand.
    DealerTurn,
    /// Settled and ready for deletion.
    Settled,
}
