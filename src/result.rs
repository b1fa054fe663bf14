//! Views returned to the calling layer.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::card::Card;

/// Outcome label for one spot after settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpotOutcome {
    /// Player beat the dealer (or the dealer busted).
    Win,
    /// Dealer beat the player.
    Loss,
    /// Player went over 21.
    Bust,
    /// Tie; wager returned.
    Push,
    /// Natural blackjack, paid at the configured ratio.
    Blackjack,
}

/// Settlement result for a single spot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotResult {
    /// The spot name.
    pub spot: String,
    /// The outcome label.
    pub outcome: SpotOutcome,
    /// The wager riding on the spot at settlement.
    pub wager: Decimal,
    /// Amount credited back for this spot (stake plus winnings, zero on a
    /// loss).
    pub payout: Decimal,
    /// The player's final hand value.
    pub player_value: u8,
    /// The dealer's final hand value.
    pub dealer_value: u8,
}

/// The player-visible state of an in-progress round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundView {
    /// Round id.
    pub round: Uuid,
    /// Cards per spot.
    pub hands: BTreeMap<String, Vec<Card>>,
    /// Wager per spot.
    pub wagers: BTreeMap<String, Decimal>,
    /// The dealer's visible cards: one until the hole card is revealed.
    pub dealer: Vec<Card>,
}

/// The final state of a settled round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementView {
    /// Round id.
    pub round: Uuid,
    /// The dealer's full hand.
    pub dealer: Vec<Card>,
    /// The dealer's final value.
    pub dealer_value: u8,
    /// Per-spot results.
    pub results: Vec<SpotResult>,
    /// Total credited back to the balance (sum over spots).
    pub total_payout: Decimal,
    /// Balance after settlement.
    pub new_balance: Decimal,
}

/// Result of a player action: either the round continues or it settled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActOutcome {
    /// The round is still in play.
    InPlay(RoundView),
    /// The action ended the round; dealer played and the round settled.
    Settled(SettlementView),
}

impl ActOutcome {
    /// The settlement view, if the action ended the round.
    #[must_use]
    pub const fn settled(&self) -> Option<&SettlementView> {
        match self {
            Self::Settled(view) => Some(view),
            Self::InPlay(_) => None,
        }
    }
}
