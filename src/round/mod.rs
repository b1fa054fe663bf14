//! The round aggregate: shoe, spots, dealer hand, and lifecycle.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::card::{Card, DECK_SIZE, SUITS};
use crate::codec;
use crate::error::{HandCodecError, StoreError, TableError};
use crate::hand::{DealerHand, SpotHand, SpotStatus};
use crate::options::TableOptions;
use crate::result::RoundView;
use crate::store::UserId;

mod actions;
mod dealer;
pub mod state;

pub use dealer::Settlement;
pub use state::RoundState;

/// One blackjack round for one user.
///
/// A round owns its shoe, the hands of every betting spot, and the dealer's
/// hand. It is created fully dealt, mutated by player actions, and consumed
/// by settlement; it never outlives the round it models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    id: Uuid,
    user: UserId,
    shoe: Vec<Card>,
    spots: BTreeMap<String, SpotHand>,
    dealer: DealerHand,
    state: RoundState,
    created_at: DateTime<Utc>,
}

impl Round {
    /// Builds a freshly shuffled round and deals two cards to every requested
    /// spot and two to the dealer (hole card hidden).
    ///
    /// Bet validation is the caller's job; this only requires that `bets` is
    /// non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::ShoeExhausted`] if the shoe cannot cover the
    /// deal (only possible with very small shoes and many spots).
    pub fn deal<R: Rng + ?Sized>(
        user: UserId,
        bets: &BTreeMap<String, Decimal>,
        options: &TableOptions,
        rng: &mut R,
    ) -> Result<Self, TableError> {
        let mut round = Self {
            id: Uuid::new_v4(),
            user,
            shoe: create_shoe(options.decks, rng),
            spots: bets
                .iter()
                .map(|(name, &wager)| (name.clone(), SpotHand::new(wager)))
                .collect(),
            dealer: DealerHand::new(),
            state: RoundState::PlayerTurn,
            created_at: Utc::now(),
        };

        let names: Vec<String> = round.spots.keys().cloned().collect();
        for name in &names {
            for _ in 0..2 {
                let card = round.draw()?;
                if let Some(hand) = round.spots.get_mut(name) {
                    hand.add_card(card);
                }
            }
        }

        let up = round.draw()?;
        round.dealer.add_card(up);
        let hole = round.draw()?;
        round.dealer.add_card(hole);

        Ok(round)
    }

    /// Draws one card from the shoe.
    pub(crate) fn draw(&mut self) -> Result<Card, TableError> {
        self.shoe.pop().ok_or(TableError::ShoeExhausted)
    }

    /// Round id.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Owning user.
    #[must_use]
    pub const fn user(&self) -> UserId {
        self.user
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> RoundState {
        self.state
    }

    /// Creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// All betting spots, keyed by name.
    #[must_use]
    pub const fn spots(&self) -> &BTreeMap<String, SpotHand> {
        &self.spots
    }

    /// The dealer's hand.
    #[must_use]
    pub const fn dealer(&self) -> &DealerHand {
        &self.dealer
    }

    /// Cards remaining in the shoe.
    #[must_use]
    pub fn cards_remaining(&self) -> usize {
        self.shoe.len()
    }

    /// Looks up a spot by name.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::UnknownSpot`] if the name is not present.
    pub fn spot(&self, name: &str) -> Result<&SpotHand, TableError> {
        self.spots.get(name).ok_or_else(|| TableError::UnknownSpot {
            spot: name.to_string(),
        })
    }

    /// Returns whether every spot is terminal (busted, stood, or a natural).
    #[must_use]
    pub fn all_terminal(&self) -> bool {
        self.spots.values().all(SpotHand::is_terminal)
    }

    /// Returns whether any spot survives to contest the dealer (stood or a
    /// natural; busts already lost).
    #[must_use]
    pub fn any_live(&self) -> bool {
        self.spots
            .values()
            .any(|hand| matches!(hand.status(), SpotStatus::Stand | SpotStatus::Blackjack))
    }

    /// Total stake currently riding on the round, across all spots.
    #[must_use]
    pub fn stake_total(&self) -> Decimal {
        self.spots.values().map(SpotHand::wager).sum()
    }

    /// Number of splits performed this round.
    #[must_use]
    pub fn splits_made(&self) -> usize {
        self.spots
            .values()
            .filter(|hand| hand.is_from_split())
            .count()
    }

    /// The player-visible view: all spot hands, wagers, and only the
    /// dealer's visible cards.
    #[must_use]
    pub fn view(&self) -> RoundView {
        RoundView {
            round: self.id,
            hands: self
                .spots
                .iter()
                .map(|(name, hand)| (name.clone(), hand.cards().to_vec()))
                .collect(),
            wagers: self
                .spots
                .iter()
                .map(|(name, hand)| (name.clone(), hand.wager()))
                .collect(),
            dealer: self.dealer.visible_cards().to_vec(),
        }
    }

    /// Serializes the round for the persistence gateway.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Encoding`] if serialization fails.
    pub fn to_stored(&self) -> Result<Value, StoreError> {
        serde_json::to_value(self).map_err(|err| StoreError::Encoding(err.to_string()))
    }

    /// Rebuilds a round from its stored representation.
    ///
    /// Accepts both this crate's snapshot shape and the legacy shape
    /// (`player_hands` / `bets` / `deck`, with string, object, or one-level
    /// nested card encodings). Normalization happens here, once; nothing
    /// downstream ever sees a raw encoding.
    ///
    /// The legacy shape stores no spot statuses, so only busts and naturals
    /// restore as terminal; a hand the player had stood comes back active
    /// and may be played again.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::MalformedHand`] when hand data cannot be
    /// normalized, or [`TableError::Store`] for a structurally invalid
    /// snapshot.
    pub fn from_stored(user: UserId, value: &Value) -> Result<Self, TableError> {
        if value.get("spots").is_some() {
            let round: Self = serde_json::from_value(value.clone())
                .map_err(|err| StoreError::Encoding(err.to_string()))?;
            return Ok(round);
        }
        Self::from_legacy(user, value)
    }

    /// Rebuilds a round from the legacy storage shape.
    fn from_legacy(user: UserId, value: &Value) -> Result<Self, TableError> {
        let hands = value
            .get("player_hands")
            .and_then(Value::as_object)
            .ok_or_else(|| StoreError::Encoding("missing player_hands".to_string()))?;
        let bets = value
            .get("bets")
            .and_then(Value::as_object)
            .ok_or_else(|| StoreError::Encoding("missing bets".to_string()))?;

        let mut spots = BTreeMap::new();
        for (name, raw_hand) in hands {
            let decoded = codec::decode_hand(raw_hand)?;
            let wager = bets
                .get(name)
                .map_or_else(|| Ok(Decimal::ZERO), decode_amount)?;
            let from_split = name.starts_with("split_");

            let mut cards = decoded.cards().iter().copied();
            let mut hand = if from_split {
                let Some(first) = cards.next() else {
                    continue;
                };
                SpotHand::from_split(first, wager)
            } else {
                SpotHand::new(wager)
            };
            for card in cards {
                hand.add_card(card);
            }
            spots.insert(name.clone(), hand);
        }

        let dealer_cards = value
            .get("dealer_hand")
            .map_or_else(|| Ok(Vec::new()), |raw| {
                codec::decode_hand(raw).map(|hand| hand.cards().to_vec())
            })?;

        let shoe = value
            .get("deck")
            .and_then(Value::as_array)
            .map_or_else(|| Ok(Vec::new()), |deck| {
                deck.iter()
                    .map(|raw| {
                        codec::decode_card(raw)?.ok_or_else(|| {
                            HandCodecError::UnrecognizedCard(raw.to_string())
                        })
                    })
                    .collect::<Result<Vec<Card>, HandCodecError>>()
            })?;

        let created_at = value
            .get("created_at")
            .and_then(Value::as_str)
            .and_then(|raw| raw.parse::<DateTime<Utc>>().ok())
            .unwrap_or_else(Utc::now);

        let state = if spots.values().all(SpotHand::is_terminal) {
            RoundState::DealerTurn
        } else {
            RoundState::PlayerTurn
        };

        Ok(Self {
            id: Uuid::new_v4(),
            user,
            shoe,
            spots,
            dealer: DealerHand::with_cards(dealer_cards, false),
            state,
            created_at,
        })
    }
}

/// Creates and shuffles a shoe with the specified number of decks.
fn create_shoe<R: Rng + ?Sized>(num_decks: u8, rng: &mut R) -> Vec<Card> {
    let mut cards = Vec::with_capacity(usize::from(num_decks) * DECK_SIZE);

    for _ in 0..num_decks {
        for suit in SUITS {
            for rank in 1..=13 {
                cards.push(Card::new(suit, rank));
            }
        }
    }

    cards.shuffle(rng);
    cards
}

fn decode_amount(raw: &Value) -> Result<Decimal, StoreError> {
    let parsed = match raw {
        Value::Number(n) => n.as_f64().and_then(|f| Decimal::try_from(f).ok()),
        Value::String(s) => s.parse::<Decimal>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| StoreError::Encoding(format!("bad amount: {raw}")))
}
