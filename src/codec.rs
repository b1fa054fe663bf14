//! Normalization of persisted hand encodings.
//!
//! Rounds written by earlier revisions of the system stored hands in several
//! shapes at once: card objects with `rank`/`suit`/`value` fields, bare
//! strings like `"AH"` or `"10C"`, one level of nested sub-arrays left over
//! from split storage, and a `"Hidden"` placeholder for the dealer's hole
//! card. Everything is normalized here, once, at the persistence boundary;
//! the hand engine only ever sees concrete [`Card`] values.
//!
//! Unlike the legacy code, unrecognized encodings are not skipped: they fail
//! with [`HandCodecError`] so a bad card cannot silently distort the total.

use serde_json::Value;

use crate::card::{Card, Suit};
use crate::error::HandCodecError;
use crate::hand::evaluate;

/// Sentinel for the dealer's unrevealed hole card.
pub const HIDDEN: &str = "Hidden";

/// A hand normalized from its stored representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHand {
    cards: Vec<Card>,
    top_level: usize,
}

impl DecodedHand {
    /// The concrete cards, flattened and with hidden placeholders removed.
    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Best blackjack total for the hand.
    #[must_use]
    pub fn value(&self) -> u8 {
        evaluate(&self.cards).0
    }

    /// Natural blackjack: exactly two elements *before* flattening, worth 21.
    #[must_use]
    pub fn is_blackjack(&self) -> bool {
        self.top_level == 2 && self.value() == 21
    }

    /// Returns whether the hand is bust.
    #[must_use]
    pub fn is_bust(&self) -> bool {
        self.value() > 21
    }
}

/// Decodes a stored hand, flattening one level of nesting and skipping
/// `"Hidden"` placeholders.
///
/// # Errors
///
/// Returns [`HandCodecError`] if the value is not an array, is nested more
/// than one level deep, or contains an element that cannot be resolved to a
/// card.
pub fn decode_hand(raw: &Value) -> Result<DecodedHand, HandCodecError> {
    let items = raw.as_array().ok_or(HandCodecError::NotAnArray)?;
    let top_level = items.len();
    let mut cards = Vec::with_capacity(top_level);

    for item in items {
        if let Value::Array(nested) = item {
            for inner in nested {
                if inner.is_array() {
                    return Err(HandCodecError::TooDeeplyNested);
                }
                if let Some(card) = decode_card(inner)? {
                    cards.push(card);
                }
            }
        } else if let Some(card) = decode_card(item)? {
            cards.push(card);
        }
    }

    Ok(DecodedHand { cards, top_level })
}

/// Decodes a single stored card.
///
/// Returns `Ok(None)` for the `"Hidden"` placeholder.
///
/// # Errors
///
/// Returns [`HandCodecError`] for any shape that is not a recognizable card.
pub fn decode_card(raw: &Value) -> Result<Option<Card>, HandCodecError> {
    match raw {
        Value::String(s) if s == HIDDEN => Ok(None),
        Value::String(s) => parse_card_str(s).map(Some),
        Value::Object(fields) => {
            // Suit never affects valuation; a card stored without one still
            // decodes, defaulting to spades.
            let suit = fields
                .get("suit")
                .map_or(Ok(Suit::Spades), parse_suit)?;
            let rank = if let Some(rank) = fields.get("rank") {
                parse_rank_value(rank)?
            } else if let Some(value) = fields.get("value") {
                rank_from_point_value(value)?
            } else {
                return Err(HandCodecError::UnrecognizedCard(raw.to_string()));
            };
            Ok(Some(Card::new(suit, rank)))
        }
        other => Err(HandCodecError::UnrecognizedCard(other.to_string())),
    }
}

fn parse_card_str(s: &str) -> Result<Card, HandCodecError> {
    let (rank_part, suit_part) = if let Some(rest) = s.strip_prefix("10") {
        ("10", rest)
    } else {
        let mut chars = s.char_indices();
        match (chars.next(), chars.next()) {
            (Some(_), Some((split, _))) => s.split_at(split),
            _ => return Err(HandCodecError::UnrecognizedCard(s.to_string())),
        }
    };

    let rank = parse_rank_str(rank_part)?;
    let suit = parse_suit_str(suit_part)
        .ok_or_else(|| HandCodecError::UnrecognizedCard(s.to_string()))?;
    Ok(Card::new(suit, rank))
}

fn parse_rank_value(raw: &Value) -> Result<u8, HandCodecError> {
    match raw {
        Value::String(s) => parse_rank_str(s),
        Value::Number(n) => match n.as_u64() {
            Some(r @ 1..=13) => Ok(r as u8),
            _ => Err(HandCodecError::UnrecognizedRank(n.to_string())),
        },
        other => Err(HandCodecError::UnrecognizedRank(other.to_string())),
    }
}

fn parse_rank_str(s: &str) -> Result<u8, HandCodecError> {
    match s {
        "A" => Ok(1),
        "J" => Ok(11),
        "Q" => Ok(12),
        "K" => Ok(13),
        _ => match s.parse::<u8>() {
            Ok(r @ 2..=10) => Ok(r),
            _ => Err(HandCodecError::UnrecognizedRank(s.to_string())),
        },
    }
}

/// Maps an explicit point value back to a rank (11 is an ace; 10 cannot be
/// told apart from a face card and decodes as a ten).
fn rank_from_point_value(raw: &Value) -> Result<u8, HandCodecError> {
    match raw.as_u64() {
        Some(11) => Ok(1),
        Some(v @ 2..=10) => Ok(v as u8),
        _ => Err(HandCodecError::UnrecognizedRank(raw.to_string())),
    }
}

fn parse_suit(raw: &Value) -> Result<Suit, HandCodecError> {
    raw.as_str()
        .and_then(parse_suit_str)
        .ok_or_else(|| HandCodecError::UnrecognizedCard(raw.to_string()))
}

fn parse_suit_str(s: &str) -> Option<Suit> {
    match s {
        "H" | "♥" | "Hearts" => Some(Suit::Hearts),
        "D" | "♦" | "Diamonds" => Some(Suit::Diamonds),
        "C" | "♣" | "Clubs" => Some(Suit::Clubs),
        "S" | "♠" | "Spades" => Some(Suit::Spades),
        _ => None,
    }
}
