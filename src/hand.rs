//! Hand evaluation and the player/dealer hand representations.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::card::Card;

/// Evaluates a set of cards, returning `(total, soft)`.
///
/// Aces count as 11 and are re-valued to 1, one at a time, while the total
/// exceeds 21. `soft` is true when an ace is still counted as 11. The result
/// does not depend on card order.
#[must_use]
pub fn evaluate(cards: &[Card]) -> (u8, bool) {
    let mut value: u8 = 0;
    let mut aces: u8 = 0;

    for card in cards {
        if card.is_ace() {
            aces += 1;
        }
        value = value.saturating_add(card.rank_value());
    }

    while value > 21 && aces > 0 {
        value -= 10;
        aces -= 1;
    }

    let is_soft = aces > 0 && value <= 21;
    (value, is_soft)
}

/// Status of one betting spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpotStatus {
    /// The spot can still take actions.
    Active,
    /// The player has stood.
    Stand,
    /// The hand went over 21.
    Bust,
    /// Natural blackjack (21 on the first two dealt cards).
    Blackjack,
}

/// The hand belonging to one betting spot, together with its wager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotHand {
    cards: Vec<Card>,
    status: SpotStatus,
    wager: Decimal,
    from_split: bool,
}

impl SpotHand {
    /// Creates a new empty hand with the given wager.
    #[must_use]
    pub const fn new(wager: Decimal) -> Self {
        Self {
            cards: Vec::new(),
            status: SpotStatus::Active,
            wager,
            from_split: false,
        }
    }

    /// Creates a hand from a split, holding one card of the original pair.
    #[must_use]
    pub fn from_split(card: Card, wager: Decimal) -> Self {
        Self {
            cards: vec![card],
            status: SpotStatus::Active,
            wager,
            from_split: true,
        }
    }

    /// Adds a card and re-evaluates the hand.
    ///
    /// Going over 21 marks the spot bust. A two-card 21 on a hand that is not
    /// from a split is a natural blackjack.
    pub fn add_card(&mut self, card: Card) {
        self.cards.push(card);

        let (value, _) = evaluate(&self.cards);
        if value > 21 {
            self.status = SpotStatus::Bust;
        } else if self.cards.len() == 2 && value == 21 && !self.from_split {
            self.status = SpotStatus::Blackjack;
        }
    }

    /// Returns the cards in the hand.
    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Returns the spot status.
    #[must_use]
    pub const fn status(&self) -> SpotStatus {
        self.status
    }

    /// Sets the spot status.
    pub const fn set_status(&mut self, status: SpotStatus) {
        self.status = status;
    }

    /// Returns whether the spot can take no further actions.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status != SpotStatus::Active
    }

    /// Returns the wager riding on this spot.
    #[must_use]
    pub const fn wager(&self) -> Decimal {
        self.wager
    }

    /// Doubles the recorded wager.
    pub fn double_wager(&mut self) {
        self.wager *= Decimal::from(2);
    }

    /// Returns whether this hand came from a split.
    #[must_use]
    pub const fn is_from_split(&self) -> bool {
        self.from_split
    }

    /// Best blackjack total for the hand.
    #[must_use]
    pub fn value(&self) -> u8 {
        evaluate(&self.cards).0
    }

    /// Returns whether the hand contains an ace still counted as 11.
    #[must_use]
    pub fn is_soft(&self) -> bool {
        evaluate(&self.cards).1
    }

    /// Returns whether the hand may be split: exactly two cards of equal rank.
    #[must_use]
    pub fn can_split(&self) -> bool {
        self.cards.len() == 2 && self.cards[0].rank == self.cards[1].rank
    }

    /// Number of cards in the hand.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Returns whether the hand is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Removes and returns the second card of a pair for splitting.
    pub fn take_split_card(&mut self) -> Option<Card> {
        if self.cards.len() == 2 {
            self.cards.pop()
        } else {
            None
        }
    }
}

/// The dealer's hand.
///
/// The second dealt card is the hole card and stays hidden until dealer play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealerHand {
    cards: Vec<Card>,
    hole_revealed: bool,
}

impl DealerHand {
    /// Creates a new empty dealer hand.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cards: Vec::new(),
            hole_revealed: false,
        }
    }

    /// Rebuilds a dealer hand from already-dealt cards.
    #[must_use]
    pub const fn with_cards(cards: Vec<Card>, hole_revealed: bool) -> Self {
        Self {
            cards,
            hole_revealed,
        }
    }

    /// Adds a card to the hand.
    pub fn add_card(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// Returns all cards in the hand.
    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// The cards visible to the player: only the up card until the hole card
    /// is revealed.
    #[must_use]
    pub fn visible_cards(&self) -> &[Card] {
        if self.hole_revealed {
            &self.cards
        } else {
            &self.cards[..self.cards.len().min(1)]
        }
    }

    /// Returns the up card (first card).
    #[must_use]
    pub fn up_card(&self) -> Option<&Card> {
        self.cards.first()
    }

    /// Returns whether the hole card is revealed.
    #[must_use]
    pub const fn is_hole_revealed(&self) -> bool {
        self.hole_revealed
    }

    /// Reveals the hole card.
    pub const fn reveal_hole(&mut self) {
        self.hole_revealed = true;
    }

    /// Best blackjack total for the full hand.
    #[must_use]
    pub fn value(&self) -> u8 {
        evaluate(&self.cards).0
    }

    /// Returns whether the hand is a natural blackjack.
    #[must_use]
    pub fn is_blackjack(&self) -> bool {
        self.cards.len() == 2 && self.value() == 21
    }

    /// Returns whether the hand is bust.
    #[must_use]
    pub fn is_bust(&self) -> bool {
        self.value() > 21
    }

    /// Number of cards in the hand.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Returns whether the hand is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl Default for DealerHand {
    fn default() -> Self {
        Self::new()
    }
}
