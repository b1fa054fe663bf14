//! Player actions on a round: hit, stand, double, split.
//!
//! Balance checks live in the [`Table`](crate::Table) service; these methods
//! only enforce the structural rules. Every precondition is verified before
//! the first card leaves the shoe.

use rust_decimal::Decimal;

use crate::card::Card;
use crate::error::TableError;
use crate::hand::{SpotHand, SpotStatus};

use super::Round;

impl Round {
    fn active_spot(&self, name: &str) -> Result<&SpotHand, TableError> {
        let hand = self.spot(name)?;
        if hand.is_terminal() {
            return Err(TableError::SpotAlreadyTerminal {
                spot: name.to_string(),
            });
        }
        Ok(hand)
    }

    fn active_spot_mut(&mut self, name: &str) -> Result<&mut SpotHand, TableError> {
        let hand = self
            .spots
            .get_mut(name)
            .ok_or_else(|| TableError::UnknownSpot {
                spot: name.to_string(),
            })?;
        if hand.is_terminal() {
            return Err(TableError::SpotAlreadyTerminal {
                spot: name.to_string(),
            });
        }
        Ok(hand)
    }

    /// Hit: draw one card into the spot's hand. Going over 21 marks the spot
    /// terminal.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown or terminal spot, or an exhausted
    /// shoe.
    pub fn hit(&mut self, name: &str) -> Result<Card, TableError> {
        self.active_spot(name)?;
        let card = self.draw()?;
        if let Ok(hand) = self.active_spot_mut(name) {
            hand.add_card(card);
        }
        Ok(card)
    }

    /// Stand: mark the spot terminal without drawing.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown or terminal spot.
    pub fn stand(&mut self, name: &str) -> Result<(), TableError> {
        let hand = self.active_spot_mut(name)?;
        hand.set_status(SpotStatus::Stand);
        Ok(())
    }

    /// Double down: double the recorded wager, draw exactly one card, and
    /// mark the spot terminal.
    ///
    /// Only legal on a two-card hand. The extra debit equal to the original
    /// wager is the caller's responsibility.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown or terminal spot, a hand that is not
    /// exactly two cards, or an exhausted shoe.
    pub fn double(&mut self, name: &str) -> Result<Card, TableError> {
        let hand = self.active_spot(name)?;
        if hand.len() != 2 {
            return Err(TableError::IllegalDouble);
        }

        let card = self.draw()?;
        if let Ok(hand) = self.active_spot_mut(name) {
            hand.double_wager();
            hand.add_card(card);
            if hand.status() == SpotStatus::Active {
                hand.set_status(SpotStatus::Stand);
            }
        }
        Ok(card)
    }

    /// Split: break a two-card pair into two independently played spots.
    ///
    /// The new spot takes a generated name (`split_<orig>`, uniquified when
    /// taken) and a wager equal to the original's; each resulting hand keeps
    /// one card of the pair and is dealt one fresh card. The extra debit is
    /// the caller's responsibility.
    ///
    /// Returns the new spot's name and the duplicated wager.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown or terminal spot, a hand that is not
    /// a two-card pair, a round already at the split limit, or an exhausted
    /// shoe.
    pub fn split(&mut self, name: &str, split_limit: u8) -> Result<(String, Decimal), TableError> {
        let hand = self.active_spot(name)?;
        if !hand.can_split() || self.splits_made() >= usize::from(split_limit) {
            return Err(TableError::IllegalSplit);
        }
        let wager = hand.wager();

        if self.cards_remaining() < 2 {
            return Err(TableError::ShoeExhausted);
        }
        let first_draw = self.draw()?;
        let second_draw = self.draw()?;

        let new_name = self.split_name(name);
        let mut new_hand = match self.active_spot_mut(name) {
            Ok(hand) => {
                let split_card = hand.take_split_card().ok_or(TableError::IllegalSplit)?;
                hand.add_card(first_draw);
                SpotHand::from_split(split_card, wager)
            }
            Err(err) => return Err(err),
        };
        new_hand.add_card(second_draw);
        self.spots.insert(new_name.clone(), new_hand);

        Ok((new_name, wager))
    }

    fn split_name(&self, base: &str) -> String {
        let mut name = format!("split_{base}");
        let mut suffix = 2;
        while self.spots.contains_key(&name) {
            name = format!("split_{base}_{suffix}");
            suffix += 1;
        }
        name
    }
}
