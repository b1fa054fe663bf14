//! Dealer auto-play and settlement computation.

use log::debug;
use rust_decimal::Decimal;

use crate::card::Card;
use crate::error::TableError;
use crate::hand::SpotStatus;
use crate::ledger::{LedgerEntry, LedgerKind};
use crate::options::TableOptions;
use crate::result::{SpotOutcome, SpotResult};

use super::{Round, RoundState};

/// The computed outcome of a round: per-spot results, the single balance
/// credit, and the ledger rows to append.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    /// Per-spot results, in spot-name order.
    pub results: Vec<SpotResult>,
    /// Total credited back to the balance (stakes returned plus winnings).
    pub total_payout: Decimal,
    /// Net win and/or net loss rows for the ledger (at most one of each;
    /// pushes contribute nothing).
    pub entries: Vec<LedgerEntry>,
}

impl Round {
    /// Plays out the dealer's hand: reveal the hole card, then draw to 17.
    ///
    /// If every player spot busted there is no payout decision to make, so
    /// the dealer reveals and stops. Any 17 stands, soft or hard; the only
    /// ace handling is the generic reduction in hand evaluation.
    ///
    /// Returns the cards drawn.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::ShoeExhausted`] if the shoe empties while the
    /// dealer must draw.
    pub fn dealer_play(&mut self) -> Result<Vec<Card>, TableError> {
        self.state = RoundState::DealerTurn;
        self.dealer.reveal_hole();

        let mut drawn = Vec::new();
        if !self.any_live() {
            return Ok(drawn);
        }

        while self.dealer.value() < 17 {
            let card = self.draw()?;
            self.dealer.add_card(card);
            drawn.push(card);
        }
        debug!(
            "round {}: dealer drew {} card(s) to {}",
            self.id,
            drawn.len(),
            self.dealer.value()
        );

        Ok(drawn)
    }

    /// Resolves every spot against the dealer's final hand.
    ///
    /// Payouts follow the standard table: 2x the wager on a win, the wager
    /// back on a push, nothing on a loss. A natural blackjack pays at
    /// `options.blackjack_pays` (3:2 by default) unless the dealer also has
    /// a natural, which pushes. Spot payouts are summed into one credit, and
    /// the ledger receives the round's net win and net loss as single rows.
    #[must_use]
    pub fn settle(&mut self, options: &TableOptions) -> Settlement {
        let dealer_value = self.dealer.value();
        let dealer_bust = self.dealer.is_bust();
        let dealer_blackjack = self.dealer.is_blackjack();

        let two = Decimal::from(2);
        let mut results = Vec::with_capacity(self.spots.len());
        let mut total_payout = Decimal::ZERO;
        let mut win_total = Decimal::ZERO;
        let mut loss_total = Decimal::ZERO;

        for (name, hand) in &self.spots {
            let wager = hand.wager();
            let player_value = hand.value();

            let (outcome, payout) = match hand.status() {
                SpotStatus::Bust => {
                    loss_total += wager;
                    (SpotOutcome::Bust, Decimal::ZERO)
                }
                SpotStatus::Blackjack => {
                    if dealer_blackjack {
                        (SpotOutcome::Push, wager)
                    } else {
                        let profit = wager * options.blackjack_pays;
                        win_total += profit;
                        (SpotOutcome::Blackjack, wager + profit)
                    }
                }
                SpotStatus::Stand | SpotStatus::Active => {
                    if dealer_bust || player_value > dealer_value {
                        win_total += wager;
                        (SpotOutcome::Win, wager * two)
                    } else if player_value < dealer_value {
                        loss_total += wager;
                        (SpotOutcome::Loss, Decimal::ZERO)
                    } else {
                        (SpotOutcome::Push, wager)
                    }
                }
            };

            total_payout += payout;
            results.push(SpotResult {
                spot: name.clone(),
                outcome,
                wager,
                payout,
                player_value,
                dealer_value,
            });
        }

        let mut entries = Vec::new();
        if win_total > Decimal::ZERO {
            entries.push(LedgerEntry::new(
                self.user,
                LedgerKind::Win,
                win_total,
                Some(self.id),
            ));
        }
        if loss_total > Decimal::ZERO {
            entries.push(LedgerEntry::new(
                self.user,
                LedgerKind::Loss,
                loss_total,
                Some(self.id),
            ));
        }

        self.state = RoundState::Settled;

        Settlement {
            results,
            total_payout,
            entries,
        }
    }
}
