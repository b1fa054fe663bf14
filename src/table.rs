//! The table service: bet validation, per-user serialization, and the
//! orchestration of rounds against the persistence gateway.
//!
//! Every operation performs at most one gateway write. A round that
//! continues is written back together with any extra debit; a round that
//! ends is settled (credit, delete, ledger append) in one call. The gateway
//! is therefore never left holding a settled round.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TableError;
use crate::options::TableOptions;
use crate::result::{ActOutcome, RoundView, SettlementView};
use crate::round::Round;
use crate::store::{Gateway, UserId};
use crate::sync;

/// A player action on one spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Draw one card.
    Hit,
    /// Stop drawing.
    Stand,
    /// Double the wager, draw exactly one card, and stand.
    Double,
    /// Break a pair into two spots.
    Split,
}

/// A blackjack table bound to a gateway.
///
/// The table is shared behind `&self`; operations for the same user are
/// serialized on a per-user lock, so two concurrent requests can never both
/// act on one stored round. Different users proceed in parallel.
pub struct Table {
    gateway: Arc<dyn Gateway>,
    options: TableOptions,
    rng: sync::Mutex<ChaCha8Rng>,
    user_locks: sync::Mutex<HashMap<UserId, Arc<sync::Mutex<()>>>>,
}

impl Table {
    /// Creates a table over a gateway. The seed fixes the shuffle sequence,
    /// which is only useful in tests; production callers should seed from
    /// entropy.
    #[must_use]
    pub fn new(gateway: Arc<dyn Gateway>, options: TableOptions, seed: u64) -> Self {
        Self {
            gateway,
            options,
            rng: sync::Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
            user_locks: sync::Mutex::new(HashMap::new()),
        }
    }

    /// The table's configuration.
    #[must_use]
    pub const fn options(&self) -> &TableOptions {
        &self.options
    }

    fn user_lock(&self, user: UserId) -> Arc<sync::Mutex<()>> {
        let mut locks = self.user_locks.lock();
        // A strong count of 1 means no operation holds the lock; dropping
        // those entries keeps the registry from growing with every user
        // ever seen.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(
            locks
                .entry(user)
                .or_insert_with(|| Arc::new(sync::Mutex::new(()))),
        )
    }

    /// Starts a round: validates the bets, debits the total stake, deals,
    /// and stores the round.
    ///
    /// If a round is already stored for the user and the table has an idle
    /// expiry configured, an expired round is abandoned with its stakes
    /// refunded before the new one starts; otherwise the call fails with
    /// [`TableError::RoundInProgress`].
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidBet`] for an empty bet map, an empty
    /// spot name, or a wager outside the table bounds;
    /// [`TableError::InsufficientBalance`] when the balance cannot cover
    /// the total stake; [`TableError::RoundInProgress`] as above.
    pub fn start_round(
        &self,
        user: UserId,
        bets: &BTreeMap<String, Decimal>,
    ) -> Result<RoundView, TableError> {
        if bets.is_empty() {
            return Err(TableError::InvalidBet {
                reason: "no bets placed".to_string(),
            });
        }
        for (spot, &wager) in bets {
            if spot.is_empty() {
                return Err(TableError::InvalidBet {
                    reason: "empty spot name".to_string(),
                });
            }
            if wager <= Decimal::ZERO {
                return Err(TableError::InvalidBet {
                    reason: format!("non-positive wager on {spot}"),
                });
            }
            if wager < self.options.min_bet || wager > self.options.max_bet {
                return Err(TableError::InvalidBet {
                    reason: format!(
                        "wager on {spot} outside table limits ({} to {})",
                        self.options.min_bet, self.options.max_bet
                    ),
                });
            }
        }

        let lock = self.user_lock(user);
        let _guard = lock.lock();

        if let Some(stored) = self.gateway.active_round(user)? {
            let expired = match self.options.round_expiry {
                Some(expiry) => {
                    let existing = Round::from_stored(user, &stored)?;
                    if Utc::now() - existing.created_at() >= expiry {
                        warn!(
                            "user {user}: abandoning idle round {}, refunding {}",
                            existing.id(),
                            existing.stake_total()
                        );
                        self.gateway.abandon_round(user, existing.stake_total())?;
                        true
                    } else {
                        false
                    }
                }
                None => false,
            };
            if !expired {
                return Err(TableError::RoundInProgress);
            }
        }

        let total: Decimal = bets.values().copied().sum();
        let available = self.gateway.balance(user)?;
        if available < total {
            return Err(TableError::InsufficientBalance {
                needed: total,
                available,
            });
        }

        let round = {
            let mut rng = self.rng.lock();
            Round::deal(user, bets, &self.options, &mut *rng)?
        };
        let snapshot = round.to_stored()?;
        self.gateway.debit_and_put_round(user, total, &snapshot)?;

        info!(
            "user {user}: started round {} with {} spot(s), stake {total}",
            round.id(),
            bets.len()
        );
        Ok(round.view())
    }

    /// Applies a player action to one spot of the user's active round.
    ///
    /// When the action leaves every spot terminal, the dealer plays out and
    /// the round settles in the same call; the outcome says which happened.
    /// A stored round that is already fully terminal (dealt naturals, or
    /// imported data) settles immediately without applying the action.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::NoActiveRound`] when nothing is stored for the
    /// user, plus the structural and balance errors of the individual
    /// actions.
    pub fn act(&self, user: UserId, spot: &str, action: Action) -> Result<ActOutcome, TableError> {
        let lock = self.user_lock(user);
        let _guard = lock.lock();

        let stored = self
            .gateway
            .active_round(user)?
            .ok_or(TableError::NoActiveRound)?;
        let mut round = Round::from_stored(user, &stored)?;

        let mut extra_debit = Decimal::ZERO;
        if round.all_terminal() {
            debug!("user {user}: round {} already terminal, settling", round.id());
        } else {
            match action {
                Action::Hit => {
                    round.hit(spot)?;
                }
                Action::Stand => {
                    round.stand(spot)?;
                }
                Action::Double => {
                    extra_debit = self.check_double(user, &round, spot)?;
                    round.double(spot)?;
                }
                Action::Split => {
                    extra_debit = self.check_split(user, &round, spot)?;
                    round.split(spot, self.options.split_limit)?;
                }
            }
        }

        if round.all_terminal() {
            round.dealer_play()?;
            let settlement = round.settle(&self.options);
            let net = settlement.total_payout - extra_debit;
            let new_balance = self.gateway.settle_round(user, net, &settlement.entries)?;

            info!(
                "user {user}: round {} settled, payout {}, balance {new_balance}",
                round.id(),
                settlement.total_payout
            );
            Ok(ActOutcome::Settled(SettlementView {
                round: round.id(),
                dealer: round.dealer().cards().to_vec(),
                dealer_value: round.dealer().value(),
                results: settlement.results,
                total_payout: settlement.total_payout,
                new_balance,
            }))
        } else {
            let snapshot = round.to_stored()?;
            self.gateway.debit_and_put_round(user, extra_debit, &snapshot)?;
            Ok(ActOutcome::InPlay(round.view()))
        }
    }

    /// The user's active round, as the player sees it.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::NoActiveRound`] when nothing is stored.
    pub fn active_round(&self, user: UserId) -> Result<RoundView, TableError> {
        let stored = self
            .gateway
            .active_round(user)?
            .ok_or(TableError::NoActiveRound)?;
        Ok(Round::from_stored(user, &stored)?.view())
    }

    /// Validates a double before the round is touched and returns the extra
    /// debit. The doubled wager must stay within the table maximum.
    fn check_double(&self, user: UserId, round: &Round, spot: &str) -> Result<Decimal, TableError> {
        let hand = round.spot(spot)?;
        if hand.is_terminal() {
            return Err(TableError::SpotAlreadyTerminal {
                spot: spot.to_string(),
            });
        }
        if hand.len() != 2 {
            return Err(TableError::IllegalDouble);
        }
        let wager = hand.wager();
        if wager * Decimal::from(2) > self.options.max_bet {
            return Err(TableError::InvalidBet {
                reason: format!(
                    "doubled wager on {spot} exceeds the table maximum {}",
                    self.options.max_bet
                ),
            });
        }
        self.check_funds(user, wager)?;
        Ok(wager)
    }

    /// Validates a split before the round is touched and returns the extra
    /// debit.
    fn check_split(&self, user: UserId, round: &Round, spot: &str) -> Result<Decimal, TableError> {
        let hand = round.spot(spot)?;
        if hand.is_terminal() {
            return Err(TableError::SpotAlreadyTerminal {
                spot: spot.to_string(),
            });
        }
        if !hand.can_split() || round.splits_made() >= usize::from(self.options.split_limit) {
            return Err(TableError::IllegalSplit);
        }
        self.check_funds(user, hand.wager())?;
        Ok(hand.wager())
    }

    fn check_funds(&self, user: UserId, needed: Decimal) -> Result<(), TableError> {
        let available = self.gateway.balance(user)?;
        if available < needed {
            return Err(TableError::InsufficientBalance { needed, available });
        }
        Ok(())
    }
}
