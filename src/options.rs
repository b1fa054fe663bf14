//! Table configuration options.

use chrono::Duration;
use rust_decimal::Decimal;

/// Configuration for a blackjack table.
///
/// Use the builder pattern to customize options:
///
/// ```
/// use bjtable::TableOptions;
/// use rust_decimal::Decimal;
///
/// let options = TableOptions::default()
///     .with_decks(1)
///     .with_max_bet(Decimal::new(100_000, 2));
/// assert_eq!(options.decks, 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TableOptions {
    /// Number of decks in the shoe (6 for the production shoe, 1 for
    /// single-deck play).
    pub decks: u8,
    /// Smallest wager accepted per spot.
    pub min_bet: Decimal,
    /// Largest wager accepted per spot, also the cap after doubling.
    pub max_bet: Decimal,
    /// Payout ratio for a natural blackjack (1.5 = 3:2).
    pub blackjack_pays: Decimal,
    /// Maximum number of splits per round.
    pub split_limit: u8,
    /// Age after which an untouched round may be abandoned (stakes refunded)
    /// when the user starts a new one. `None` disables expiry.
    pub round_expiry: Option<Duration>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            decks: 6,
            min_bet: Decimal::new(500, 2),
            max_bet: Decimal::new(50_000, 2),
            blackjack_pays: Decimal::new(15, 1),
            split_limit: 3,
            round_expiry: None,
        }
    }
}

impl TableOptions {
    /// Sets the number of decks.
    #[must_use]
    pub const fn with_decks(mut self, decks: u8) -> Self {
        self.decks = decks;
        self
    }

    /// Sets the minimum wager per spot.
    #[must_use]
    pub const fn with_min_bet(mut self, min_bet: Decimal) -> Self {
        self.min_bet = min_bet;
        self
    }

    /// Sets the maximum wager per spot.
    #[must_use]
    pub const fn with_max_bet(mut self, max_bet: Decimal) -> Self {
        self.max_bet = max_bet;
        self
    }

    /// Sets the natural blackjack payout ratio.
    ///
    /// ```
    /// use bjtable::TableOptions;
    /// use rust_decimal::Decimal;
    ///
    /// // 6:5 table
    /// let options = TableOptions::default().with_blackjack_pays(Decimal::new(12, 1));
    /// assert_eq!(options.blackjack_pays, Decimal::new(12, 1));
    /// ```
    #[must_use]
    pub const fn with_blackjack_pays(mut self, ratio: Decimal) -> Self {
        self.blackjack_pays = ratio;
        self
    }

    /// Sets the maximum number of splits per round.
    #[must_use]
    pub const fn with_split_limit(mut self, split_limit: u8) -> Self {
        self.split_limit = split_limit;
        self
    }

    /// Sets the idle-round expiry.
    #[must_use]
    pub const fn with_round_expiry(mut self, expiry: Option<Duration>) -> Self {
        self.round_expiry = expiry;
        self
    }
}
