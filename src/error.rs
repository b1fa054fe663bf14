//! Error types for table operations.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors from the persistence gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No user with the given id.
    #[error("user not found")]
    UserNotFound,
    /// A debit would take the balance below zero.
    #[error("insufficient balance in store")]
    InsufficientBalance,
    /// A round snapshot could not be encoded or decoded.
    #[error("round snapshot encoding failed: {0}")]
    Encoding(String),
}

/// Errors from normalizing persisted hand data.
///
/// Stored hands can arrive in several legacy shapes; anything that cannot be
/// resolved to a concrete card (or the hidden-card sentinel) is rejected
/// rather than skipped, so a bad card can never corrupt ace accounting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandCodecError {
    /// The stored hand is not an array.
    #[error("stored hand is not an array")]
    NotAnArray,
    /// Sub-hands may only be nested one level deep.
    #[error("stored hand is nested more than one level deep")]
    TooDeeplyNested,
    /// A card element had an unrecognized shape.
    #[error("unrecognized card encoding: {0}")]
    UnrecognizedCard(String),
    /// A card rank could not be resolved.
    #[error("unrecognized card rank: {0}")]
    UnrecognizedRank(String),
}

/// Errors returned by [`Table`](crate::Table) operations.
///
/// Every variant is a recoverable per-request condition; none of them leave
/// the round, the balance, or the ledger partially mutated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    /// Empty bet map, non-positive wager, or wager outside the table bounds.
    #[error("invalid bet: {reason}")]
    InvalidBet {
        /// Human-readable description of the rejected bet.
        reason: String,
    },
    /// Balance below the required debit.
    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance {
        /// Amount the operation would debit.
        needed: Decimal,
        /// Balance on file.
        available: Decimal,
    },
    /// Action attempted with no round on file for the user.
    #[error("no active round")]
    NoActiveRound,
    /// A round is already in progress for the user.
    #[error("a round is already in progress")]
    RoundInProgress,
    /// Action references a spot name not present in the round.
    #[error("unknown spot: {spot}")]
    UnknownSpot {
        /// The spot name from the request.
        spot: String,
    },
    /// Action attempted on a hand that already busted or stood.
    #[error("spot already terminal: {spot}")]
    SpotAlreadyTerminal {
        /// The spot name from the request.
        spot: String,
    },
    /// Double requires exactly two cards in the hand.
    #[error("cannot double down on this hand")]
    IllegalDouble,
    /// Split requires exactly two cards of equal rank, within the split limit.
    #[error("cannot split this hand")]
    IllegalSplit,
    /// The shoe ran out of cards mid-round.
    #[error("shoe exhausted")]
    ShoeExhausted,
    /// Persisted hand data could not be normalized.
    #[error("malformed stored hand: {0}")]
    MalformedHand(#[from] HandCodecError),
    /// The persistence gateway failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
