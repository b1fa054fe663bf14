//! Append-only ledger of balance-affecting events.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::UserId;

/// Kind of a ledger entry. The amount is always positive; the kind carries
/// the direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerKind {
    /// Stake placed outside a round (purchases, bonuses).
    Bet,
    /// Net profit credited by a round settlement.
    Win,
    /// Net stakes lost in a round settlement.
    Loss,
}

/// One immutable ledger record. Entries are only ever appended, never
/// updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// The user the entry belongs to.
    pub user: UserId,
    /// Positive amount.
    pub amount: Decimal,
    /// Direction of the event.
    pub kind: LedgerKind,
    /// The round that produced the entry, if any.
    pub game: Option<Uuid>,
    /// When the entry was written.
    pub timestamp: DateTime<Utc>,
}

impl LedgerEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(user: UserId, kind: LedgerKind, amount: Decimal, game: Option<Uuid>) -> Self {
        Self {
            user,
            amount,
            kind,
            game,
            timestamp: Utc::now(),
        }
    }
}
