//! Persistence gateway for balances, active rounds, and the ledger.
//!
//! The trait groups reads and multi-step writes so that a backend can make
//! each method one transaction. The engine never performs two gateway writes
//! for a single player operation.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::StoreError;
use crate::ledger::LedgerEntry;
use crate::sync;

/// Identifier of a player account.
pub type UserId = u64;

/// Storage backend for the table.
///
/// `debit_and_put_round`, `settle_round`, and `abandon_round` each bundle a
/// balance movement with a round write; implementations backed by a database
/// should run each one atomically.
pub trait Gateway: Send + Sync {
    /// Current balance of a user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UserNotFound`] if the user does not exist.
    fn balance(&self, user: UserId) -> Result<Decimal, StoreError>;

    /// Adds `amount` to a user's balance and returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UserNotFound`] if the user does not exist.
    fn credit(&self, user: UserId, amount: Decimal) -> Result<Decimal, StoreError>;

    /// The user's active round snapshot, if one is stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UserNotFound`] if the user does not exist.
    fn active_round(&self, user: UserId) -> Result<Option<Value>, StoreError>;

    /// Stores (or replaces) the user's active round snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UserNotFound`] if the user does not exist.
    fn put_round(&self, user: UserId, round: &Value) -> Result<(), StoreError>;

    /// Debits `amount` from the balance and stores the round snapshot, as
    /// one unit.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InsufficientBalance`] if the balance cannot
    /// cover the debit; the snapshot is not written in that case.
    fn debit_and_put_round(
        &self,
        user: UserId,
        amount: Decimal,
        round: &Value,
    ) -> Result<Decimal, StoreError>;

    /// Finishes a round: credits the net amount (which can be negative when
    /// the final action added a debit), deletes the active round, and
    /// appends the ledger entries, as one unit.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UserNotFound`] if the user does not exist, or
    /// [`StoreError::InsufficientBalance`] if a negative net would take the
    /// balance below zero.
    fn settle_round(
        &self,
        user: UserId,
        net: Decimal,
        entries: &[LedgerEntry],
    ) -> Result<Decimal, StoreError>;

    /// Deletes the active round and credits a stake refund, as one unit.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UserNotFound`] if the user does not exist.
    fn abandon_round(&self, user: UserId, refund: Decimal) -> Result<(), StoreError>;

    /// All ledger entries for a user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UserNotFound`] if the user does not exist.
    fn ledger(&self, user: UserId) -> Result<Vec<LedgerEntry>, StoreError>;
}

/// In-memory [`Gateway`], used in tests and as the reference semantics for
/// real backends.
#[derive(Default)]
pub struct MemoryGateway {
    users: sync::Mutex<HashMap<UserId, Decimal>>,
    rounds: sync::Mutex<HashMap<UserId, Value>>,
    entries: sync::Mutex<Vec<LedgerEntry>>,
}

impl MemoryGateway {
    /// Creates an empty gateway with no users.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user with a starting balance, replacing any existing
    /// balance.
    pub fn register_user(&self, user: UserId, balance: Decimal) {
        self.users.lock().insert(user, balance);
    }

    fn checked_balance(&self, user: UserId) -> Result<Decimal, StoreError> {
        self.users
            .lock()
            .get(&user)
            .copied()
            .ok_or(StoreError::UserNotFound)
    }
}

impl Gateway for MemoryGateway {
    fn balance(&self, user: UserId) -> Result<Decimal, StoreError> {
        self.checked_balance(user)
    }

    fn credit(&self, user: UserId, amount: Decimal) -> Result<Decimal, StoreError> {
        let mut users = self.users.lock();
        let balance = users.get_mut(&user).ok_or(StoreError::UserNotFound)?;
        *balance += amount;
        Ok(*balance)
    }

    fn active_round(&self, user: UserId) -> Result<Option<Value>, StoreError> {
        self.checked_balance(user)?;
        Ok(self.rounds.lock().get(&user).cloned())
    }

    fn put_round(&self, user: UserId, round: &Value) -> Result<(), StoreError> {
        self.checked_balance(user)?;
        self.rounds.lock().insert(user, round.clone());
        Ok(())
    }

    fn debit_and_put_round(
        &self,
        user: UserId,
        amount: Decimal,
        round: &Value,
    ) -> Result<Decimal, StoreError> {
        let mut users = self.users.lock();
        let balance = users.get_mut(&user).ok_or(StoreError::UserNotFound)?;
        if *balance < amount {
            return Err(StoreError::InsufficientBalance);
        }
        *balance -= amount;
        self.rounds.lock().insert(user, round.clone());
        Ok(*balance)
    }

    fn settle_round(
        &self,
        user: UserId,
        net: Decimal,
        entries: &[LedgerEntry],
    ) -> Result<Decimal, StoreError> {
        let mut users = self.users.lock();
        let balance = users.get_mut(&user).ok_or(StoreError::UserNotFound)?;
        if *balance + net < Decimal::ZERO {
            return Err(StoreError::InsufficientBalance);
        }
        *balance += net;
        self.rounds.lock().remove(&user);
        self.entries.lock().extend_from_slice(entries);
        Ok(*balance)
    }

    fn abandon_round(&self, user: UserId, refund: Decimal) -> Result<(), StoreError> {
        let mut users = self.users.lock();
        let balance = users.get_mut(&user).ok_or(StoreError::UserNotFound)?;
        *balance += refund;
        self.rounds.lock().remove(&user);
        Ok(())
    }

    fn ledger(&self, user: UserId) -> Result<Vec<LedgerEntry>, StoreError> {
        self.checked_balance(user)?;
        Ok(self
            .entries
            .lock()
            .iter()
            .filter(|entry| entry.user == user)
            .cloned()
            .collect())
    }
}
