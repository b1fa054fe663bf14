//! A multi-spot blackjack table engine with settlement and a ledger.
//!
//! The crate provides a [`Table`] service that runs complete rounds against
//! a pluggable [`Gateway`]: bets are validated and debited, spots are played
//! with hit, stand, double, and split, and the dealer plays out and settles
//! automatically once every spot is terminal. Settlement credits the balance
//! and appends net win and loss rows to an append-only ledger, all in a
//! single gateway write.
//!
//! Rounds persisted by earlier revisions of the system are accepted as-is:
//! their mixed hand encodings are normalized once at load time by the
//! [`codec`] module.
//!
//! # Example
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//!
//! use bjtable::{Action, MemoryGateway, Table, TableOptions};
//! use rust_decimal::Decimal;
//!
//! # fn main() -> Result<(), bjtable::TableError> {
//! let gateway = Arc::new(MemoryGateway::new());
//! gateway.register_user(1, Decimal::from(1000));
//!
//! let table = Table::new(gateway, TableOptions::default(), 42);
//!
//! let mut bets = BTreeMap::new();
//! bets.insert("spot1".to_string(), Decimal::from(50));
//! let view = table.start_round(1, &bets)?;
//! println!("dealer shows {:?}", view.dealer);
//!
//! let outcome = table.act(1, "spot1", Action::Stand)?;
//! if let Some(settled) = outcome.settled() {
//!     println!("balance: {}", settled.new_balance);
//! }
//! # Ok(())
//! # }
//! ```

pub mod card;
pub mod codec;
pub mod error;
pub mod hand;
pub mod ledger;
pub mod options;
pub mod result;
pub mod round;
pub mod store;
pub mod table;
mod sync;

// Re-export main types
pub use card::{Card, DECK_SIZE, SUITS, Suit};
pub use codec::{DecodedHand, HIDDEN, decode_card, decode_hand};
pub use error::{HandCodecError, StoreError, TableError};
pub use hand::{DealerHand, SpotHand, SpotStatus, evaluate};
pub use ledger::{LedgerEntry, LedgerKind};
pub use options::TableOptions;
pub use result::{ActOutcome, RoundView, SettlementView, SpotOutcome, SpotResult};
pub use round::{Round, RoundState, Settlement};
pub use store::{Gateway, MemoryGateway, UserId};
pub use table::{Action, Table};
