//! chash: a fixed-size, string-keyed hash table with separate chaining.
//!
//! Internal Design:
//!
//! Summary
//! - `ChainedTable<V, H>` owns an array of `N` slot heads fixed at
//!   construction. A key lives in slot `hash(key) % N`; keys sharing a slot
//!   form a chain kept in insertion order.
//! - Chain nodes are stored in a `SlotMap` arena and linked by generational
//!   keys, so a removed node can never be reached again and every node is
//!   owned by exactly one table.
//! - The default hash is djb2 with multiplier 33 seeded at 0, folded over
//!   the key bytes into a wrapping `u64` (see [`djb2`]). Another hash can be
//!   plugged in through [`KeyHasher`] and `ChainedTable::with_hasher`.
//!
//! Constraints
//! - No resizing or rehashing; `size()` never changes.
//! - Keys are unique across the whole table. `put` on an existing key
//!   replaces the value in place without moving the entry.
//! - The table copies every key it stores and never aliases the caller's
//!   buffer. Values are opaque: stored, returned, never inspected.
//! - Single-threaded. All mutation goes through `&mut self`.
//!
//! Failure model
//! - Absence is `None` (`get`, `delete`, `find`).
//! - Construction with zero slots is `TableError::InvalidSize`.
//! - A slot array, key copy, or entry node that cannot be allocated is
//!   `TableError::AllocationFailure`. Fallible allocations happen before
//!   anything is linked, so a failed `put` leaves the table as it was.
//!
//! Diagnostics
//! - `dump()` snapshots every occupied slot with its chain, for printing.
//! - Structural events are emitted at `trace` level through the `log`
//!   facade; errors are returned, not logged.

pub mod chained_table;
mod chained_table_proptest;
pub mod dump;
mod error;
pub mod hasher;

// Public surface
pub use chained_table::{Chain, ChainedTable, Handle, Iter};
pub use dump::{Dump, SlotDump};
pub use error::TableError;
pub use hasher::{djb2, Djb2, KeyHasher};
