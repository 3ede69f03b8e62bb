//! Durable-state layer and services for the ledger core.
//!
//! All ledger state sits behind a single in-memory [`LedgerStore`]; its
//! write lock is the transactional boundary required by the posting
//! protocol (entry state flip + every bucket update commit together, or
//! not at all). The services are thin facades over the store:
//!
//! - [`AccountRegistry`] — chart of accounts lifecycle + balance queries
//! - [`JournalEngine`] — draft creation, posting, reversal, history
//! - [`Reports`] — the statement generator's [`LedgerView`] over the store
//!
//! [`LedgerView`]: tillbooks_ledger::LedgerView

pub mod engine;
pub mod registry;
pub mod reports;
mod store;

#[cfg(test)]
mod integration_tests;

pub use engine::JournalEngine;
pub use registry::AccountRegistry;
pub use reports::Reports;
pub use store::LedgerStore;
