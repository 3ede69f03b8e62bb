//! Double-entry bookkeeping domain: chart of accounts, journal entries,
//! period buckets, and financial statements.
//!
//! Pure domain logic only: no IO, no locking, no persistence concerns.
//! The `tillbooks-infra` crate supplies durable state and the services
//! that orchestrate posting.

pub mod account;
pub mod buckets;
pub mod chart;
pub mod error;
pub mod journal;
pub mod statements;

pub use account::{Account, AccountType, NormalBalance};
pub use buckets::{AccountLedger, LedgerBucket, Period};
pub use chart::ChartOfAccounts;
pub use error::{LedgerError, LedgerResult};
pub use journal::{
    EntryRequest, EntryType, JournalEntry, JournalLine, LineRequest, PostedLine, entry_number,
};
pub use statements::{
    BalanceSheet, CashFlowStatement, LedgerView, TrialBalance, balance_sheet,
    cash_flow_statement, trial_balance,
};
