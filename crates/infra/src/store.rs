//! In-memory durable store for the ledger core.
//!
//! One `RwLock` guards the whole state. Posting takes the write lock once
//! and commits the entry flip together with every bucket mutation inside
//! that scope, which gives the all-or-nothing semantics the posting
//! protocol requires and serializes concurrent posts that contend on the
//! same (organization, account, period) bucket. Entry-number sequences
//! live under the same lock, so allocation is atomic rather than the racy
//! read-then-increment this replaces.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;

use tillbooks_core::{AccountId, JournalEntryId, Money, OrganizationId};
use tillbooks_ledger::{
    AccountLedger, ChartOfAccounts, EntryType, JournalEntry, LedgerError, LedgerResult,
};

/// Key for the per-(prefix, date) entry-number counters.
///
/// Deliberately not scoped by organization: entry numbers are globally
/// unique, so organizations posting the same entry type on the same date
/// draw from one shared counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct SequenceKey {
    pub prefix: &'static str,
    pub date: NaiveDate,
}

impl SequenceKey {
    pub fn new(entry_type: EntryType, date: NaiveDate) -> Self {
        Self {
            prefix: entry_type.prefix(),
            date,
        }
    }
}

/// The four durable record families plus the number sequences.
#[derive(Debug, Default)]
pub(crate) struct LedgerState {
    pub charts: HashMap<OrganizationId, ChartOfAccounts>,
    pub entries: HashMap<JournalEntryId, JournalEntry>,
    pub ledgers: HashMap<(OrganizationId, AccountId), AccountLedger>,
    pub sequences: HashMap<SequenceKey, u32>,
}

impl LedgerState {
    pub fn chart(&self, organization: OrganizationId) -> Option<&ChartOfAccounts> {
        self.charts.get(&organization)
    }

    pub fn chart_mut(&mut self, organization: OrganizationId) -> &mut ChartOfAccounts {
        self.charts
            .entry(organization)
            .or_insert_with(|| ChartOfAccounts::new(organization))
    }

    /// Allocate the next entry-number sequence. Monotonic per key; numbers
    /// are never reused, even for entries that are later reversed.
    pub fn next_sequence(&mut self, key: SequenceKey) -> u32 {
        let counter = self.sequences.entry(key).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Every account referenced by the entry must exist in the
    /// organization's chart before any mutation happens.
    pub fn check_accounts_exist(&self, entry: &JournalEntry) -> LedgerResult<()> {
        let chart = self.chart(entry.organization());
        for line in entry.lines() {
            let known = chart.is_some_and(|c| c.contains(line.account()));
            if !known {
                return Err(LedgerError::AccountNotFound { id: line.account() });
            }
        }
        Ok(())
    }

    /// Net debit−credit over all posted lines on the account with entry
    /// date ≤ `as_of`. This is the authoritative point-in-time balance;
    /// buckets are only a rollup cache of it.
    pub fn balance_as_of(
        &self,
        organization: OrganizationId,
        account: AccountId,
        as_of: NaiveDate,
    ) -> LedgerResult<Money> {
        let known = self.chart(organization).is_some_and(|c| c.contains(account));
        if !known {
            return Err(LedgerError::AccountNotFound { id: account });
        }

        let mut net: i128 = 0;
        for entry in self.entries.values() {
            if entry.organization() != organization || !entry.is_posted() || entry.date() > as_of {
                continue;
            }
            for line in entry.lines() {
                if line.account() == account {
                    net += line.debit_amount().minor() as i128;
                    net -= line.credit_amount().minor() as i128;
                }
            }
        }
        Ok(Money::try_from_minor_wide(net)?)
    }

    /// Posted entries for the organization sorted by (date, number).
    pub fn posted_entries_sorted(&self, organization: OrganizationId) -> Vec<&JournalEntry> {
        let mut entries: Vec<&JournalEntry> = self
            .entries
            .values()
            .filter(|e| e.organization() == organization && e.is_posted())
            .collect();
        entries.sort_by(|a, b| a.date().cmp(&b.date()).then_with(|| a.number().cmp(b.number())));
        entries
    }
}

/// Process-wide ledger storage.
///
/// Poisoned locks (a panic while holding the guard) surface as
/// [`LedgerError::Storage`]; they are never unwrapped away.
#[derive(Debug, Default)]
pub struct LedgerStore {
    state: RwLock<LedgerState>,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn read(&self) -> LedgerResult<RwLockReadGuard<'_, LedgerState>> {
        self.state
            .read()
            .map_err(|_| LedgerError::storage("ledger store lock poisoned"))
    }

    pub(crate) fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, LedgerState>> {
        self.state
            .write()
            .map_err(|_| LedgerError::storage("ledger store lock poisoned"))
    }
}
