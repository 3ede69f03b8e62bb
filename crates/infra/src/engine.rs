//! Journal Engine service: draft creation, posting, and reversal.
//!
//! Posting is the one correctness-critical transactional boundary in the
//! core. `post` validates everything first, stages every bucket mutation
//! on clones, and only then commits the clones together with the entry's
//! posted flag — all inside a single write-lock scope. A failure at any
//! step leaves the entry in Draft with no ledger mutation at all.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::info;

use tillbooks_core::{AccountId, JournalEntryId, OrganizationId, UserId};
use tillbooks_ledger::{
    AccountLedger, EntryRequest, EntryType, JournalEntry, JournalLine, LedgerError, LedgerResult,
    LineRequest, entry_number,
};

use crate::store::{LedgerStore, SequenceKey};

#[derive(Debug, Clone)]
pub struct JournalEngine {
    store: Arc<LedgerStore>,
}

impl JournalEngine {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }

    /// Create a draft entry from an inbound request.
    ///
    /// Structural validation only: ≥ 2 lines, each single-sided, every
    /// account known to the organization's chart. Entry-level balance is
    /// deliberately not required until post time.
    pub fn create_entry(&self, request: EntryRequest) -> LedgerResult<JournalEntry> {
        let lines: Vec<JournalLine> = request
            .lines
            .into_iter()
            .map(LineRequest::into_line)
            .collect::<LedgerResult<_>>()?;

        let mut state = self.store.write()?;

        for line in &lines {
            let known = state
                .chart(request.organization)
                .is_some_and(|c| c.contains(line.account()));
            if !known {
                return Err(LedgerError::AccountNotFound { id: line.account() });
            }
        }

        let sequence = state.next_sequence(SequenceKey::new(request.entry_type, request.date));
        let number = entry_number(request.entry_type, request.date, sequence);

        let entry = JournalEntry::draft(
            JournalEntryId::new(),
            request.organization,
            request.branch,
            number,
            request.date,
            request.description,
            request.reference,
            request.entry_type,
            lines,
        )?;
        state.entries.insert(entry.id(), entry.clone());
        info!(number = %entry.number(), organization = %entry.organization(), "journal entry drafted");
        Ok(entry)
    }

    /// Append a line to a draft entry (incremental composition).
    pub fn add_line(&self, entry_id: JournalEntryId, line: LineRequest) -> LedgerResult<()> {
        let line = line.into_line()?;
        let mut state = self.store.write()?;

        let organization = state
            .entries
            .get(&entry_id)
            .map(JournalEntry::organization)
            .ok_or(LedgerError::EntryNotFound { id: entry_id })?;
        let known = state
            .chart(organization)
            .is_some_and(|c| c.contains(line.account()));
        if !known {
            return Err(LedgerError::AccountNotFound { id: line.account() });
        }

        state
            .entries
            .get_mut(&entry_id)
            .ok_or(LedgerError::EntryNotFound { id: entry_id })?
            .add_line(line)
    }

    pub fn get_entry(&self, entry_id: JournalEntryId) -> LedgerResult<JournalEntry> {
        let state = self.store.read()?;
        state
            .entries
            .get(&entry_id)
            .cloned()
            .ok_or(LedgerError::EntryNotFound { id: entry_id })
    }

    /// Balance preview for UIs; same predicate posting uses.
    pub fn is_balanced(&self, entry_id: JournalEntryId) -> LedgerResult<bool> {
        Ok(self.get_entry(entry_id)?.is_balanced())
    }

    /// Post a draft entry.
    ///
    /// Idempotency is keyed by the entry id: retrying a post whose first
    /// attempt committed observes [`LedgerError::AlreadyPosted`] and never
    /// double-applies a bucket mutation.
    pub fn post(&self, entry_id: JournalEntryId, actor: UserId) -> LedgerResult<()> {
        let mut state = self.store.write()?;
        Self::post_locked(&mut state, entry_id, actor)
    }

    /// Posting body, shared with `reverse`. Caller holds the write lock.
    fn post_locked(
        state: &mut crate::store::LedgerState,
        entry_id: JournalEntryId,
        actor: UserId,
    ) -> LedgerResult<()> {
        let entry = state
            .entries
            .get(&entry_id)
            .ok_or(LedgerError::EntryNotFound { id: entry_id })?;
        if entry.is_posted() {
            return Err(LedgerError::AlreadyPosted {
                number: entry.number().to_string(),
            });
        }

        let (debits, credits) = entry.totals()?;
        if debits != credits {
            return Err(LedgerError::Unbalanced { debits, credits });
        }
        state.check_accounts_exist(entry)?;

        // Stage bucket mutations on clones; nothing durable moves yet.
        let entry = entry.clone();
        let organization = entry.organization();
        let mut staged: Vec<(AccountId, AccountLedger)> = Vec::new();
        for line in entry.lines() {
            let account = line.account();
            if !staged.iter().any(|(a, _)| *a == account) {
                let ledger = state
                    .ledgers
                    .get(&(organization, account))
                    .cloned()
                    .unwrap_or_default();
                staged.push((account, ledger));
            }
        }
        for line in entry.lines() {
            let account = line.account();
            if let Some((_, ledger)) = staged.iter_mut().find(|(a, _)| *a == account) {
                ledger.apply(entry.date(), line.debit_amount(), line.credit_amount())?;
            }
        }

        // Commit: buckets and the posted flag flip together.
        for (account, ledger) in staged {
            state.ledgers.insert((organization, account), ledger);
        }
        state
            .entries
            .get_mut(&entry_id)
            .ok_or(LedgerError::EntryNotFound { id: entry_id })?
            .mark_posted(actor, Utc::now())?;

        info!(
            number = %entry.number(),
            %organization,
            debits = %debits,
            "journal entry posted"
        );
        Ok(())
    }

    /// Reverse a posted entry: a new entry with every line debit/credit
    /// swapped, tagged as an adjustment, reference `REV-<number>`, posted
    /// immediately through the same atomic path. The reversal date
    /// defaults to the source entry's transaction date.
    pub fn reverse(
        &self,
        entry_id: JournalEntryId,
        actor: UserId,
        reversal_date: Option<NaiveDate>,
    ) -> LedgerResult<JournalEntry> {
        let mut state = self.store.write()?;

        let source = state
            .entries
            .get(&entry_id)
            .cloned()
            .ok_or(LedgerError::EntryNotFound { id: entry_id })?;
        let date = reversal_date.unwrap_or_else(|| source.date());

        let sequence = state.next_sequence(SequenceKey::new(EntryType::Adjustment, date));
        let number = entry_number(EntryType::Adjustment, date, sequence);

        // `reversal` enforces that the source is posted.
        let reversal = source.reversal(JournalEntryId::new(), number, date)?;
        let reversal_id = reversal.id();
        state.entries.insert(reversal_id, reversal);

        if let Err(err) = Self::post_locked(&mut state, reversal_id, actor) {
            // Keep the whole reversal all-or-nothing.
            state.entries.remove(&reversal_id);
            return Err(err);
        }

        let posted = state
            .entries
            .get(&reversal_id)
            .cloned()
            .ok_or(LedgerError::EntryNotFound { id: reversal_id })?;
        info!(
            number = %posted.number(),
            reverses = %source.number(),
            "journal entry reversed"
        );
        Ok(posted)
    }

    /// Period buckets for one account, for reconciliation against
    /// `balance_as_of`.
    pub fn account_ledger(
        &self,
        organization: OrganizationId,
        account: AccountId,
    ) -> LedgerResult<AccountLedger> {
        let state = self.store.read()?;
        Ok(state
            .ledgers
            .get(&(organization, account))
            .cloned()
            .unwrap_or_default())
    }
}
