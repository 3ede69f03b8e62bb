//! Journal entries and lines: the draft → posted state machine.
//!
//! The posting orchestration (bucket application, sequencing, locking)
//! lives in `tillbooks-infra`; this module owns the entry/line types and
//! every structural invariant on them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tillbooks_core::{AccountId, BranchId, JournalEntryId, Money, OrganizationId, UserId};

use crate::error::{LedgerError, LedgerResult};

/// Entry-type tag; also decides the entry-number prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Manual,
    Sale,
    Purchase,
    Payment,
    Receipt,
    Expense,
    Adjustment,
    Closing,
    Opening,
}

impl EntryType {
    pub fn prefix(self) -> &'static str {
        match self {
            EntryType::Manual => "JRN",
            EntryType::Sale => "SAL",
            EntryType::Purchase => "PUR",
            EntryType::Payment => "PAY",
            EntryType::Receipt => "RCT",
            EntryType::Expense => "EXP",
            EntryType::Adjustment => "ADJ",
            EntryType::Closing => "CLS",
            EntryType::Opening => "OPN",
        }
    }
}

/// Format an entry number: `<PREFIX>-<YYYYMMDD>-<NNNN>`.
///
/// Sequences increase monotonically per (prefix, date) across all
/// organizations, making numbers globally unique; they are never reused,
/// even for entries that are later reversed.
pub fn entry_number(entry_type: EntryType, date: NaiveDate, sequence: u32) -> String {
    format!(
        "{}-{}-{:04}",
        entry_type.prefix(),
        date.format("%Y%m%d"),
        sequence
    )
}

/// One side of a journal entry.
///
/// Invariant: exactly one of debit/credit is strictly positive and the
/// other is exactly zero — a line is either a debit or a credit, never
/// both, never neither. The constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    account: AccountId,
    debit: Money,
    credit: Money,
    description: Option<String>,
}

impl JournalLine {
    pub fn new(
        account: AccountId,
        debit: Money,
        credit: Money,
        description: Option<String>,
    ) -> LedgerResult<Self> {
        let single_sided = (debit.is_positive() && credit.is_zero())
            || (credit.is_positive() && debit.is_zero());
        if !single_sided {
            return Err(LedgerError::SingleSidedLine { debit, credit });
        }
        Ok(Self {
            account,
            debit,
            credit,
            description,
        })
    }

    pub fn debit(account: AccountId, amount: Money, description: Option<String>) -> LedgerResult<Self> {
        Self::new(account, amount, Money::ZERO, description)
    }

    pub fn credit(account: AccountId, amount: Money, description: Option<String>) -> LedgerResult<Self> {
        Self::new(account, Money::ZERO, amount, description)
    }

    pub fn account(&self) -> AccountId {
        self.account
    }

    pub fn debit_amount(&self) -> Money {
        self.debit
    }

    pub fn credit_amount(&self) -> Money {
        self.credit
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Signed flow of this line: debit − credit. One side is always zero,
    /// so this cannot overflow for any line the constructors accept.
    pub fn flow(&self) -> LedgerResult<Money> {
        Ok(self.debit.checked_sub(self.credit)?)
    }

    /// The same line with debit and credit swapped. Swapping preserves the
    /// single-sided invariant.
    pub fn mirrored(&self) -> JournalLine {
        JournalLine {
            account: self.account,
            debit: self.credit,
            credit: self.debit,
            description: self.description.clone(),
        }
    }
}

/// A journal entry: one financial transaction of ≥ 2 single-sided lines.
///
/// Lifecycle: Draft → Posted. A posted entry is immutable; the only way
/// "out" is a linked reversal entry, which is a new entry created directly
/// in the posted state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    id: JournalEntryId,
    organization: OrganizationId,
    branch: Option<BranchId>,
    number: String,
    date: NaiveDate,
    description: String,
    reference: String,
    entry_type: EntryType,
    posted: bool,
    posted_by: Option<UserId>,
    posted_at: Option<DateTime<Utc>>,
    /// Back-reference to the entry this one reverses.
    reverses: Option<JournalEntryId>,
    lines: Vec<JournalLine>,
}

impl JournalEntry {
    /// Create a draft entry. Requires at least two lines; entry-level
    /// balance is NOT required here — it is checked at post time so that
    /// entries can be composed incrementally.
    #[allow(clippy::too_many_arguments)]
    pub fn draft(
        id: JournalEntryId,
        organization: OrganizationId,
        branch: Option<BranchId>,
        number: impl Into<String>,
        date: NaiveDate,
        description: impl Into<String>,
        reference: impl Into<String>,
        entry_type: EntryType,
        lines: Vec<JournalLine>,
    ) -> LedgerResult<Self> {
        if lines.len() < 2 {
            return Err(LedgerError::TooFewLines { found: lines.len() });
        }
        Ok(Self {
            id,
            organization,
            branch,
            number: number.into(),
            date,
            description: description.into(),
            reference: reference.into(),
            entry_type,
            posted: false,
            posted_by: None,
            posted_at: None,
            reverses: None,
            lines,
        })
    }

    pub fn id(&self) -> JournalEntryId {
        self.id
    }

    pub fn organization(&self) -> OrganizationId {
        self.organization
    }

    pub fn branch(&self) -> Option<BranchId> {
        self.branch
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    pub fn is_posted(&self) -> bool {
        self.posted
    }

    pub fn posted_by(&self) -> Option<UserId> {
        self.posted_by
    }

    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        self.posted_at
    }

    pub fn reverses(&self) -> Option<JournalEntryId> {
        self.reverses
    }

    pub fn lines(&self) -> &[JournalLine] {
        &self.lines
    }

    /// Append a line to a draft. Posted entries are immutable.
    pub fn add_line(&mut self, line: JournalLine) -> LedgerResult<()> {
        if self.posted {
            return Err(LedgerError::PostedEntryImmutable {
                number: self.number.clone(),
            });
        }
        self.lines.push(line);
        Ok(())
    }

    /// Debit and credit totals. Accumulated in i128, so the sum itself
    /// cannot overflow; conversion back to `Money` can.
    pub fn totals(&self) -> LedgerResult<(Money, Money)> {
        let (debits, credits) = self.totals_wide();
        Ok((
            Money::try_from_minor_wide(debits)?,
            Money::try_from_minor_wide(credits)?,
        ))
    }

    fn totals_wide(&self) -> (i128, i128) {
        let mut debits: i128 = 0;
        let mut credits: i128 = 0;
        for line in &self.lines {
            debits += line.debit_amount().minor() as i128;
            credits += line.credit_amount().minor() as i128;
        }
        (debits, credits)
    }

    /// Pure balance predicate: sum(debits) == sum(credits), exactly.
    /// Used at post time and exposed for previews.
    pub fn is_balanced(&self) -> bool {
        let (debits, credits) = self.totals_wide();
        debits == credits
    }

    /// Transition Draft → Posted. Fails on an already-posted entry and on
    /// an unbalanced one (exact fixed-point equality, no tolerance).
    pub fn mark_posted(&mut self, actor: UserId, at: DateTime<Utc>) -> LedgerResult<()> {
        if self.posted {
            return Err(LedgerError::AlreadyPosted {
                number: self.number.clone(),
            });
        }
        let (debits, credits) = self.totals()?;
        if debits != credits {
            return Err(LedgerError::Unbalanced { debits, credits });
        }
        self.posted = true;
        self.posted_by = Some(actor);
        self.posted_at = Some(at);
        Ok(())
    }

    /// Build the (not yet posted) mirror entry that reverses this one:
    /// every line debit/credit-swapped, tagged as an adjustment, reference
    /// `REV-<original number>`, back-reference recorded. The source entry
    /// must already be posted.
    pub fn reversal(
        &self,
        id: JournalEntryId,
        number: impl Into<String>,
        date: NaiveDate,
    ) -> LedgerResult<JournalEntry> {
        if !self.posted {
            return Err(LedgerError::NotPosted {
                number: self.number.clone(),
            });
        }
        Ok(JournalEntry {
            id,
            organization: self.organization,
            branch: self.branch,
            number: number.into(),
            date,
            description: format!("Reversal of {}", self.number),
            reference: format!("REV-{}", self.number),
            entry_type: EntryType::Adjustment,
            posted: false,
            posted_by: None,
            posted_at: None,
            reverses: Some(self.id),
            lines: self.lines.iter().map(JournalLine::mirrored).collect(),
        })
    }
}

/// Chronological view of one posted line, as returned by
/// `transaction_history`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedLine {
    pub entry: JournalEntryId,
    pub number: String,
    pub entry_type: EntryType,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub debit: Money,
    pub credit: Money,
}

/// Inbound boundary contract: a fully-formed journal entry request as
/// submitted by sales/purchases/expenses. The core validates structure
/// only; it never interprets the business semantics of the source
/// transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRequest {
    pub organization: OrganizationId,
    #[serde(default)]
    pub branch: Option<BranchId>,
    pub date: NaiveDate,
    pub description: String,
    pub reference: String,
    pub entry_type: EntryType,
    pub lines: Vec<LineRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub account: AccountId,
    #[serde(default)]
    pub debit: Money,
    #[serde(default)]
    pub credit: Money,
    #[serde(default)]
    pub description: Option<String>,
}

impl LineRequest {
    pub fn into_line(self) -> LedgerResult<JournalLine> {
        JournalLine::new(self.account, self.debit, self.credit, self.description)
    }
}
