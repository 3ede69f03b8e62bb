//! Ledger error taxonomy.
//!
//! Errors are typed so calling services can tell a structurally invalid
//! request apart from an integrity anomaly or a storage fault, per the
//! three tiers below.

use thiserror::Error;

use tillbooks_core::{AccountId, CoreError, JournalEntryId, Money};

use crate::account::{AccountType, NormalBalance};

/// Result type used across the ledger domain and services.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Every failure the ledger core can report.
///
/// Three tiers:
/// - **validation** — caller-correctable, never retried;
/// - **integrity anomalies** — should be impossible once validation holds;
///   logged and surfaced hard, never tolerated silently;
/// - **infrastructure** — overflow and storage faults. Posting is never
///   silently retried; a retry of a committed post observes
///   [`LedgerError::AlreadyPosted`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    // -- validation ---------------------------------------------------------
    /// Account code already taken within the organization.
    #[error("account code {code:?} already exists in this organization")]
    DuplicateCode { code: String },

    /// Declared normal balance contradicts the account type.
    #[error("normal balance {declared:?} contradicts account type {account_type:?}")]
    NormalBalanceMismatch {
        account_type: AccountType,
        declared: NormalBalance,
    },

    /// Parent account missing from this organization's chart.
    #[error("parent account {parent} does not belong to this organization")]
    ForeignParent { parent: AccountId },

    /// Linking to the parent would make the account hierarchy cyclic.
    #[error("account hierarchy would contain a cycle through {parent}")]
    HierarchyCycle { parent: AccountId },

    /// System accounts cannot be deactivated.
    #[error("account {account} is a system account and cannot be deactivated")]
    SystemAccountProtected { account: AccountId },

    #[error("account {id} not found")]
    AccountNotFound { id: AccountId },

    /// A journal entry needs at least two lines.
    #[error("journal entry requires at least two lines, got {found}")]
    TooFewLines { found: usize },

    /// A line must carry exactly one of debit or credit, strictly positive.
    #[error("journal line must carry exactly one of debit ({debit}) or credit ({credit})")]
    SingleSidedLine { debit: Money, credit: Money },

    /// Debits and credits disagree at post time. Carries both totals so the
    /// caller can surface the exact gap.
    #[error("journal entry is not balanced: debits {debits} != credits {credits}")]
    Unbalanced { debits: Money, credits: Money },

    #[error("journal entry {number} is already posted")]
    AlreadyPosted { number: String },

    #[error("journal entry {number} is not posted")]
    NotPosted { number: String },

    /// Posted entries are immutable.
    #[error("journal entry {number} is posted and cannot be modified")]
    PostedEntryImmutable { number: String },

    #[error("journal entry {id} not found")]
    EntryNotFound { id: JournalEntryId },

    #[error("validation failed: {0}")]
    Validation(String),

    // -- integrity anomalies ------------------------------------------------
    /// The books do not tie out. Indicates a data-integrity bug, not a
    /// business condition.
    #[error("ledger integrity anomaly: {0}")]
    IntegrityAnomaly(String),

    // -- infrastructure -----------------------------------------------------
    /// Fixed-point arithmetic overflowed.
    #[error("amount overflow")]
    AmountOverflow,

    #[error("storage failure: {0}")]
    Storage(String),
}

impl LedgerError {
    /// True for caller-correctable request failures (tier one).
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            LedgerError::IntegrityAnomaly(_) | LedgerError::AmountOverflow | LedgerError::Storage(_)
        )
    }

    pub fn is_integrity_anomaly(&self) -> bool {
        matches!(self, LedgerError::IntegrityAnomaly(_))
    }

    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::IntegrityAnomaly(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}

impl From<CoreError> for LedgerError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AmountOverflow => LedgerError::AmountOverflow,
            CoreError::InvalidId(msg) | CoreError::InvalidAmount(msg) => {
                LedgerError::Validation(msg)
            }
        }
    }
}
