//! Financial accounts and their taxonomy.

use serde::{Deserialize, Serialize};

use tillbooks_core::{AccountId, Entity, OrganizationId};

use crate::error::{LedgerError, LedgerResult};

/// Account taxonomy. Fixed: the type decides both statement placement and
/// the account's normal balance side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccountType {
    CurrentAsset,
    FixedAsset,
    IntangibleAsset,
    CurrentLiability,
    LongTermLiability,
    Equity,
    RetainedEarnings,
    Revenue,
    OtherIncome,
    Expense,
    CostOfGoodsSold,
}

impl AccountType {
    /// The natural increasing side for accounts of this type: assets and
    /// expenses are debit-normal, everything else credit-normal.
    pub fn normal_balance(self) -> NormalBalance {
        match self {
            AccountType::CurrentAsset
            | AccountType::FixedAsset
            | AccountType::IntangibleAsset
            | AccountType::Expense
            | AccountType::CostOfGoodsSold => NormalBalance::Debit,
            AccountType::CurrentLiability
            | AccountType::LongTermLiability
            | AccountType::Equity
            | AccountType::RetainedEarnings
            | AccountType::Revenue
            | AccountType::OtherIncome => NormalBalance::Credit,
        }
    }

    pub fn is_asset(self) -> bool {
        matches!(
            self,
            AccountType::CurrentAsset | AccountType::FixedAsset | AccountType::IntangibleAsset
        )
    }

    pub fn is_liability(self) -> bool {
        matches!(
            self,
            AccountType::CurrentLiability | AccountType::LongTermLiability
        )
    }

    pub fn is_equity(self) -> bool {
        matches!(self, AccountType::Equity | AccountType::RetainedEarnings)
    }

    pub fn is_income(self) -> bool {
        matches!(self, AccountType::Revenue | AccountType::OtherIncome)
    }

    pub fn is_expense(self) -> bool {
        matches!(self, AccountType::Expense | AccountType::CostOfGoodsSold)
    }
}

/// Which side an account naturally grows on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalBalance {
    Debit,
    Credit,
}

/// A financial account in an organization's chart.
///
/// The normal-balance/type consistency invariant is enforced at creation
/// and never recomputed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub organization: OrganizationId,
    /// Unique per organization.
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub normal_balance: NormalBalance,
    /// Optional parent in the account tree (same organization, acyclic).
    pub parent: Option<AccountId>,
    pub active: bool,
    /// System accounts cannot be deactivated.
    pub system: bool,
}

impl Account {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: AccountId,
        organization: OrganizationId,
        code: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
        normal_balance: NormalBalance,
        parent: Option<AccountId>,
        system: bool,
    ) -> LedgerResult<Self> {
        if normal_balance != account_type.normal_balance() {
            return Err(LedgerError::NormalBalanceMismatch {
                account_type,
                declared: normal_balance,
            });
        }
        Ok(Self {
            id,
            organization,
            code: code.into(),
            name: name.into(),
            account_type,
            normal_balance,
            parent,
            active: true,
            system,
        })
    }

    /// Heuristic used by the cash-flow statement: a "cash" account is a
    /// current asset whose name mentions cash or bank. There is no
    /// first-class cash flag on accounts.
    pub fn is_cash_like(&self) -> bool {
        if self.account_type != AccountType::CurrentAsset {
            return false;
        }
        let name = self.name.to_lowercase();
        name.contains("cash") || name.contains("bank")
    }
}

impl Entity for Account {
    type Id = AccountId;

    fn id(&self) -> &AccountId {
        &self.id
    }
}
