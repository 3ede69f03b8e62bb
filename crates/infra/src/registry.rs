//! Account Registry service: chart-of-accounts lifecycle and balance
//! queries, scoped by an explicit organization id on every call.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use tillbooks_core::{AccountId, Money, OrganizationId};
use tillbooks_ledger::{Account, AccountType, LedgerError, LedgerResult, NormalBalance, PostedLine};

use crate::store::LedgerStore;

#[derive(Debug, Clone)]
pub struct AccountRegistry {
    store: Arc<LedgerStore>,
}

impl AccountRegistry {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }

    pub fn create_account(
        &self,
        organization: OrganizationId,
        code: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
        normal_balance: NormalBalance,
        parent: Option<AccountId>,
    ) -> LedgerResult<Account> {
        let mut state = self.store.write()?;
        let account = state.chart_mut(organization).create_account(
            code,
            name,
            account_type,
            normal_balance,
            parent,
        )?;
        info!(%organization, code = %account.code, "account created");
        Ok(account)
    }

    /// Create an account protected from deactivation (seeded defaults).
    pub fn create_system_account(
        &self,
        organization: OrganizationId,
        code: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
        normal_balance: NormalBalance,
        parent: Option<AccountId>,
    ) -> LedgerResult<Account> {
        let mut state = self.store.write()?;
        let account = state.chart_mut(organization).create_system_account(
            code,
            name,
            account_type,
            normal_balance,
            parent,
        )?;
        info!(%organization, code = %account.code, "system account created");
        Ok(account)
    }

    pub fn deactivate_account(
        &self,
        organization: OrganizationId,
        account: AccountId,
    ) -> LedgerResult<()> {
        let mut state = self.store.write()?;
        let chart = state
            .charts
            .get_mut(&organization)
            .ok_or(LedgerError::AccountNotFound { id: account })?;
        chart.deactivate(account)?;
        info!(%organization, %account, "account deactivated");
        Ok(())
    }

    pub fn get_account(
        &self,
        organization: OrganizationId,
        account: AccountId,
    ) -> LedgerResult<Account> {
        let state = self.store.read()?;
        state
            .chart(organization)
            .and_then(|c| c.get(account))
            .cloned()
            .ok_or(LedgerError::AccountNotFound { id: account })
    }

    pub fn get_account_by_code(
        &self,
        organization: OrganizationId,
        code: &str,
    ) -> LedgerResult<Option<Account>> {
        let state = self.store.read()?;
        Ok(state
            .chart(organization)
            .and_then(|c| c.get_by_code(code))
            .cloned())
    }

    /// All accounts in the chart, ordered by code.
    pub fn list_accounts(&self, organization: OrganizationId) -> LedgerResult<Vec<Account>> {
        let state = self.store.read()?;
        Ok(state
            .chart(organization)
            .map(|c| c.list().into_iter().cloned().collect())
            .unwrap_or_default())
    }

    /// Ancestor codes concatenated for display.
    pub fn resolve_full_code(
        &self,
        organization: OrganizationId,
        account: AccountId,
    ) -> LedgerResult<String> {
        let state = self.store.read()?;
        state
            .chart(organization)
            .ok_or(LedgerError::AccountNotFound { id: account })?
            .resolve_full_code(account)
    }

    /// Net debit (positive) / credit (negative) position over posted lines
    /// with entry date ≤ `as_of`. Always recomputed from posted lines,
    /// never read from buckets.
    pub fn balance_as_of(
        &self,
        organization: OrganizationId,
        account: AccountId,
        as_of: NaiveDate,
    ) -> LedgerResult<Money> {
        let state = self.store.read()?;
        state.balance_as_of(organization, account, as_of)
    }

    /// Chronological list of posted lines touching the account.
    pub fn transaction_history(
        &self,
        organization: OrganizationId,
        account: AccountId,
    ) -> LedgerResult<Vec<PostedLine>> {
        let state = self.store.read()?;
        let known = state.chart(organization).is_some_and(|c| c.contains(account));
        if !known {
            return Err(LedgerError::AccountNotFound { id: account });
        }

        let mut history = Vec::new();
        for entry in state.posted_entries_sorted(organization) {
            for line in entry.lines() {
                if line.account() == account {
                    history.push(PostedLine {
                        entry: entry.id(),
                        number: entry.number().to_string(),
                        entry_type: entry.entry_type(),
                        date: entry.date(),
                        description: line.description().map(str::to_string),
                        debit: line.debit_amount(),
                        credit: line.credit_amount(),
                    });
                }
            }
        }
        Ok(history)
    }
}
