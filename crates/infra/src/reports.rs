//! Read-only reporting facade: implements the statement generator's
//! [`LedgerView`] over the store and logs integrity anomalies before
//! propagating them.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::error;

use tillbooks_core::{AccountId, Money, OrganizationId};
use tillbooks_ledger::{
    Account, BalanceSheet, CashFlowStatement, JournalEntry, LedgerResult, LedgerView, TrialBalance,
    balance_sheet, cash_flow_statement, trial_balance,
};

use crate::store::LedgerStore;

#[derive(Debug, Clone)]
pub struct Reports {
    store: Arc<LedgerStore>,
}

impl Reports {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }

    pub fn trial_balance(
        &self,
        organization: OrganizationId,
        as_of: NaiveDate,
        include_zero_balances: bool,
    ) -> LedgerResult<TrialBalance> {
        self.surfacing_anomalies(trial_balance(self, organization, as_of, include_zero_balances))
    }

    pub fn balance_sheet(
        &self,
        organization: OrganizationId,
        as_of: NaiveDate,
    ) -> LedgerResult<BalanceSheet> {
        self.surfacing_anomalies(balance_sheet(self, organization, as_of))
    }

    pub fn cash_flow_statement(
        &self,
        organization: OrganizationId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> LedgerResult<CashFlowStatement> {
        self.surfacing_anomalies(cash_flow_statement(self, organization, start, end))
    }

    /// Integrity anomalies mean the books are corrupt; they are logged
    /// loudly here and still returned as hard failures.
    fn surfacing_anomalies<T>(&self, result: LedgerResult<T>) -> LedgerResult<T> {
        if let Err(err) = &result {
            if err.is_integrity_anomaly() {
                error!(%err, "ledger integrity anomaly");
            }
        }
        result
    }
}

impl LedgerView for Reports {
    fn chart(&self, organization: OrganizationId) -> LedgerResult<Vec<Account>> {
        let state = self.store.read()?;
        Ok(state
            .chart(organization)
            .map(|c| c.list().into_iter().cloned().collect())
            .unwrap_or_default())
    }

    fn balance_as_of(
        &self,
        organization: OrganizationId,
        account: AccountId,
        as_of: NaiveDate,
    ) -> LedgerResult<Money> {
        let state = self.store.read()?;
        state.balance_as_of(organization, account, as_of)
    }

    fn entries_between(
        &self,
        organization: OrganizationId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> LedgerResult<Vec<JournalEntry>> {
        let state = self.store.read()?;
        Ok(state
            .posted_entries_sorted(organization)
            .into_iter()
            .filter(|e| e.date() >= start && e.date() <= end)
            .cloned()
            .collect())
    }
}
