//! Statement Generator: trial balance, balance sheet, cash-flow statement.
//!
//! Stateless and read-only. Statements recompute from the chart and the
//! posted journal lines reached through [`LedgerView`]; ledger buckets are
//! never consulted, so a statement can never be stale relative to posting.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use tillbooks_core::{AccountId, JournalEntryId, Money, OrganizationId};

use crate::account::{Account, AccountType};
use crate::error::{LedgerError, LedgerResult};
use crate::journal::{EntryType, JournalEntry};

/// Read seam between the statement generator and durable state.
///
/// Implementations return posted data only; draft entries are invisible to
/// every statement.
pub trait LedgerView {
    /// Every account in the organization's chart.
    fn chart(&self, organization: OrganizationId) -> LedgerResult<Vec<Account>>;

    /// Net debit (positive) or credit (negative) position over all posted
    /// lines on the account with entry date ≤ `as_of`.
    fn balance_as_of(
        &self,
        organization: OrganizationId,
        account: AccountId,
        as_of: NaiveDate,
    ) -> LedgerResult<Money>;

    /// Posted entries with a transaction date inside `[start, end]`,
    /// chronological.
    fn entries_between(
        &self,
        organization: OrganizationId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> LedgerResult<Vec<JournalEntry>>;
}

/// One row of the trial balance. Exactly one column is non-zero unless the
/// account nets to zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    pub account: AccountId,
    pub code: String,
    pub name: String,
    pub debit: Money,
    pub credit: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalance {
    pub organization: OrganizationId,
    pub as_of: NaiveDate,
    pub rows: Vec<TrialBalanceRow>,
    pub total_debits: Money,
    pub total_credits: Money,
    /// Always true on a successfully returned report; disagreement is
    /// surfaced as [`LedgerError::IntegrityAnomaly`] instead. The field is
    /// kept for the outbound report shape.
    pub is_balanced: bool,
}

/// Point-in-time listing of every active account's debit/credit balance.
///
/// Column convention: debit column = max(balance, 0), credit column =
/// max(−balance, 0). Accounts with both columns zero are skipped unless
/// `include_zero_balances` is set. Totals disagreeing is a data-integrity
/// bug, not a business condition: it comes back as an error.
pub fn trial_balance(
    view: &impl LedgerView,
    organization: OrganizationId,
    as_of: NaiveDate,
    include_zero_balances: bool,
) -> LedgerResult<TrialBalance> {
    let mut accounts = view.chart(organization)?;
    accounts.retain(|a| a.active);
    accounts.sort_by(|a, b| a.code.cmp(&b.code));

    let mut rows = Vec::new();
    let mut total_debits: i128 = 0;
    let mut total_credits: i128 = 0;

    for account in accounts {
        let balance = view.balance_as_of(organization, account.id, as_of)?;
        let debit = balance.max(Money::ZERO);
        let credit = balance.checked_neg()?.max(Money::ZERO);
        if debit.is_zero() && credit.is_zero() && !include_zero_balances {
            continue;
        }
        total_debits += debit.minor() as i128;
        total_credits += credit.minor() as i128;
        rows.push(TrialBalanceRow {
            account: account.id,
            code: account.code,
            name: account.name,
            debit,
            credit,
        });
    }

    let total_debits = Money::try_from_minor_wide(total_debits)?;
    let total_credits = Money::try_from_minor_wide(total_credits)?;
    if total_debits != total_credits {
        return Err(LedgerError::integrity(format!(
            "trial balance does not tie out: debits {total_debits} != credits {total_credits}"
        )));
    }

    Ok(TrialBalance {
        organization,
        as_of,
        rows,
        total_debits,
        total_credits,
        is_balanced: true,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheetLine {
    pub account: AccountId,
    pub code: String,
    pub name: String,
    /// Presentation value: credit-normal balances are sign-flipped so a
    /// healthy liability shows positive.
    pub amount: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheetSection {
    pub lines: Vec<BalanceSheetLine>,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub organization: OrganizationId,
    pub as_of: NaiveDate,
    pub current_assets: BalanceSheetSection,
    pub fixed_assets: BalanceSheetSection,
    pub intangible_assets: BalanceSheetSection,
    pub total_assets: Money,
    pub current_liabilities: BalanceSheetSection,
    pub long_term_liabilities: BalanceSheetSection,
    pub total_liabilities: Money,
    pub equity: BalanceSheetSection,
    /// Net income to date (revenue + other income − expenses − COGS),
    /// folded into equity so the statement ties out without closing
    /// entries.
    pub current_earnings: Money,
    pub total_equity: Money,
    /// Checked within an absolute tolerance of 0.01 — the one place exact
    /// equality is relaxed, and it stays confined to presentation.
    pub is_balanced: bool,
}

/// Tolerance for the balance-sheet tie-out check, in minor units.
const BALANCE_SHEET_TOLERANCE_MINOR: i64 = 1;

pub fn balance_sheet(
    view: &impl LedgerView,
    organization: OrganizationId,
    as_of: NaiveDate,
) -> LedgerResult<BalanceSheet> {
    let mut accounts = view.chart(organization)?;
    accounts.retain(|a| a.active);
    accounts.sort_by(|a, b| a.code.cmp(&b.code));

    let mut current_assets = BalanceSheetSection::default();
    let mut fixed_assets = BalanceSheetSection::default();
    let mut intangible_assets = BalanceSheetSection::default();
    let mut current_liabilities = BalanceSheetSection::default();
    let mut long_term_liabilities = BalanceSheetSection::default();
    let mut equity = BalanceSheetSection::default();
    let mut earnings: i128 = 0;

    for account in accounts {
        let balance = view.balance_as_of(organization, account.id, as_of)?;

        let section = match account.account_type {
            AccountType::CurrentAsset => &mut current_assets,
            AccountType::FixedAsset => &mut fixed_assets,
            AccountType::IntangibleAsset => &mut intangible_assets,
            AccountType::CurrentLiability => &mut current_liabilities,
            AccountType::LongTermLiability => &mut long_term_liabilities,
            AccountType::Equity | AccountType::RetainedEarnings => &mut equity,
            AccountType::Revenue
            | AccountType::OtherIncome
            | AccountType::Expense
            | AccountType::CostOfGoodsSold => {
                // Income carries a credit (negative) balance, expenses a
                // debit (positive) one; negating both folds them into
                // earnings with the right signs.
                earnings -= balance.minor() as i128;
                continue;
            }
        };

        // Sign-flip credit-normal balances for presentation.
        let amount = if account.account_type.is_asset() {
            balance
        } else {
            balance.checked_neg()?
        };
        if amount.is_zero() {
            continue;
        }
        section.total = section.total.checked_add(amount)?;
        section.lines.push(BalanceSheetLine {
            account: account.id,
            code: account.code,
            name: account.name,
            amount,
        });
    }

    let current_earnings = Money::try_from_minor_wide(earnings)?;

    let total_assets = current_assets
        .total
        .checked_add(fixed_assets.total)?
        .checked_add(intangible_assets.total)?;
    let total_liabilities = current_liabilities
        .total
        .checked_add(long_term_liabilities.total)?;
    let total_equity = equity.total.checked_add(current_earnings)?;

    let gap = total_assets
        .checked_sub(total_liabilities)?
        .checked_sub(total_equity)?;
    let is_balanced = gap.abs()?.minor() <= BALANCE_SHEET_TOLERANCE_MINOR;

    Ok(BalanceSheet {
        organization,
        as_of,
        current_assets,
        fixed_assets,
        intangible_assets,
        total_assets,
        current_liabilities,
        long_term_liabilities,
        total_liabilities,
        equity,
        current_earnings,
        total_equity,
        is_balanced,
    })
}

/// Activity bucket on the cash-flow statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CashFlowActivity {
    Operating,
    Investing,
    Financing,
}

/// One cash movement: the signed flow (debit − credit) of a single cash
/// line on a posted entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowItem {
    pub entry: JournalEntryId,
    pub number: String,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowSection {
    pub items: Vec<CashFlowItem>,
    pub net: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowStatement {
    pub organization: OrganizationId,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub opening_cash: Money,
    pub closing_cash: Money,
    pub operating: CashFlowSection,
    pub investing: CashFlowSection,
    pub financing: CashFlowSection,
    pub net_cash_flow: Money,
    /// opening + net flow − closing. Zero on every successfully returned
    /// report; anything else is surfaced as an integrity anomaly.
    pub reconciliation: Money,
}

/// Cash movements over `[start, end]`, bucketed by activity.
///
/// Cash accounts are identified by [`Account::is_cash_like`]. Opening cash
/// is the balance as of the day before `start` so that flows dated on
/// `start` itself are not counted twice; closing cash is the balance as of
/// `end`.
pub fn cash_flow_statement(
    view: &impl LedgerView,
    organization: OrganizationId,
    start: NaiveDate,
    end: NaiveDate,
) -> LedgerResult<CashFlowStatement> {
    let accounts = view.chart(organization)?;
    let by_id: HashMap<AccountId, &Account> = accounts.iter().map(|a| (a.id, a)).collect();
    let cash_accounts: Vec<&Account> = accounts.iter().filter(|a| a.is_cash_like()).collect();

    let mut opening: i128 = 0;
    let mut closing: i128 = 0;
    for account in &cash_accounts {
        if let Some(day_before) = start.pred_opt() {
            opening += view
                .balance_as_of(organization, account.id, day_before)?
                .minor() as i128;
        }
        closing += view.balance_as_of(organization, account.id, end)?.minor() as i128;
    }
    let opening_cash = Money::try_from_minor_wide(opening)?;
    let closing_cash = Money::try_from_minor_wide(closing)?;

    let mut operating = CashFlowSection::default();
    let mut investing = CashFlowSection::default();
    let mut financing = CashFlowSection::default();

    for entry in view.entries_between(organization, start, end)? {
        let activity = classify_activity(&entry, &by_id);
        for line in entry.lines() {
            let is_cash = by_id
                .get(&line.account())
                .is_some_and(|a| a.is_cash_like());
            if !is_cash {
                continue;
            }
            let amount = line.flow()?;
            let section = match activity {
                CashFlowActivity::Operating => &mut operating,
                CashFlowActivity::Investing => &mut investing,
                CashFlowActivity::Financing => &mut financing,
            };
            section.net = section.net.checked_add(amount)?;
            section.items.push(CashFlowItem {
                entry: entry.id(),
                number: entry.number().to_string(),
                date: entry.date(),
                description: entry.description().to_string(),
                amount,
            });
        }
    }

    let net_cash_flow = operating
        .net
        .checked_add(investing.net)?
        .checked_add(financing.net)?;
    let reconciliation = opening_cash
        .checked_add(net_cash_flow)?
        .checked_sub(closing_cash)?;
    if !reconciliation.is_zero() {
        return Err(LedgerError::integrity(format!(
            "cash flow does not reconcile: opening {opening_cash} + net {net_cash_flow} - closing {closing_cash} = {reconciliation}"
        )));
    }

    Ok(CashFlowStatement {
        organization,
        start,
        end,
        opening_cash,
        closing_cash,
        operating,
        investing,
        financing,
        net_cash_flow,
        reconciliation,
    })
}

/// Fixed activity mapping:
/// sale/receipt/expense/payment → operating; a purchase whose non-cash
/// side touches fixed or intangible assets → investing; an adjustment
/// touching liability or equity accounts → financing; everything else →
/// operating.
fn classify_activity(
    entry: &JournalEntry,
    accounts: &HashMap<AccountId, &Account>,
) -> CashFlowActivity {
    let touches = |pred: &dyn Fn(AccountType) -> bool| {
        entry.lines().iter().any(|line| {
            accounts
                .get(&line.account())
                .is_some_and(|a| pred(a.account_type))
        })
    };

    match entry.entry_type() {
        EntryType::Sale | EntryType::Receipt | EntryType::Expense | EntryType::Payment => {
            CashFlowActivity::Operating
        }
        EntryType::Purchase => {
            let long_lived = |ty: AccountType| {
                matches!(ty, AccountType::FixedAsset | AccountType::IntangibleAsset)
            };
            if touches(&long_lived) {
                CashFlowActivity::Investing
            } else {
                CashFlowActivity::Operating
            }
        }
        EntryType::Adjustment => {
            let liability_or_equity = |ty: AccountType| ty.is_liability() || ty.is_equity();
            if touches(&liability_or_equity) {
                CashFlowActivity::Financing
            } else {
                CashFlowActivity::Operating
            }
        }
        EntryType::Manual | EntryType::Closing | EntryType::Opening => CashFlowActivity::Operating,
    }
}
