//! Ledger Accumulator: period-bucketed running balances per account.
//!
//! Buckets are a rollup cache for reporting; point-in-time balance queries
//! always recompute from posted lines. Every bucket must nevertheless stay
//! reconcilable against that computation for its period.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use tillbooks_core::Money;

use crate::error::LedgerResult;

/// A calendar year/month pair. Ordered chronologically.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl core::fmt::Display for Period {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Opening, period and closing figures for one (account, period).
///
/// Closing is always the net of opening + period, expressed back into a
/// single positive debit-or-credit pair. Buckets are created lazily by the
/// accumulator and never deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerBucket {
    pub opening_debit: Money,
    pub opening_credit: Money,
    pub period_debit: Money,
    pub period_credit: Money,
    pub closing_debit: Money,
    pub closing_credit: Money,
}

impl LedgerBucket {
    /// A fresh bucket whose opening carries the previous period's closing
    /// forward (zero when there is no earlier bucket).
    fn opened_after(previous: Option<&LedgerBucket>) -> Self {
        match previous {
            Some(prev) => Self {
                opening_debit: prev.closing_debit,
                opening_credit: prev.closing_credit,
                ..Self::default()
            },
            None => Self::default(),
        }
    }

    fn accumulate(&mut self, debit: Money, credit: Money) -> LedgerResult<()> {
        self.period_debit = self.period_debit.checked_add(debit)?;
        self.period_credit = self.period_credit.checked_add(credit)?;
        self.recompute_closing()
    }

    /// Fold a backdated line into the opening figures (roll-forward path).
    fn roll_opening(&mut self, debit: Money, credit: Money) -> LedgerResult<()> {
        self.opening_debit = self.opening_debit.checked_add(debit)?;
        self.opening_credit = self.opening_credit.checked_add(credit)?;
        self.recompute_closing()
    }

    fn recompute_closing(&mut self) -> LedgerResult<()> {
        let net = (self.opening_debit.minor() as i128 + self.period_debit.minor() as i128)
            - (self.opening_credit.minor() as i128 + self.period_credit.minor() as i128);
        if net >= 0 {
            self.closing_debit = Money::try_from_minor_wide(net)?;
            self.closing_credit = Money::ZERO;
        } else {
            self.closing_debit = Money::ZERO;
            self.closing_credit = Money::try_from_minor_wide(-net)?;
        }
        Ok(())
    }

    /// Closing balance as a signed amount (debit-positive).
    pub fn closing_net(&self) -> LedgerResult<Money> {
        Ok(self.closing_debit.checked_sub(self.closing_credit)?)
    }
}

/// All period buckets for one (organization, account).
///
/// `apply` is the accumulator's single mutation path; nothing else writes
/// to a bucket. Callers needing all-or-nothing application across several
/// lines clone the ledger, apply to the clone, and swap it back on success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountLedger {
    buckets: BTreeMap<Period, LedgerBucket>,
}

impl AccountLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one posted line: upsert the period bucket (opening seeded from
    /// the previous period's closing), accumulate into the period figures,
    /// and recompute closing.
    ///
    /// Backdated lines are supported with retroactive correction: the
    /// amounts also roll forward into the opening of every later bucket,
    /// keeping closings cumulative instead of silently stale.
    pub fn apply(&mut self, date: NaiveDate, debit: Money, credit: Money) -> LedgerResult<()> {
        let period = Period::of(date);

        if !self.buckets.contains_key(&period) {
            let previous = self
                .buckets
                .range(..period)
                .next_back()
                .map(|(_, bucket)| bucket);
            let fresh = LedgerBucket::opened_after(previous);
            self.buckets.insert(period, fresh);
        }

        // contains_key/insert above make this lookup infallible.
        if let Some(bucket) = self.buckets.get_mut(&period) {
            bucket.accumulate(debit, credit)?;
        }

        let later: Vec<Period> = self
            .buckets
            .range(period..)
            .skip(1)
            .map(|(p, _)| *p)
            .collect();
        for p in later {
            if let Some(bucket) = self.buckets.get_mut(&p) {
                bucket.roll_opening(debit, credit)?;
            }
        }
        Ok(())
    }

    pub fn bucket(&self, period: Period) -> Option<&LedgerBucket> {
        self.buckets.get(&period)
    }

    pub fn buckets(&self) -> impl Iterator<Item = (&Period, &LedgerBucket)> {
        self.buckets.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
