//! End-to-end scenarios across registry, engine, accumulator and reports.

use std::sync::Arc;

use chrono::NaiveDate;

use tillbooks_core::{AccountId, JournalEntryId, Money, OrganizationId, UserId};
use tillbooks_ledger::{
    Account, AccountType, EntryRequest, EntryType, LedgerError, LineRequest, Period,
};

use crate::{AccountRegistry, JournalEngine, LedgerStore, Reports};

struct Fixture {
    org: OrganizationId,
    actor: UserId,
    registry: AccountRegistry,
    engine: JournalEngine,
    reports: Reports,
    cash: Account,
    inventory: Account,
    equipment: Account,
    payable: Account,
    loan: Account,
    capital: Account,
    sales: Account,
    rent: Account,
}

fn setup() -> Fixture {
    tillbooks_observability::init();

    let store = Arc::new(LedgerStore::new());
    let registry = AccountRegistry::new(Arc::clone(&store));
    let engine = JournalEngine::new(Arc::clone(&store));
    let reports = Reports::new(Arc::clone(&store));
    let org = OrganizationId::new();

    let create = |code: &str, name: &str, ty: AccountType| {
        registry
            .create_account(org, code, name, ty, ty.normal_balance(), None)
            .unwrap()
    };
    let cash = create("1000", "Cash on Hand", AccountType::CurrentAsset);
    let inventory = create("1200", "Inventory", AccountType::CurrentAsset);
    let equipment = create("1500", "Equipment", AccountType::FixedAsset);
    let payable = create("2000", "Accounts Payable", AccountType::CurrentLiability);
    let loan = create("2500", "Bank Loan", AccountType::LongTermLiability);
    let capital = create("3000", "Owner Capital", AccountType::Equity);
    let sales = create("4000", "Sales Revenue", AccountType::Revenue);
    let rent = create("6000", "Rent Expense", AccountType::Expense);

    Fixture {
        org,
        actor: UserId::new(),
        registry,
        engine,
        reports,
        cash,
        inventory,
        equipment,
        payable,
        loan,
        capital,
        sales,
        rent,
    }
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn debit(account: AccountId, minor: i64) -> LineRequest {
    LineRequest {
        account,
        debit: Money::from_minor(minor),
        credit: Money::ZERO,
        description: None,
    }
}

fn credit(account: AccountId, minor: i64) -> LineRequest {
    LineRequest {
        account,
        debit: Money::ZERO,
        credit: Money::from_minor(minor),
        description: None,
    }
}

fn request(
    fixture: &Fixture,
    entry_type: EntryType,
    date: NaiveDate,
    lines: Vec<LineRequest>,
) -> EntryRequest {
    EntryRequest {
        organization: fixture.org,
        branch: None,
        date,
        description: "test entry".to_string(),
        reference: String::new(),
        entry_type,
        lines,
    }
}

fn post(
    fixture: &Fixture,
    entry_type: EntryType,
    date: NaiveDate,
    lines: Vec<LineRequest>,
) -> JournalEntryId {
    let entry = fixture
        .engine
        .create_entry(request(fixture, entry_type, date, lines))
        .unwrap();
    fixture.engine.post(entry.id(), fixture.actor).unwrap();
    entry.id()
}

fn balance(fixture: &Fixture, account: AccountId, as_of: NaiveDate) -> Money {
    fixture
        .registry
        .balance_as_of(fixture.org, account, as_of)
        .unwrap()
}

#[test]
fn posting_a_balanced_entry_moves_both_balances() {
    let fx = setup();
    let date = d(2025, 6, 10);

    post(
        &fx,
        EntryType::Sale,
        date,
        vec![debit(fx.cash.id, 10_000), credit(fx.sales.id, 10_000)],
    );

    assert_eq!(balance(&fx, fx.cash.id, date), Money::from_minor(10_000));
    // Credit-normal: sales moves into a net credit (negative) position.
    assert_eq!(balance(&fx, fx.sales.id, date), Money::from_minor(-10_000));
}

#[test]
fn unbalanced_post_fails_and_entry_stays_draft() {
    let fx = setup();
    let date = d(2025, 6, 10);

    let entry = fx
        .engine
        .create_entry(request(
            &fx,
            EntryType::Manual,
            date,
            vec![debit(fx.cash.id, 10_000), credit(fx.sales.id, 9_000)],
        ))
        .unwrap();

    let err = fx.engine.post(entry.id(), fx.actor).unwrap_err();
    assert_eq!(
        err,
        LedgerError::Unbalanced {
            debits: Money::from_minor(10_000),
            credits: Money::from_minor(9_000),
        }
    );

    // No state moved: entry is draft, balances untouched, no buckets.
    assert!(!fx.engine.get_entry(entry.id()).unwrap().is_posted());
    assert_eq!(balance(&fx, fx.cash.id, date), Money::ZERO);
    assert!(
        fx.engine
            .account_ledger(fx.org, fx.cash.id)
            .unwrap()
            .is_empty()
    );
}

#[test]
fn reversal_restores_the_prior_balance_and_links_back() {
    let fx = setup();
    let date = d(2025, 6, 10);

    let entry_id = post(
        &fx,
        EntryType::Sale,
        date,
        vec![debit(fx.cash.id, 10_000), credit(fx.sales.id, 10_000)],
    );
    let original = fx.engine.get_entry(entry_id).unwrap();

    let reversal = fx.engine.reverse(entry_id, fx.actor, None).unwrap();
    assert!(reversal.is_posted());
    assert_eq!(reversal.entry_type(), EntryType::Adjustment);
    assert_eq!(reversal.reference(), format!("REV-{}", original.number()));
    assert_eq!(reversal.reverses(), Some(entry_id));
    assert_ne!(reversal.number(), original.number());

    assert_eq!(balance(&fx, fx.cash.id, date), Money::ZERO);
    assert_eq!(balance(&fx, fx.sales.id, date), Money::ZERO);
}

#[test]
fn reversing_a_draft_entry_is_rejected() {
    let fx = setup();
    let entry = fx
        .engine
        .create_entry(request(
            &fx,
            EntryType::Manual,
            d(2025, 6, 10),
            vec![debit(fx.cash.id, 100), credit(fx.sales.id, 100)],
        ))
        .unwrap();

    let err = fx.engine.reverse(entry.id(), fx.actor, None).unwrap_err();
    assert!(matches!(err, LedgerError::NotPosted { .. }));
}

#[test]
fn retrying_a_committed_post_observes_already_posted_without_double_apply() {
    let fx = setup();
    let date = d(2025, 6, 10);
    let entry_id = post(
        &fx,
        EntryType::Sale,
        date,
        vec![debit(fx.cash.id, 10_000), credit(fx.sales.id, 10_000)],
    );

    let err = fx.engine.post(entry_id, fx.actor).unwrap_err();
    assert!(matches!(err, LedgerError::AlreadyPosted { .. }));

    // Applied exactly once.
    assert_eq!(balance(&fx, fx.cash.id, date), Money::from_minor(10_000));
    let ledger = fx.engine.account_ledger(fx.org, fx.cash.id).unwrap();
    let bucket = ledger.bucket(Period { year: 2025, month: 6 }).unwrap();
    assert_eq!(bucket.period_debit, Money::from_minor(10_000));
}

#[test]
fn entry_numbers_are_monotonic_per_type_and_date() {
    let fx = setup();
    let date = d(2025, 6, 10);
    let lines = || vec![debit(fx.cash.id, 100), credit(fx.sales.id, 100)];

    let first = fx
        .engine
        .create_entry(request(&fx, EntryType::Sale, date, lines()))
        .unwrap();
    let second = fx
        .engine
        .create_entry(request(&fx, EntryType::Sale, date, lines()))
        .unwrap();
    let other_type = fx
        .engine
        .create_entry(request(&fx, EntryType::Payment, date, lines()))
        .unwrap();

    assert_eq!(first.number(), "SAL-20250610-0001");
    assert_eq!(second.number(), "SAL-20250610-0002");
    assert_eq!(other_type.number(), "PAY-20250610-0001");
}

#[test]
fn entry_numbers_never_collide_across_organizations() {
    let store = Arc::new(LedgerStore::new());
    let registry = AccountRegistry::new(Arc::clone(&store));
    let engine = JournalEngine::new(Arc::clone(&store));
    let date = d(2025, 6, 10);

    let mut numbers = Vec::new();
    for _ in 0..2 {
        let org = OrganizationId::new();
        let cash = registry
            .create_account(
                org,
                "1000",
                "Cash",
                AccountType::CurrentAsset,
                AccountType::CurrentAsset.normal_balance(),
                None,
            )
            .unwrap();
        let sales = registry
            .create_account(
                org,
                "4000",
                "Sales Revenue",
                AccountType::Revenue,
                AccountType::Revenue.normal_balance(),
                None,
            )
            .unwrap();
        let entry = engine
            .create_entry(EntryRequest {
                organization: org,
                branch: None,
                date,
                description: "same-day sale".to_string(),
                reference: String::new(),
                entry_type: EntryType::Sale,
                lines: vec![debit(cash.id, 100), credit(sales.id, 100)],
            })
            .unwrap();
        numbers.push(entry.number().to_string());
    }

    // Same entry type and date in two organizations: the shared counter
    // keeps the number strings distinct.
    assert_ne!(numbers[0], numbers[1]);
    assert_eq!(numbers[0], "SAL-20250610-0001");
    assert_eq!(numbers[1], "SAL-20250610-0002");
}

#[test]
fn create_entry_rejects_accounts_from_another_organization() {
    let fx = setup();
    let stray = AccountId::new();
    let err = fx
        .engine
        .create_entry(request(
            &fx,
            EntryType::Manual,
            d(2025, 6, 10),
            vec![debit(stray, 100), credit(fx.sales.id, 100)],
        ))
        .unwrap_err();
    assert_eq!(err, LedgerError::AccountNotFound { id: stray });
}

#[test]
fn trial_balance_ties_out_and_skips_zero_rows() {
    let fx = setup();
    let date = d(2025, 6, 30);

    post(
        &fx,
        EntryType::Sale,
        d(2025, 6, 5),
        vec![debit(fx.cash.id, 50_000), credit(fx.sales.id, 50_000)],
    );
    post(
        &fx,
        EntryType::Expense,
        d(2025, 6, 12),
        vec![debit(fx.rent.id, 12_000), credit(fx.cash.id, 12_000)],
    );

    let report = fx.reports.trial_balance(fx.org, date, false).unwrap();
    assert!(report.is_balanced);
    assert_eq!(report.total_debits, report.total_credits);
    assert_eq!(report.total_debits, Money::from_minor(50_000));
    // Inventory never moved; it is omitted without the flag...
    assert!(!report.rows.iter().any(|r| r.account == fx.inventory.id));

    // ...and included with it, at 0.00/0.00.
    let report = fx.reports.trial_balance(fx.org, date, true).unwrap();
    let row = report
        .rows
        .iter()
        .find(|r| r.account == fx.inventory.id)
        .unwrap();
    assert_eq!(row.debit, Money::ZERO);
    assert_eq!(row.credit, Money::ZERO);

    // Rows come back ordered by account code.
    let codes: Vec<&str> = report.rows.iter().map(|r| r.code.as_str()).collect();
    let mut sorted = codes.clone();
    sorted.sort();
    assert_eq!(codes, sorted);
}

#[test]
fn trial_balance_omits_deactivated_accounts() {
    let fx = setup();
    fx.registry.deactivate_account(fx.org, fx.inventory.id).unwrap();

    let report = fx.reports.trial_balance(fx.org, d(2025, 6, 30), true).unwrap();
    assert!(!report.rows.iter().any(|r| r.account == fx.inventory.id));
}

#[test]
fn balance_sheet_ties_out_with_current_earnings() {
    let fx = setup();

    // Capital injection, a sale, rent, and an equipment purchase.
    post(
        &fx,
        EntryType::Opening,
        d(2025, 6, 1),
        vec![debit(fx.cash.id, 100_000), credit(fx.capital.id, 100_000)],
    );
    post(
        &fx,
        EntryType::Sale,
        d(2025, 6, 5),
        vec![debit(fx.cash.id, 50_000), credit(fx.sales.id, 50_000)],
    );
    post(
        &fx,
        EntryType::Expense,
        d(2025, 6, 12),
        vec![debit(fx.rent.id, 12_000), credit(fx.cash.id, 12_000)],
    );
    post(
        &fx,
        EntryType::Purchase,
        d(2025, 6, 20),
        vec![debit(fx.equipment.id, 30_000), credit(fx.cash.id, 30_000)],
    );

    let sheet = fx.reports.balance_sheet(fx.org, d(2025, 6, 30)).unwrap();
    assert!(sheet.is_balanced);
    // Cash 1080.00 + equipment 300.00.
    assert_eq!(sheet.current_assets.total, Money::from_minor(108_000));
    assert_eq!(sheet.fixed_assets.total, Money::from_minor(30_000));
    assert_eq!(sheet.total_assets, Money::from_minor(138_000));
    assert_eq!(sheet.total_liabilities, Money::ZERO);
    // Capital 1000.00 shown positive (sign-flipped credit balance).
    assert_eq!(sheet.equity.total, Money::from_minor(100_000));
    // Earnings: 500.00 revenue - 120.00 rent.
    assert_eq!(sheet.current_earnings, Money::from_minor(38_000));
    assert_eq!(sheet.total_equity, Money::from_minor(138_000));
}

#[test]
fn cash_flow_reconciles_across_activities() {
    let fx = setup();
    let (start, end) = (d(2025, 6, 1), d(2025, 6, 30));

    post(
        &fx,
        EntryType::Sale,
        d(2025, 6, 3),
        vec![debit(fx.cash.id, 50_000), credit(fx.sales.id, 50_000)],
    );
    post(
        &fx,
        EntryType::Expense,
        d(2025, 6, 8),
        vec![debit(fx.rent.id, 12_000), credit(fx.cash.id, 12_000)],
    );
    // Equipment bought with cash: investing.
    post(
        &fx,
        EntryType::Purchase,
        d(2025, 6, 15),
        vec![debit(fx.equipment.id, 30_000), credit(fx.cash.id, 30_000)],
    );
    // Loan drawdown: financing.
    post(
        &fx,
        EntryType::Adjustment,
        d(2025, 6, 22),
        vec![debit(fx.cash.id, 100_000), credit(fx.loan.id, 100_000)],
    );
    // Inventory restock on credit: no cash line, must not appear at all.
    post(
        &fx,
        EntryType::Purchase,
        d(2025, 6, 25),
        vec![debit(fx.inventory.id, 40_000), credit(fx.payable.id, 40_000)],
    );

    let statement = fx.reports.cash_flow_statement(fx.org, start, end).unwrap();
    assert_eq!(statement.opening_cash, Money::ZERO);
    assert_eq!(statement.operating.net, Money::from_minor(38_000));
    assert_eq!(statement.investing.net, Money::from_minor(-30_000));
    assert_eq!(statement.financing.net, Money::from_minor(100_000));
    assert_eq!(statement.net_cash_flow, Money::from_minor(108_000));
    assert_eq!(statement.closing_cash, Money::from_minor(108_000));
    assert_eq!(statement.reconciliation, Money::ZERO);
    assert_eq!(
        statement.operating.items.len() + statement.investing.items.len()
            + statement.financing.items.len(),
        4
    );
}

#[test]
fn cash_flow_counts_flows_dated_on_the_window_start_once() {
    let fx = setup();

    // The day before the window: opening cash only.
    post(
        &fx,
        EntryType::Sale,
        d(2025, 5, 31),
        vec![debit(fx.cash.id, 40_000), credit(fx.sales.id, 40_000)],
    );
    // Exactly on the window's first day: a period flow, not opening.
    post(
        &fx,
        EntryType::Sale,
        d(2025, 6, 1),
        vec![debit(fx.cash.id, 25_000), credit(fx.sales.id, 25_000)],
    );

    let statement = fx
        .reports
        .cash_flow_statement(fx.org, d(2025, 6, 1), d(2025, 6, 30))
        .unwrap();
    assert_eq!(statement.opening_cash, Money::from_minor(40_000));
    assert_eq!(statement.operating.net, Money::from_minor(25_000));
    assert_eq!(statement.operating.items.len(), 1);
    assert_eq!(statement.closing_cash, Money::from_minor(65_000));
    assert_eq!(statement.reconciliation, Money::ZERO);
}

#[test]
fn buckets_reconcile_against_balance_as_of() {
    let fx = setup();

    post(
        &fx,
        EntryType::Sale,
        d(2025, 5, 20),
        vec![debit(fx.cash.id, 20_000), credit(fx.sales.id, 20_000)],
    );
    post(
        &fx,
        EntryType::Sale,
        d(2025, 6, 10),
        vec![debit(fx.cash.id, 15_000), credit(fx.sales.id, 15_000)],
    );
    // Backdated into April after May/June already have buckets.
    post(
        &fx,
        EntryType::Expense,
        d(2025, 4, 2),
        vec![debit(fx.rent.id, 5_000), credit(fx.cash.id, 5_000)],
    );

    let ledger = fx.engine.account_ledger(fx.org, fx.cash.id).unwrap();
    for (&period, bucket) in ledger.buckets() {
        let last_day = if period.month == 12 {
            d(period.year + 1, 1, 1).pred_opt().unwrap()
        } else {
            d(period.year, period.month + 1, 1).pred_opt().unwrap()
        };
        assert_eq!(
            bucket.closing_net().unwrap(),
            balance(&fx, fx.cash.id, last_day),
            "bucket {period} disagrees with balance_as_of"
        );
    }

    // The backdated expense landed in April and rolled forward.
    let april = ledger.bucket(Period { year: 2025, month: 4 }).unwrap();
    assert_eq!(april.closing_credit, Money::from_minor(5_000));
    let may = ledger.bucket(Period { year: 2025, month: 5 }).unwrap();
    assert_eq!(may.opening_credit, Money::from_minor(5_000));
}

#[test]
fn concurrent_posts_serialize_on_shared_accounts() {
    let fx = setup();
    let fx = Arc::new(fx);
    let date = d(2025, 6, 10);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let fx = Arc::clone(&fx);
        handles.push(std::thread::spawn(move || {
            for _ in 0..25 {
                let entry = fx
                    .engine
                    .create_entry(request(
                        &fx,
                        EntryType::Sale,
                        date,
                        vec![debit(fx.cash.id, 100), credit(fx.sales.id, 100)],
                    ))
                    .unwrap();
                fx.engine.post(entry.id(), fx.actor).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    // 200 posts of 1.00 each; no lost bucket updates.
    assert_eq!(balance(&fx, fx.cash.id, date), Money::from_minor(20_000));
    let ledger = fx.engine.account_ledger(fx.org, fx.cash.id).unwrap();
    let bucket = ledger.bucket(Period { year: 2025, month: 6 }).unwrap();
    assert_eq!(bucket.period_debit, Money::from_minor(20_000));

    let report = fx.reports.trial_balance(fx.org, date, false).unwrap();
    assert!(report.is_balanced);
}

#[test]
fn transaction_history_is_chronological() {
    let fx = setup();

    post(
        &fx,
        EntryType::Sale,
        d(2025, 6, 10),
        vec![debit(fx.cash.id, 200), credit(fx.sales.id, 200)],
    );
    post(
        &fx,
        EntryType::Expense,
        d(2025, 6, 2),
        vec![debit(fx.rent.id, 50), credit(fx.cash.id, 50)],
    );
    // Draft entries never show up in history.
    fx.engine
        .create_entry(request(
            &fx,
            EntryType::Manual,
            d(2025, 6, 1),
            vec![debit(fx.cash.id, 999), credit(fx.sales.id, 999)],
        ))
        .unwrap();

    let history = fx
        .registry
        .transaction_history(fx.org, fx.cash.id)
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].date, d(2025, 6, 2));
    assert_eq!(history[0].credit, Money::from_minor(50));
    assert_eq!(history[1].date, d(2025, 6, 10));
    assert_eq!(history[1].debit, Money::from_minor(200));
}

#[test]
fn inbound_json_request_flows_through_to_posting() {
    let fx = setup();
    let json = format!(
        r#"{{
            "organization": "{}",
            "date": "2025-06-30",
            "description": "POS day close",
            "reference": "POS-00042",
            "entry_type": "sale",
            "lines": [
                {{ "account": "{}", "debit": 75050 }},
                {{ "account": "{}", "credit": 75050 }}
            ]
        }}"#,
        fx.org, fx.cash.id, fx.sales.id
    );

    let request: EntryRequest = serde_json::from_str(&json).unwrap();
    let entry = fx.engine.create_entry(request).unwrap();
    assert!(fx.engine.is_balanced(entry.id()).unwrap());
    fx.engine.post(entry.id(), fx.actor).unwrap();

    assert_eq!(
        balance(&fx, fx.cash.id, d(2025, 6, 30)),
        Money::from_minor(75_050)
    );
}
