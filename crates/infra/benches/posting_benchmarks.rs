use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::NaiveDate;
use std::sync::Arc;
use tillbooks_core::{Money, OrganizationId, UserId};
use tillbooks_infra::{AccountRegistry, JournalEngine, LedgerStore, Reports};
use tillbooks_ledger::{
    AccountLedger, AccountType, EntryRequest, EntryType, LineRequest,
};

struct Harness {
    org: OrganizationId,
    actor: UserId,
    registry: AccountRegistry,
    engine: JournalEngine,
    reports: Reports,
    cash: tillbooks_core::AccountId,
    sales: tillbooks_core::AccountId,
}

fn setup() -> Harness {
    let store = Arc::new(LedgerStore::new());
    let registry = AccountRegistry::new(Arc::clone(&store));
    let engine = JournalEngine::new(Arc::clone(&store));
    let reports = Reports::new(Arc::clone(&store));
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
        .unwrap()
        .id;
    let sales = registry
        .create_account(
            org,
            "4000",
            "Sales Revenue",
            AccountType::Revenue,
            AccountType::Revenue.normal_balance(),
            None,
        )
        .unwrap()
        .id;

    Harness {
        org,
        actor: UserId::new(),
        registry,
        engine,
        reports,
        cash,
        sales,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn sale_request(h: &Harness, on: NaiveDate, minor: i64) -> EntryRequest {
    EntryRequest {
        organization: h.org,
        branch: None,
        date: on,
        description: "bench sale".to_string(),
        reference: String::new(),
        entry_type: EntryType::Sale,
        lines: vec![
            LineRequest {
                account: h.cash,
                debit: Money::from_minor(minor),
                credit: Money::ZERO,
                description: None,
            },
            LineRequest {
                account: h.sales,
                debit: Money::ZERO,
                credit: Money::from_minor(minor),
                description: None,
            },
        ],
    }
}

fn post_sales(h: &Harness, on: NaiveDate, count: usize) {
    for _ in 0..count {
        let entry = h.engine.create_entry(sale_request(h, on, 1_000)).unwrap();
        h.engine.post(entry.id(), h.actor).unwrap();
    }
}

fn bench_posting_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("posting_latency");
    group.sample_size(1000);

    // First post against an empty ledger: fresh buckets every time.
    group.bench_function("create_and_post_fresh", |b| {
        let h = setup();
        let on = date(2025, 6, 10);
        b.iter(|| {
            let entry = h
                .engine
                .create_entry(black_box(sale_request(&h, on, 1_000)))
                .unwrap();
            h.engine.post(entry.id(), h.actor).unwrap();
        });
    });

    // Post into accounts that already carry history: balance recomputation
    // and bucket clones now walk existing state.
    group.bench_function("post_with_history", |b| {
        let h = setup();
        let on = date(2025, 6, 10);
        post_sales(&h, on, 1_000);
        b.iter(|| {
            let entry = h.engine.create_entry(sale_request(&h, on, 1_000)).unwrap();
            h.engine.post(entry.id(), h.actor).unwrap();
        });
    });

    group.finish();
}

fn bench_backdated_roll_forward(c: &mut Criterion) {
    let mut group = c.benchmark_group("backdated_roll_forward");

    // A line landing before N existing monthly buckets must roll into the
    // opening of every later bucket.
    for bucket_count in [1usize, 12, 60].iter() {
        group.bench_with_input(
            BenchmarkId::new("apply_before_buckets", bucket_count),
            bucket_count,
            |b, &count| {
                let mut seeded = AccountLedger::new();
                for i in 0..count {
                    let year = 2020 + (i / 12) as i32;
                    let month = (i % 12) as u32 + 1;
                    seeded
                        .apply(date(year, month, 15), Money::from_minor(100), Money::ZERO)
                        .unwrap();
                }
                b.iter(|| {
                    let mut ledger = seeded.clone();
                    ledger
                        .apply(
                            black_box(date(2019, 12, 31)),
                            Money::from_minor(50),
                            Money::ZERO,
                        )
                        .unwrap();
                    black_box(ledger);
                });
            },
        );
    }

    group.finish();
}

fn bench_balance_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("balance_queries");

    // balance_as_of always recomputes from posted lines, so cost scales
    // with posted-entry volume.
    for entry_count in [100usize, 1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*entry_count as u64));
        group.bench_with_input(
            BenchmarkId::new("balance_as_of", entry_count),
            entry_count,
            |b, &count| {
                let h = setup();
                let on = date(2025, 6, 10);
                post_sales(&h, on, count);
                b.iter(|| {
                    black_box(
                        h.registry
                            .balance_as_of(h.org, black_box(h.cash), on)
                            .unwrap(),
                    );
                });
            },
        );
    }

    group.finish();
}

fn bench_statement_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement_generation");

    for entry_count in [100usize, 1_000].iter() {
        group.bench_with_input(
            BenchmarkId::new("trial_balance", entry_count),
            entry_count,
            |b, &count| {
                let h = setup();
                let on = date(2025, 6, 10);
                post_sales(&h, on, count);
                b.iter(|| {
                    black_box(h.reports.trial_balance(h.org, on, false).unwrap());
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("cash_flow_statement", entry_count),
            entry_count,
            |b, &count| {
                let h = setup();
                let on = date(2025, 6, 10);
                post_sales(&h, on, count);
                b.iter(|| {
                    black_box(
                        h.reports
                            .cash_flow_statement(h.org, date(2025, 6, 1), date(2025, 6, 30))
                            .unwrap(),
                    );
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_posting_latency,
    bench_backdated_roll_forward,
    bench_balance_queries,
    bench_statement_generation
);
criterion_main!(benches);
