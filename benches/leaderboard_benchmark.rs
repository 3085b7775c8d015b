use chrono::{Duration, NaiveDate, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use menu_rewards::models::{CompetitionPeriod, EarnedFrom, PointLedgerEntry};
use menu_rewards::services::leaderboard::compute_leaderboard;

/// A week of ledger entries: `diners` diners, `per_diner` awards each.
fn synthetic_ledger(
    period: &CompetitionPeriod,
    diners: usize,
    per_diner: usize,
) -> Vec<PointLedgerEntry> {
    let start = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();
    (0..diners * per_diner)
        .map(|i| {
            let diner = i % diners;
            let is_review = i % 3 == 0;
            PointLedgerEntry {
                diner_email: format!("diner{}@example.com", diner),
                diner_display_name: Some(format!("Diner {}", diner)),
                leaderboard_period_id: period.id.clone(),
                points: if is_review { 25 + (i % 26) as u32 } else { 10 },
                earned_from: if is_review {
                    EarnedFrom::Review
                } else {
                    EarnedFrom::Visit
                },
                restaurant_id: Some(format!("r{}", i % 40)),
                source_id: format!("src:{}", i),
                created_at: start + Duration::seconds(i as i64 * 7),
            }
        })
        .collect()
}

fn benchmark_compute_leaderboard(c: &mut Criterion) {
    let period = CompetitionPeriod::for_week(NaiveDate::from_ymd_opt(2026, 3, 4).unwrap());
    let small = synthetic_ledger(&period, 50, 20);
    let large = synthetic_ledger(&period, 5_000, 20);

    let mut group = c.benchmark_group("leaderboard");

    group.bench_function("1k_entries_anonymous", |b| {
        b.iter(|| compute_leaderboard(Some(&period), black_box(&small), None))
    });

    group.bench_function("100k_entries_signed_in", |b| {
        b.iter(|| {
            compute_leaderboard(
                Some(&period),
                black_box(&large),
                Some("diner4321@example.com"),
            )
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_compute_leaderboard);
criterion_main!(benches);
