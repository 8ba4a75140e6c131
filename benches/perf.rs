use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use gridiron_sync::aggregate::{AggregatorConfig, aggregate_team_weeks};
use gridiron_sync::fake_feed::FakeFeed;
use gridiron_sync::feed::{StatsFeed, WeeklyRow, parse_weekly};
use gridiron_sync::gap_fill::fill_player_gaps;
use gridiron_sync::results::resolve_team_outcomes;
use gridiron_sync::schedule::{ScoreLookup, extract_bye_weeks, parse_schedules};
use gridiron_sync::sync::player_log_from_row;

const SEASONS: &[i32] = &[2015, 2016, 2017, 2018, 2019, 2020, 2021, 2022, 2023, 2024];

fn sample_rows() -> Vec<WeeklyRow> {
    let feed = FakeFeed::new(99);
    parse_weekly(&feed.weekly_stats(SEASONS).expect("fake weekly stats"))
}

fn bench_aggregate(c: &mut Criterion) {
    let rows = sample_rows();
    let cfg = AggregatorConfig::default();
    c.bench_function("aggregate_team_weeks", |b| {
        b.iter(|| {
            let out = aggregate_team_weeks(black_box(&rows), black_box(&cfg));
            black_box(out.len());
        })
    });
}

fn bench_gap_fill(c: &mut Criterion) {
    let rows = sample_rows();
    let byes = {
        let feed = FakeFeed::new(99);
        let schedules = parse_schedules(&feed.schedules(SEASONS).expect("fake schedules"));
        extract_bye_weeks(&schedules)
    };
    let player_id = rows[0].player_id.clone();
    let logs: Vec<_> = rows
        .iter()
        .filter(|row| row.player_id == player_id)
        .map(player_log_from_row)
        .collect();

    c.bench_function("fill_player_gaps", |b| {
        b.iter(|| {
            let filled = fill_player_gaps(black_box(logs.clone()), black_box(&byes));
            black_box(filled.len());
        })
    });
}

fn bench_resolve(c: &mut Criterion) {
    let feed = FakeFeed::new(99);
    let rows = sample_rows();
    let schedules = parse_schedules(&feed.schedules(SEASONS).expect("fake schedules"));
    let scores = ScoreLookup::build(&schedules);
    let aggregates = aggregate_team_weeks(&rows, &AggregatorConfig::default());
    let team = aggregates[0].team.clone();
    let team_rows: Vec<_> = aggregates
        .into_iter()
        .filter(|row| row.team == team)
        .collect();

    c.bench_function("resolve_team_outcomes", |b| {
        b.iter(|| {
            let resolved =
                resolve_team_outcomes(black_box(team_rows.clone()), black_box(&scores));
            black_box(resolved.len());
        })
    });
}

criterion_group!(perf, bench_aggregate, bench_gap_fill, bench_resolve);
criterion_main!(perf);
