use gridiron_sync::aggregate::TeamWeekAggregate;
use gridiron_sync::game_log::{Opponent, Outcome, SeasonType};
use gridiron_sync::results::resolve_team_outcomes;
use gridiron_sync::schedule::{ScheduleGame, ScoreLookup};

fn game_row(team: &str, season: i32, week: i32, opponent: &str) -> TeamWeekAggregate {
    TeamWeekAggregate {
        opponent: Opponent::Team(opponent.to_string()),
        ..TeamWeekAggregate::placeholder(team, season, week, SeasonType::Reg, Opponent::Unknown)
    }
}

fn scored(season: i32, week: i32, home: &str, away: &str, hs: i64, aws: i64) -> ScheduleGame {
    ScheduleGame {
        season,
        week,
        game_type: SeasonType::Reg,
        home_team: home.to_string(),
        away_team: away.to_string(),
        home_score: Some(hs),
        away_score: Some(aws),
    }
}

fn final_outcome(log: &gridiron_sync::game_log::TeamGameLog) -> (i64, i64, String) {
    match &log.outcome {
        Outcome::Final {
            points_for,
            points_against,
            record,
        } => (*points_for, *points_against, record.clone()),
        other => panic!("expected a final outcome, got {other:?}"),
    }
}

#[test]
fn wins_and_losses_accumulate_within_a_season() {
    let schedule = vec![
        scored(2023, 1, "A", "B", 24, 17),
        scored(2023, 2, "C", "A", 20, 10),
    ];
    let lookup = ScoreLookup::build(&schedule);
    let rows = vec![game_row("A", 2023, 1, "B"), game_row("A", 2023, 2, "C")];

    let resolved = resolve_team_outcomes(rows, &lookup);
    assert_eq!(final_outcome(&resolved[0]), (24, 17, "1-0".to_string()));
    assert_eq!(final_outcome(&resolved[1]), (10, 20, "1-1".to_string()));
}

#[test]
fn the_tally_resets_at_a_season_boundary() {
    let schedule = vec![
        scored(2023, 1, "A", "B", 24, 17),
        scored(2023, 2, "A", "C", 10, 20),
        scored(2024, 1, "A", "B", 30, 3),
    ];
    let lookup = ScoreLookup::build(&schedule);
    let rows = vec![
        game_row("A", 2023, 1, "B"),
        game_row("A", 2023, 2, "C"),
        game_row("A", 2024, 1, "B"),
    ];

    let resolved = resolve_team_outcomes(rows, &lookup);
    // Never "2-1" carried across seasons.
    assert_eq!(final_outcome(&resolved[2]).2, "1-0");
}

#[test]
fn ties_switch_the_record_format() {
    let schedule = vec![
        scored(2023, 1, "A", "B", 24, 17),
        scored(2023, 2, "A", "C", 14, 14),
    ];
    let lookup = ScoreLookup::build(&schedule);
    let rows = vec![game_row("A", 2023, 1, "B"), game_row("A", 2023, 2, "C")];

    let resolved = resolve_team_outcomes(rows, &lookup);
    assert_eq!(final_outcome(&resolved[0]).2, "1-0");
    assert_eq!(final_outcome(&resolved[1]).2, "1-0-1");
}

#[test]
fn byes_skip_the_lookup_and_leave_the_tally_alone() {
    let schedule = vec![
        scored(2023, 1, "A", "B", 24, 17),
        scored(2023, 3, "A", "C", 21, 7),
    ];
    let lookup = ScoreLookup::build(&schedule);
    let rows = vec![
        game_row("A", 2023, 1, "B"),
        TeamWeekAggregate::placeholder("A", 2023, 2, SeasonType::Reg, Opponent::Bye),
        game_row("A", 2023, 3, "C"),
    ];

    let resolved = resolve_team_outcomes(rows, &lookup);
    assert_eq!(resolved[1].outcome, Outcome::Bye);
    assert_eq!(final_outcome(&resolved[2]).2, "2-0");
}

#[test]
fn a_lookup_miss_does_not_advance_the_tally() {
    let schedule = vec![
        scored(2023, 1, "A", "B", 24, 17),
        // Week 2 vs D is missing from the schedule entirely.
        scored(2023, 3, "A", "C", 21, 7),
    ];
    let lookup = ScoreLookup::build(&schedule);
    let rows = vec![
        game_row("A", 2023, 1, "B"),
        game_row("A", 2023, 2, "D"),
        game_row("A", 2023, 3, "C"),
    ];

    let resolved = resolve_team_outcomes(rows, &lookup);
    assert_eq!(resolved[1].outcome, Outcome::Unknown);
    // The ambiguous game neither won nor lost: week 3 reads 2-0, not 2-1.
    assert_eq!(final_outcome(&resolved[2]).2, "2-0");
}

#[test]
fn totals_are_monotonic_within_a_season() {
    let schedule = vec![
        scored(2023, 1, "A", "B", 24, 17),
        scored(2023, 2, "A", "C", 10, 20),
        scored(2023, 3, "A", "D", 14, 14),
        scored(2023, 4, "A", "E", 28, 13),
    ];
    let lookup = ScoreLookup::build(&schedule);
    let rows = vec![
        game_row("A", 2023, 1, "B"),
        game_row("A", 2023, 2, "C"),
        game_row("A", 2023, 3, "D"),
        game_row("A", 2023, 4, "E"),
    ];

    let resolved = resolve_team_outcomes(rows, &lookup);
    let mut last_total = 0u32;
    for log in &resolved {
        let (_, _, record) = final_outcome(log);
        let total: u32 = record.split('-').map(|n| n.parse::<u32>().unwrap()).sum();
        assert!(total >= last_total, "tally went backwards at {record}");
        last_total = total;
    }
    assert_eq!(last_total, 4);
}
