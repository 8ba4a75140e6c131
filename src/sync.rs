use std::collections::{BTreeMap, HashSet};

use anyhow::{Context, Result};
use log::info;
use rayon::prelude::*;

use crate::aggregate::{AggregatorConfig, TeamWeekAggregate, aggregate_team_weeks};
use crate::feed::{
    RosterRow, StatsFeed, TeamDescRow, WeeklyRow, parse_rosters, parse_team_descriptors,
    parse_weekly,
};
use crate::game_log::{
    GameKey, MiscStats, Opponent, PassingStats, PlayerBasics, PlayerGameLog, PlayerProfile,
    ReceivingStats, RushingStats, StoredRecord, TeamProfile, collapse_block,
};
use crate::gap_fill::{fill_player_gaps, fill_team_gaps};
use crate::results::resolve_team_outcomes;
use crate::schedule::{ByeWeekIndex, ScoreLookup, extract_bye_weeks, parse_schedules};
use crate::store::PartitionedStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySync {
    pub entity_id: String,
    pub appended: usize,
    pub skipped: usize,
}

/// Outcome of one pipeline run. Per-entity failures land in `errors` and
/// never abort the rest of the run.
#[derive(Debug, Clone, Default)]
pub struct SyncSummary {
    pub entities_total: usize,
    pub entities_updated: usize,
    pub records_appended: usize,
    pub errors: Vec<String>,
}

/// Append exactly the records whose natural key is not yet persisted for
/// the entity. Existing rows are never mutated or deleted, so re-running
/// the same batch is a no-op beyond the delta.
pub fn sync_entity(
    store: &mut dyn PartitionedStore,
    entity_id: &str,
    records: &[StoredRecord],
) -> Result<EntitySync> {
    store.ensure_partition(entity_id)?;
    let existing = store.list_keys(entity_id)?;

    let mut seen: HashSet<GameKey> = HashSet::new();
    let mut fresh: Vec<StoredRecord> = Vec::new();
    for record in records {
        if existing.contains(&record.key) || !seen.insert(record.key.clone()) {
            continue;
        }
        fresh.push(record.clone());
    }

    let appended = store.append_records(entity_id, &fresh)?;
    Ok(EntitySync {
        entity_id: entity_id.to_string(),
        appended,
        skipped: records.len() - appended,
    })
}

fn player_profile(roster: &RosterRow) -> PlayerProfile {
    PlayerProfile {
        name: roster.name.clone(),
        position: roster.position.clone(),
        birth_date: roster.birth_date.clone(),
        team: roster.team.clone(),
        rookie_year: roster.rookie_year,
        entry_year: roster.entry_year,
        status: roster.status.clone(),
        jersey_number: roster.jersey_number,
    }
}

fn team_profile(desc: &TeamDescRow) -> TeamProfile {
    TeamProfile {
        name: desc.name.clone(),
        color: desc.color.clone(),
        color2: desc.color2.clone(),
        logo: desc.logo.clone(),
    }
}

/// A weekly stat line becomes a typed game log; statistic blocks whose
/// values are all zero collapse away entirely.
pub fn player_log_from_row(row: &WeeklyRow) -> PlayerGameLog {
    let passing = collapse_block(PassingStats {
        completions: Some(row.completions),
        attempts: Some(row.attempts),
        yards: Some(row.passing_yards),
        tds: Some(row.passing_tds),
        interceptions: Some(row.interceptions),
        sacks: Some(row.sacks),
        sack_yards: Some(row.sack_yards),
        air_yards: Some(row.passing_air_yards),
        first_downs: Some(row.passing_first_downs),
        epa: row.passing_epa,
    });
    let rushing = collapse_block(RushingStats {
        carries: Some(row.carries),
        yards: Some(row.rushing_yards),
        tds: Some(row.rushing_tds),
        fumbles: Some(row.rushing_fumbles),
        fumbles_lost: Some(row.rushing_fumbles_lost),
        first_downs: Some(row.rushing_first_downs),
        epa: row.rushing_epa,
    });
    let receiving = collapse_block(ReceivingStats {
        receptions: Some(row.receptions),
        targets: Some(row.targets),
        yards: Some(row.receiving_yards),
        tds: Some(row.receiving_tds),
        fumbles: Some(row.receiving_fumbles),
        air_yards: Some(row.receiving_air_yards),
        yards_after_catch: Some(row.receiving_yards_after_catch),
        first_downs: Some(row.receiving_first_downs),
        epa: row.receiving_epa,
    });
    let misc = collapse_block(MiscStats {
        special_teams_tds: Some(row.special_teams_tds),
        fantasy_points: row.fantasy_points,
        fantasy_points_ppr: row.fantasy_points_ppr,
    });

    PlayerGameLog {
        player_id: row.player_id.clone(),
        season: row.season,
        week: row.week,
        season_type: row.season_type,
        opponent: Opponent::Team(row.opponent.clone()),
        basics: PlayerBasics {
            name: row.player_name.clone(),
            display_name: row.player_display_name.clone(),
            position: row.position.clone(),
            position_group: row.position_group.clone(),
            headshot_url: row.headshot_url.clone(),
            team: row.team.clone(),
        },
        passing,
        rushing,
        receiving,
        misc,
    }
}

fn build_player_batch(
    rows: &[WeeklyRow],
    byes: &ByeWeekIndex,
) -> Result<Vec<StoredRecord>> {
    let logs: Vec<PlayerGameLog> = rows.iter().map(player_log_from_row).collect();
    let filled = fill_player_gaps(logs, byes);
    filled.iter().map(PlayerGameLog::stored).collect()
}

fn build_team_batch(
    rows: Vec<TeamWeekAggregate>,
    byes: &ByeWeekIndex,
    scores: &ScoreLookup,
) -> Result<Vec<StoredRecord>> {
    let filled = fill_team_gaps(rows, byes);
    let resolved = resolve_team_outcomes(filled, scores);
    resolved.iter().map(|log| log.stored()).collect()
}

/// Full player pipeline: profiles upserted from rosters, weekly lines
/// grouped per player, gap-filled, then appended incrementally, one
/// partition at a time. The pure build phase runs on the rayon pool; all
/// store access stays on this thread.
pub fn run_player_sync(
    feed: &dyn StatsFeed,
    store: &mut dyn PartitionedStore,
    years: &[i32],
) -> Result<SyncSummary> {
    info!("player sync: fetching datasets for {years:?}");
    let rosters = parse_rosters(&feed.seasonal_rosters(years).context("fetch rosters")?);
    let weekly = parse_weekly(&feed.weekly_stats(years).context("fetch weekly stats")?);
    let schedules = parse_schedules(&feed.schedules(years).context("fetch schedules")?);
    let byes = extract_bye_weeks(&schedules);
    info!(
        "player sync: {} roster rows, {} weekly rows, {} bye entries",
        rosters.len(),
        weekly.len(),
        byes.len()
    );

    let mut summary = SyncSummary::default();

    for roster in &rosters {
        let result = serde_json::to_value(player_profile(roster))
            .context("serialize player profile")
            .and_then(|profile| store.upsert_profile(&roster.player_id, &profile));
        if let Err(err) = result {
            summary
                .errors
                .push(format!("player {}: {err:#}", roster.player_id));
        }
    }

    let mut groups: BTreeMap<String, Vec<WeeklyRow>> = BTreeMap::new();
    for row in weekly {
        groups.entry(row.player_id.clone()).or_default().push(row);
    }
    summary.entities_total = groups.len();

    let grouped: Vec<(String, Vec<WeeklyRow>)> = groups.into_iter().collect();
    let batches: Vec<(String, Result<Vec<StoredRecord>>)> = grouped
        .into_par_iter()
        .map(|(player_id, rows)| {
            let batch = build_player_batch(&rows, &byes);
            (player_id, batch)
        })
        .collect();

    for (player_id, batch) in batches {
        match batch.and_then(|records| sync_entity(store, &player_id, &records)) {
            Ok(outcome) => {
                if outcome.appended > 0 {
                    summary.entities_updated += 1;
                }
                summary.records_appended += outcome.appended;
            }
            Err(err) => summary.errors.push(format!("player {player_id}: {err:#}")),
        }
    }

    info!(
        "player sync: {}/{} entities updated, {} records appended, {} errors",
        summary.entities_updated,
        summary.entities_total,
        summary.records_appended,
        summary.errors.len()
    );
    Ok(summary)
}

/// Full team pipeline: weekly lines aggregated into team weeks, gap-filled,
/// resolved against the schedule, then appended incrementally per team.
pub fn run_team_sync(
    feed: &dyn StatsFeed,
    store: &mut dyn PartitionedStore,
    years: &[i32],
    cfg: &AggregatorConfig,
) -> Result<SyncSummary> {
    info!("team sync: fetching datasets for {years:?}");
    let descriptors =
        parse_team_descriptors(&feed.team_descriptors().context("fetch team descriptors")?);
    let weekly = parse_weekly(&feed.weekly_stats(years).context("fetch weekly stats")?);
    let schedules = parse_schedules(&feed.schedules(years).context("fetch schedules")?);
    let byes = extract_bye_weeks(&schedules);
    let scores = ScoreLookup::build(&schedules);

    let mut summary = SyncSummary::default();

    for desc in &descriptors {
        let result = serde_json::to_value(team_profile(desc))
            .context("serialize team profile")
            .and_then(|profile| store.upsert_profile(&desc.abbr, &profile));
        if let Err(err) = result {
            summary.errors.push(format!("team {}: {err:#}", desc.abbr));
        }
    }

    let aggregates = aggregate_team_weeks(&weekly, cfg);
    let mut groups: BTreeMap<String, Vec<TeamWeekAggregate>> = BTreeMap::new();
    for row in aggregates {
        groups.entry(row.team.clone()).or_default().push(row);
    }
    summary.entities_total = groups.len();

    let grouped: Vec<(String, Vec<TeamWeekAggregate>)> = groups.into_iter().collect();
    let batches: Vec<(String, Result<Vec<StoredRecord>>)> = grouped
        .into_par_iter()
        .map(|(team, rows)| {
            let batch = build_team_batch(rows, &byes, &scores);
            (team, batch)
        })
        .collect();

    for (team, batch) in batches {
        match batch.and_then(|records| sync_entity(store, &team, &records)) {
            Ok(outcome) => {
                if outcome.appended > 0 {
                    summary.entities_updated += 1;
                }
                summary.records_appended += outcome.appended;
            }
            Err(err) => summary.errors.push(format!("team {team}: {err:#}")),
        }
    }

    info!(
        "team sync: {}/{} entities updated, {} records appended, {} errors",
        summary.entities_updated,
        summary.entities_total,
        summary.records_appended,
        summary.errors.len()
    );
    Ok(summary)
}
