use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, Utc};
use log::info;

use gridiron_sync::aggregate::AggregatorConfig;
use gridiron_sync::fake_feed::FakeFeed;
use gridiron_sync::feed::{HttpStatsFeed, StatsFeed};
use gridiron_sync::http::app_cache_dir;
use gridiron_sync::store::SqliteStore;
use gridiron_sync::sync::{SyncSummary, run_player_sync, run_team_sync};

const DEFAULT_YEARS: &[i32] = &[2022, 2023, 2024];

// August through February.
const SEASON_MONTHS: &[u32] = &[8, 9, 10, 11, 12, 1, 2];

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();

    if has_flag(&args, "--if-in-season") && !in_season() {
        println!("Outside the season window, nothing to update");
        return Ok(());
    }

    let years = parse_years_arg(&args)
        .or_else(years_from_env)
        .unwrap_or_else(|| DEFAULT_YEARS.to_vec());
    if years.is_empty() {
        return Err(anyhow!("no seasons resolved for ingest"));
    }

    let db_dir = parse_value_arg(&args, "--db-dir")
        .map(PathBuf::from)
        .or_else(|| std::env::var("STATS_DB_DIR").ok().map(PathBuf::from))
        .or_else(|| app_cache_dir().map(|dir| dir.join("db")))
        .context("unable to resolve a database directory")?;

    let feed: Box<dyn StatsFeed> = if has_flag(&args, "--fake") {
        info!("using the fake feed");
        Box::new(FakeFeed::default())
    } else {
        Box::new(HttpStatsFeed::from_env())
    };

    let cfg = AggregatorConfig::from_env();
    info!("receiving roles: {:?}", cfg.receiving_roles);

    println!("Ingest starting");
    println!("DB dir: {}", db_dir.display());
    println!("Seasons: {years:?}");

    if !has_flag(&args, "--skip-players") {
        let mut store = SqliteStore::open(&db_dir.join("players.sqlite"), "player")?;
        let summary = run_player_sync(feed.as_ref(), &mut store, &years)?;
        print_summary("players", &summary);
    }

    if !has_flag(&args, "--skip-teams") {
        let mut store = SqliteStore::open(&db_dir.join("teams.sqlite"), "team")?;
        let summary = run_team_sync(feed.as_ref(), &mut store, &years, &cfg)?;
        print_summary("teams", &summary);
    }

    Ok(())
}

fn print_summary(label: &str, summary: &SyncSummary) {
    println!(
        "{label}: {}/{} entities updated, {} records appended",
        summary.entities_updated, summary.entities_total, summary.records_appended
    );
    if !summary.errors.is_empty() {
        println!("  errors: {}", summary.errors.len());
        for err in summary.errors.iter().take(6) {
            println!("   - {err}");
        }
    }
}

fn in_season() -> bool {
    SEASON_MONTHS.contains(&Utc::now().month())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|arg| arg == flag)
}

fn parse_value_arg(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

fn parse_years_arg(args: &[String]) -> Option<Vec<i32>> {
    parse_value_arg(args, "--years").map(|raw| parse_years(&raw))
}

fn years_from_env() -> Option<Vec<i32>> {
    let raw = std::env::var("STATS_YEARS").ok()?;
    if raw.trim().is_empty() {
        return None;
    }
    Some(parse_years(&raw))
}

fn parse_years(raw: &str) -> Vec<i32> {
    let mut years = raw
        .split([',', ';', ' '])
        .filter_map(|part| part.trim().parse::<i32>().ok())
        .filter(|year| *year >= 1999)
        .collect::<Vec<_>>();
    years.sort_unstable();
    years.dedup();
    years
}
