use std::env;

use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use serde_json::{Map, Value};

use crate::clean::{float_or_zero, int_or_zero, opt_float, opt_int, opt_str};
use crate::game_log::SeasonType;
use crate::http;

const DEFAULT_FEED_BASE_URL: &str =
    "https://github.com/nflverse/nflverse-data/releases/download";

static NULL: Value = Value::Null;

/// One row of an in-memory tabular dataset. Absent columns read as null,
/// which the cleaning layer turns into zero for optional statistics.
#[derive(Debug, Clone, Default)]
pub struct Row(Map<String, Value>);

impl Row {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, column: &str) -> &Value {
        self.0.get(column).unwrap_or(&NULL)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Table {
    rows: Vec<Row>,
}

impl Table {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Expects a JSON array of objects; non-object elements are skipped.
    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Array(items) = value else {
            return Err(anyhow!("expected a JSON array of rows"));
        };
        let rows = items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(Row(map)),
                _ => None,
            })
            .collect();
        Ok(Self { rows })
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    pub fn extend(&mut self, other: Table) {
        self.rows.extend(other.rows);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The external data provider. Implementations hand back already-fetched
/// in-memory tables; everything downstream is provider-agnostic.
pub trait StatsFeed {
    fn seasonal_rosters(&self, years: &[i32]) -> Result<Table>;
    fn weekly_stats(&self, years: &[i32]) -> Result<Table>;
    fn team_descriptors(&self) -> Result<Table>;
    fn schedules(&self, years: &[i32]) -> Result<Table>;
}

/// One player-week line from the weekly dataset, typed and zero-defaulted.
/// Rows missing identity fields never make it out of parsing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeeklyRow {
    pub player_id: String,
    pub player_name: Option<String>,
    pub player_display_name: Option<String>,
    pub position: Option<String>,
    pub position_group: Option<String>,
    pub headshot_url: Option<String>,
    pub team: String,
    pub opponent: String,
    pub season: i32,
    pub week: i32,
    pub season_type: SeasonType,

    pub completions: i64,
    pub attempts: i64,
    pub passing_yards: f64,
    pub passing_tds: i64,
    pub interceptions: i64,
    pub sacks: f64,
    pub sack_yards: f64,
    pub passing_air_yards: f64,
    pub passing_first_downs: i64,
    pub passing_epa: Option<f64>,

    pub carries: i64,
    pub rushing_yards: f64,
    pub rushing_tds: i64,
    pub rushing_fumbles: i64,
    pub rushing_fumbles_lost: i64,
    pub rushing_first_downs: i64,
    pub rushing_epa: Option<f64>,

    pub receptions: i64,
    pub targets: i64,
    pub receiving_yards: f64,
    pub receiving_tds: i64,
    pub receiving_fumbles: i64,
    pub receiving_air_yards: f64,
    pub receiving_yards_after_catch: f64,
    pub receiving_first_downs: i64,
    pub receiving_epa: Option<f64>,

    pub special_teams_tds: i64,
    pub fantasy_points: Option<f64>,
    pub fantasy_points_ppr: Option<f64>,
}

pub fn parse_weekly(table: &Table) -> Vec<WeeklyRow> {
    let mut out = Vec::with_capacity(table.len());
    let mut skipped = 0usize;
    for row in table.rows() {
        match parse_weekly_row(row) {
            Some(parsed) => out.push(parsed),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("weekly parse skipped {skipped} rows without full identity");
    }
    out
}

fn parse_weekly_row(row: &Row) -> Option<WeeklyRow> {
    Some(WeeklyRow {
        player_id: opt_str(row.get("player_id"))?,
        player_name: opt_str(row.get("player_name")),
        player_display_name: opt_str(row.get("player_display_name")),
        position: opt_str(row.get("position")),
        position_group: opt_str(row.get("position_group")),
        headshot_url: opt_str(row.get("headshot_url")),
        team: opt_str(row.get("recent_team"))?,
        opponent: opt_str(row.get("opponent_team"))?,
        season: opt_int(row.get("season"))? as i32,
        week: opt_int(row.get("week"))? as i32,
        season_type: SeasonType::parse(&opt_str(row.get("season_type"))?)?,

        completions: int_or_zero(row.get("completions")),
        attempts: int_or_zero(row.get("attempts")),
        passing_yards: float_or_zero(row.get("passing_yards")),
        passing_tds: int_or_zero(row.get("passing_tds")),
        interceptions: int_or_zero(row.get("interceptions")),
        sacks: float_or_zero(row.get("sacks")),
        sack_yards: float_or_zero(row.get("sack_yards")),
        passing_air_yards: float_or_zero(row.get("passing_air_yards")),
        passing_first_downs: int_or_zero(row.get("passing_first_downs")),
        passing_epa: opt_float(row.get("passing_epa")),

        carries: int_or_zero(row.get("carries")),
        rushing_yards: float_or_zero(row.get("rushing_yards")),
        rushing_tds: int_or_zero(row.get("rushing_tds")),
        rushing_fumbles: int_or_zero(row.get("rushing_fumbles")),
        rushing_fumbles_lost: int_or_zero(row.get("rushing_fumbles_lost")),
        rushing_first_downs: int_or_zero(row.get("rushing_first_downs")),
        rushing_epa: opt_float(row.get("rushing_epa")),

        receptions: int_or_zero(row.get("receptions")),
        targets: int_or_zero(row.get("targets")),
        receiving_yards: float_or_zero(row.get("receiving_yards")),
        receiving_tds: int_or_zero(row.get("receiving_tds")),
        receiving_fumbles: int_or_zero(row.get("receiving_fumbles")),
        receiving_air_yards: float_or_zero(row.get("receiving_air_yards")),
        receiving_yards_after_catch: float_or_zero(row.get("receiving_yards_after_catch")),
        receiving_first_downs: int_or_zero(row.get("receiving_first_downs")),
        receiving_epa: opt_float(row.get("receiving_epa")),

        special_teams_tds: int_or_zero(row.get("special_teams_tds")),
        fantasy_points: opt_float(row.get("fantasy_points")),
        fantasy_points_ppr: opt_float(row.get("fantasy_points_ppr")),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct RosterRow {
    pub player_id: String,
    pub name: Option<String>,
    pub position: Option<String>,
    pub birth_date: Option<String>,
    pub team: Option<String>,
    pub rookie_year: Option<i64>,
    pub entry_year: Option<i64>,
    pub status: Option<String>,
    pub jersey_number: Option<i64>,
}

pub fn parse_rosters(table: &Table) -> Vec<RosterRow> {
    use crate::clean::opt_date_string;
    table
        .rows()
        .filter_map(|row| {
            Some(RosterRow {
                player_id: opt_str(row.get("player_id"))?,
                name: opt_str(row.get("player_name")),
                position: opt_str(row.get("position")),
                birth_date: opt_date_string(row.get("birth_date")),
                team: opt_str(row.get("team")),
                rookie_year: opt_int(row.get("rookie_year")),
                entry_year: opt_int(row.get("entry_year")),
                status: opt_str(row.get("status")),
                jersey_number: opt_int(row.get("jersey_number")),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamDescRow {
    pub abbr: String,
    pub name: Option<String>,
    pub color: Option<String>,
    pub color2: Option<String>,
    pub logo: Option<String>,
}

pub fn parse_team_descriptors(table: &Table) -> Vec<TeamDescRow> {
    table
        .rows()
        .filter_map(|row| {
            Some(TeamDescRow {
                abbr: opt_str(row.get("team_abbr"))?,
                name: opt_str(row.get("team_name")),
                color: opt_str(row.get("team_color")),
                color2: opt_str(row.get("team_color2")),
                logo: opt_str(row.get("team_logo_wikipedia"))
                    .or_else(|| opt_str(row.get("team_logo"))),
            })
        })
        .collect()
}

/// Fetches per-season JSON datasets over HTTPS through the conditional-GET
/// cache. Only the dataset naming lives here; everything downstream sees
/// plain tables.
#[derive(Debug, Clone)]
pub struct HttpStatsFeed {
    base_url: String,
}

impl HttpStatsFeed {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    pub fn from_env() -> Self {
        let base = env::var("STATS_FEED_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FEED_BASE_URL.to_string());
        Self::new(base)
    }

    fn fetch_dataset(&self, dataset: &str, file: &str) -> Result<Table> {
        let url = format!("{}/{dataset}/{file}.json", self.base_url);
        let client = http::client()?;
        let body = http::fetch_cached(client, &url)
            .with_context(|| format!("fetch dataset {dataset}/{file}"))?;
        let value: Value = serde_json::from_str(body.trim())
            .with_context(|| format!("invalid json for dataset {dataset}/{file}"))?;
        Table::from_json(value)
    }

    fn fetch_yearly(&self, dataset: &str, prefix: &str, years: &[i32]) -> Result<Table> {
        let mut merged = Table::default();
        for year in years {
            let table = self.fetch_dataset(dataset, &format!("{prefix}_{year}"))?;
            info!("feed: {dataset} {year} -> {} rows", table.len());
            merged.extend(table);
        }
        Ok(merged)
    }
}

impl StatsFeed for HttpStatsFeed {
    fn seasonal_rosters(&self, years: &[i32]) -> Result<Table> {
        self.fetch_yearly("rosters", "roster", years)
    }

    fn weekly_stats(&self, years: &[i32]) -> Result<Table> {
        self.fetch_yearly("player_stats", "player_stats", years)
    }

    fn team_descriptors(&self) -> Result<Table> {
        self.fetch_dataset("teams", "teams")
    }

    fn schedules(&self, years: &[i32]) -> Result<Table> {
        self.fetch_yearly("schedules", "sched", years)
    }
}
