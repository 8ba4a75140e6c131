use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};

use crate::feed::{StatsFeed, Table};

const TEAMS: &[(&str, &str, &str, &str)] = &[
    ("ATL", "Atlanta Falcons", "#A71930", "#000000"),
    ("BUF", "Buffalo Bills", "#00338D", "#C60C30"),
    ("CAR", "Carolina Panthers", "#0085CA", "#101820"),
    ("DEN", "Denver Broncos", "#FB4F14", "#002244"),
    ("GB", "Green Bay Packers", "#203731", "#FFB612"),
];

// QB / RB / WR / TE per team.
const SLOTS: &[(&str, &str)] = &[
    ("QB", "QB"),
    ("RB", "RB"),
    ("WR", "WR"),
    ("TE", "TE"),
];

const FIRST_NAMES: &[&str] = &["Marcus", "Deon", "Tyler", "Jalen", "Cole"];
const LAST_NAMES: &[&str] = &["Hayes", "Porter", "Whitfield", "Okafor"];

const WEEKS: i32 = 5;

/// Generates a small five-team league with one team idle (on bye) each
/// week. Every derived table is consistent with the schedule, and the same
/// seed always produces the same data.
#[derive(Debug, Clone)]
pub struct FakeFeed {
    seed: u64,
}

impl Default for FakeFeed {
    fn default() -> Self {
        Self { seed: 7 }
    }
}

impl FakeFeed {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn week_rng(&self, season: i32, week: i32) -> StdRng {
        StdRng::seed_from_u64(
            self.seed ^ ((season as u64) << 16) ^ ((week as u64) << 4),
        )
    }

    /// With an odd team count, rotating the idle slot gives every team
    /// exactly one bye inside the five-week span.
    fn week_matchups(week: i32) -> (&'static str, Vec<(&'static str, &'static str)>) {
        let idle_idx = ((week - 1) as usize) % TEAMS.len();
        let idle = TEAMS[idle_idx].0;
        let mut active: Vec<&str> = TEAMS
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != idle_idx)
            .map(|(_, team)| team.0)
            .collect();
        let rot = (week as usize) % active.len();
        active.rotate_left(rot);
        let games = vec![(active[0], active[1]), (active[2], active[3])];
        (idle, games)
    }

    fn player_id(team_idx: usize, slot_idx: usize) -> String {
        format!("00-00{team_idx:02}{slot_idx:02}")
    }

    fn player_name(team_idx: usize, slot_idx: usize) -> String {
        format!(
            "{} {}",
            FIRST_NAMES[(team_idx + slot_idx) % FIRST_NAMES.len()],
            LAST_NAMES[(team_idx * 2 + slot_idx) % LAST_NAMES.len()],
        )
    }

    fn weekly_lines(&self, season: i32, week: i32, team: &str, opponent: &str) -> Vec<Value> {
        let team_idx = TEAMS.iter().position(|t| t.0 == team).unwrap_or(0);
        let mut rng = self.week_rng(season, week * 8 + team_idx as i32);
        let mut out = Vec::with_capacity(SLOTS.len());
        for (slot_idx, (position, group)) in SLOTS.iter().enumerate() {
            let mut line = json!({
                "player_id": Self::player_id(team_idx, slot_idx),
                "player_name": Self::player_name(team_idx, slot_idx),
                "player_display_name": Self::player_name(team_idx, slot_idx),
                "position": position,
                "position_group": group,
                "recent_team": team,
                "opponent_team": opponent,
                "season": season,
                "week": week,
                "season_type": "REG",
            });
            let obj = line.as_object_mut().expect("weekly line is an object");
            match *position {
                "QB" => {
                    let attempts = rng.gen_range(22..40);
                    let completions = rng.gen_range(attempts / 2..attempts);
                    obj.insert("completions".into(), json!(completions));
                    obj.insert("attempts".into(), json!(attempts));
                    obj.insert("passing_yards".into(), json!(rng.gen_range(140..330) as f64));
                    obj.insert("passing_tds".into(), json!(rng.gen_range(0..4)));
                    obj.insert("interceptions".into(), json!(rng.gen_range(0..3)));
                    obj.insert("sacks".into(), json!(rng.gen_range(0..5) as f64));
                    obj.insert("carries".into(), json!(rng.gen_range(0..5)));
                    obj.insert("rushing_yards".into(), json!(rng.gen_range(0..30) as f64));
                }
                "RB" => {
                    obj.insert("carries".into(), json!(rng.gen_range(10..25)));
                    obj.insert("rushing_yards".into(), json!(rng.gen_range(30..140) as f64));
                    obj.insert("rushing_tds".into(), json!(rng.gen_range(0..3)));
                    obj.insert("receptions".into(), json!(rng.gen_range(0..6)));
                    obj.insert("targets".into(), json!(rng.gen_range(0..8)));
                    obj.insert("receiving_yards".into(), json!(rng.gen_range(0..50) as f64));
                }
                _ => {
                    let targets = rng.gen_range(3..12);
                    let receptions = rng.gen_range(0..=targets);
                    obj.insert("receptions".into(), json!(receptions));
                    obj.insert("targets".into(), json!(targets));
                    obj.insert("receiving_yards".into(), json!(rng.gen_range(10..130) as f64));
                    obj.insert("receiving_tds".into(), json!(rng.gen_range(0..2)));
                }
            }
            out.push(line);
        }
        out
    }
}

impl StatsFeed for FakeFeed {
    fn seasonal_rosters(&self, years: &[i32]) -> Result<Table> {
        let mut rows = Vec::new();
        for &season in years {
            for (team_idx, team) in TEAMS.iter().enumerate() {
                for (slot_idx, (position, _)) in SLOTS.iter().enumerate() {
                    rows.push(json!({
                        "player_id": Self::player_id(team_idx, slot_idx),
                        "player_name": Self::player_name(team_idx, slot_idx),
                        "position": position,
                        "birth_date": format!("199{}-0{}-1{}", team_idx + 3, slot_idx + 1, slot_idx + 1),
                        "team": team.0,
                        "rookie_year": 2015 + (team_idx as i32),
                        "entry_year": 2015 + (team_idx as i32),
                        "status": "ACT",
                        "jersey_number": 10 + (slot_idx as i32) * 7,
                        "season": season,
                    }));
                }
            }
        }
        Table::from_json(Value::Array(rows))
    }

    fn weekly_stats(&self, years: &[i32]) -> Result<Table> {
        let mut rows = Vec::new();
        for &season in years {
            for week in 1..=WEEKS {
                let (_, games) = Self::week_matchups(week);
                for (home, away) in games {
                    rows.extend(self.weekly_lines(season, week, home, away));
                    rows.extend(self.weekly_lines(season, week, away, home));
                }
            }
        }
        Table::from_json(Value::Array(rows))
    }

    fn team_descriptors(&self) -> Result<Table> {
        let rows = TEAMS
            .iter()
            .map(|(abbr, name, color, color2)| {
                json!({
                    "team_abbr": abbr,
                    "team_name": name,
                    "team_color": color,
                    "team_color2": color2,
                    "team_logo": format!("https://static.example.com/logos/{abbr}.png"),
                })
            })
            .collect();
        Table::from_json(Value::Array(rows))
    }

    fn schedules(&self, years: &[i32]) -> Result<Table> {
        let mut rows = Vec::new();
        for &season in years {
            for week in 1..=WEEKS {
                let mut rng = self.week_rng(season, week);
                let (_, games) = Self::week_matchups(week);
                for (home, away) in games {
                    rows.push(json!({
                        "season": season,
                        "week": week,
                        "game_type": "REG",
                        "home_team": home,
                        "away_team": away,
                        "home_score": rng.gen_range(6..38),
                        "away_score": rng.gen_range(6..38),
                    }));
                }
            }
        }
        Table::from_json(Value::Array(rows))
    }
}
