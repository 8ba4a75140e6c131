use std::collections::{BTreeMap, HashMap};
use std::env;

use crate::feed::WeeklyRow;
use crate::game_log::{DefenseStats, OffenseStats, Opponent, SeasonType, SpecialTeamsStats};

/// The closed set of position roles that get per-role receiving breakouts
/// on the defensive side. Explicit configuration rather than an implicit
/// constant; roles outside the set still count toward team totals.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatorConfig {
    pub receiving_roles: Vec<String>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            receiving_roles: vec!["WR".to_string(), "TE".to_string(), "RB".to_string()],
        }
    }
}

impl AggregatorConfig {
    pub fn from_env() -> Self {
        match env::var("RECEIVING_ROLES") {
            Ok(raw) if !raw.trim().is_empty() => {
                let receiving_roles: Vec<String> = raw
                    .split([',', ';', ' '])
                    .map(|part| part.trim().to_ascii_uppercase())
                    .filter(|part| !part.is_empty())
                    .collect();
                if receiving_roles.is_empty() {
                    Self::default()
                } else {
                    Self { receiving_roles }
                }
            }
            _ => Self::default(),
        }
    }
}

/// One team-week after aggregation, before gap filling and result
/// resolution. Blocks are plain values here; null collapsing happens when
/// the record is finalized.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamWeekAggregate {
    pub team: String,
    pub season: i32,
    pub week: i32,
    pub season_type: SeasonType,
    pub opponent: Opponent,
    pub offense: OffenseStats,
    pub defense: DefenseStats,
    pub special_teams: SpecialTeamsStats,
}

impl TeamWeekAggregate {
    /// Synthesized row for a week with no aggregated activity.
    pub fn placeholder(
        team: &str,
        season: i32,
        week: i32,
        season_type: SeasonType,
        opponent: Opponent,
    ) -> Self {
        Self {
            team: team.to_string(),
            season,
            week,
            season_type,
            opponent,
            offense: OffenseStats::default(),
            defense: DefenseStats::default(),
            special_teams: SpecialTeamsStats::default(),
        }
    }
}

type FullKey = (String, i32, i32, SeasonType, String);
type DefenseKey = (String, i32, i32, SeasonType);

struct DefenseAcc {
    opponent: String,
    stats: DefenseStats,
}

/// Offensive roll-up: individual contributions summed per
/// (team, season, week, season-type, opponent). Special-teams touchdowns
/// ride along since they come from the same rows.
fn aggregate_offense(rows: &[WeeklyRow]) -> HashMap<FullKey, (OffenseStats, i64)> {
    let mut acc: HashMap<FullKey, (OffenseStats, i64)> = HashMap::new();
    for row in rows {
        let key = (
            row.team.clone(),
            row.season,
            row.week,
            row.season_type,
            row.opponent.clone(),
        );
        let (offense, special_tds) = acc.entry(key).or_default();
        offense.completions += row.completions;
        offense.attempts += row.attempts;
        offense.passing_yards += row.passing_yards;
        offense.passing_tds += row.passing_tds;
        offense.carries += row.carries;
        offense.rushing_yards += row.rushing_yards;
        offense.rushing_tds += row.rushing_tds;
        *special_tds += row.special_teams_tds;
    }
    acc
}

/// Defensive roll-up: the individual's opponent is the team on defense, so
/// rows group by (opponent, season, week, season-type). Receiving
/// production is additionally broken out per configured role; roles with
/// nothing allowed get explicit zero entries, not missing ones.
fn aggregate_defense(rows: &[WeeklyRow], roles: &[String]) -> HashMap<DefenseKey, DefenseAcc> {
    let mut acc: HashMap<DefenseKey, DefenseAcc> = HashMap::new();
    for row in rows {
        let key = (
            row.opponent.clone(),
            row.season,
            row.week,
            row.season_type,
        );
        let entry = acc.entry(key).or_insert_with(|| DefenseAcc {
            opponent: row.team.clone(),
            stats: zeroed_defense(roles),
        });
        entry.stats.passing_yards_allowed += row.passing_yards;
        entry.stats.rushing_yards_allowed += row.rushing_yards;
        entry.stats.carries_allowed += row.carries;
        entry.stats.sacks += row.sacks;
        entry.stats.interceptions += row.interceptions;

        if let Some(position) = row.position.as_deref() {
            if roles.iter().any(|role| role == position) {
                *entry
                    .stats
                    .receiving_yards_allowed
                    .entry(position.to_string())
                    .or_insert(0.0) += row.receiving_yards;
                *entry
                    .stats
                    .receptions_allowed
                    .entry(position.to_string())
                    .or_insert(0) += row.receptions;
            }
        }
    }
    acc
}

fn zeroed_defense(roles: &[String]) -> DefenseStats {
    let mut stats = DefenseStats::default();
    for role in roles {
        stats.receiving_yards_allowed.insert(role.clone(), 0.0);
        stats.receptions_allowed.insert(role.clone(), 0);
    }
    stats
}

/// Outer-join of the offensive and defensive aggregates on the full game
/// key; a side with no rows contributes zeros rather than dropping the
/// game. Output is ordered by (team, season, week).
pub fn aggregate_team_weeks(rows: &[WeeklyRow], cfg: &AggregatorConfig) -> Vec<TeamWeekAggregate> {
    let offense = aggregate_offense(rows);
    let defense = aggregate_defense(rows, &cfg.receiving_roles);

    let mut merged: BTreeMap<FullKey, TeamWeekAggregate> = BTreeMap::new();
    for (key, (off, special_tds)) in offense {
        let (team, season, week, season_type, opponent) = key.clone();
        merged.insert(
            key,
            TeamWeekAggregate {
                team,
                season,
                week,
                season_type,
                opponent: Opponent::Team(opponent),
                offense: off,
                defense: zeroed_defense(&cfg.receiving_roles),
                special_teams: SpecialTeamsStats { tds: special_tds },
            },
        );
    }
    for (key, acc) in defense {
        let (team, season, week, season_type) = key;
        let full = (team, season, week, season_type, acc.opponent.clone());
        match merged.get_mut(&full) {
            Some(row) => row.defense = acc.stats,
            None => {
                let (team, season, week, season_type, opponent) = full.clone();
                merged.insert(
                    full,
                    TeamWeekAggregate {
                        team,
                        season,
                        week,
                        season_type,
                        opponent: Opponent::Team(opponent),
                        offense: OffenseStats::default(),
                        defense: acc.stats,
                        special_teams: SpecialTeamsStats::default(),
                    },
                );
            }
        }
    }

    merged.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receiving_roles_env_parsing_falls_back_to_default() {
        let cfg = AggregatorConfig::default();
        assert_eq!(cfg.receiving_roles, vec!["WR", "TE", "RB"]);
    }
}
