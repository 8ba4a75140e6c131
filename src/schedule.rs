use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::clean::{opt_int, opt_str};
use crate::feed::Table;
use crate::game_log::SeasonType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleGame {
    pub season: i32,
    pub week: i32,
    pub game_type: SeasonType,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
}

/// Rows missing any identity field are dropped; scores stay optional until
/// the game has been played.
pub fn parse_schedules(table: &Table) -> Vec<ScheduleGame> {
    let mut out = Vec::with_capacity(table.len());
    let mut skipped = 0usize;
    for row in table.rows() {
        let parsed = (|| {
            Some(ScheduleGame {
                season: opt_int(row.get("season"))? as i32,
                week: opt_int(row.get("week"))? as i32,
                game_type: SeasonType::parse(&opt_str(row.get("game_type"))?)?,
                home_team: opt_str(row.get("home_team"))?,
                away_team: opt_str(row.get("away_team"))?,
                home_score: opt_int(row.get("home_score")),
                away_score: opt_int(row.get("away_score")),
            })
        })();
        match parsed {
            Some(game) => out.push(game),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("schedule parse skipped {skipped} incomplete rows");
    }
    out
}

/// Weeks with no scheduled game, per (entity, season), derived from
/// regular-season rows only. Immutable once computed.
#[derive(Debug, Clone, Default)]
pub struct ByeWeekIndex {
    byes: HashMap<(String, i32), Vec<i32>>,
}

impl ByeWeekIndex {
    pub fn byes_for(&self, entity: &str, season: i32) -> &[i32] {
        self.byes
            .get(&(entity.to_string(), season))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_bye(&self, entity: &str, season: i32, week: i32) -> bool {
        self.byes_for(entity, season).contains(&week)
    }

    pub fn len(&self) -> usize {
        self.byes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.byes.is_empty()
    }
}

/// For each season: the league-wide set of regular-season weeks, minus the
/// weeks an entity actually appears in. Entities are collected across the
/// whole input, so one inactive for an entire season keeps every league
/// week of that season as a bye rather than erroring out.
pub fn extract_bye_weeks(games: &[ScheduleGame]) -> ByeWeekIndex {
    let mut seasons: BTreeMap<i32, Vec<&ScheduleGame>> = BTreeMap::new();
    let mut entities: HashSet<&str> = HashSet::new();
    for game in games {
        if game.game_type == SeasonType::Reg {
            seasons.entry(game.season).or_default().push(game);
            entities.insert(game.home_team.as_str());
            entities.insert(game.away_team.as_str());
        }
    }

    let mut byes = HashMap::new();
    for (season, season_games) in seasons {
        let league_weeks: BTreeSet<i32> = season_games.iter().map(|g| g.week).collect();

        let mut entity_weeks: HashMap<&str, BTreeSet<i32>> = HashMap::new();
        for game in &season_games {
            for team in [game.home_team.as_str(), game.away_team.as_str()] {
                entity_weeks.entry(team).or_default().insert(game.week);
            }
        }

        for entity in &entities {
            let played = entity_weeks.get(entity).cloned().unwrap_or_default();
            let missing: Vec<i32> = league_weeks.difference(&played).copied().collect();
            byes.insert((entity.to_string(), season), missing);
        }
    }

    ByeWeekIndex { byes }
}

/// Final scores indexed by (season, week, team, opponent), stored in both
/// orientations so the caller never has to know which side was home.
#[derive(Debug, Default)]
pub struct ScoreLookup {
    scores: HashMap<(i32, i32, String, String), (i64, i64)>,
}

impl ScoreLookup {
    pub fn build(games: &[ScheduleGame]) -> Self {
        let mut scores = HashMap::new();
        for game in games {
            let (Some(home), Some(away)) = (game.home_score, game.away_score) else {
                continue;
            };
            scores.insert(
                (
                    game.season,
                    game.week,
                    game.home_team.clone(),
                    game.away_team.clone(),
                ),
                (home, away),
            );
            scores.insert(
                (
                    game.season,
                    game.week,
                    game.away_team.clone(),
                    game.home_team.clone(),
                ),
                (away, home),
            );
        }
        Self { scores }
    }

    /// (points for `team`, points for `opponent`), or `None` when the game
    /// is absent from the schedule or not yet scored.
    pub fn get(&self, season: i32, week: i32, team: &str, opponent: &str) -> Option<(i64, i64)> {
        self.scores
            .get(&(season, week, team.to_string(), opponent.to_string()))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reg(season: i32, week: i32, home: &str, away: &str) -> ScheduleGame {
        ScheduleGame {
            season,
            week,
            game_type: SeasonType::Reg,
            home_team: home.to_string(),
            away_team: away.to_string(),
            home_score: None,
            away_score: None,
        }
    }

    #[test]
    fn byes_are_league_weeks_minus_entity_weeks() {
        let games = vec![
            reg(2023, 1, "ATL", "BUF"),
            reg(2023, 1, "CAR", "DEN"),
            reg(2023, 2, "ATL", "CAR"),
            reg(2023, 3, "BUF", "DEN"),
            reg(2023, 3, "ATL", "CAR"),
        ];
        let byes = extract_bye_weeks(&games);
        assert_eq!(byes.byes_for("ATL", 2023), &[] as &[i32]);
        assert_eq!(byes.byes_for("BUF", 2023), &[2]);
        assert_eq!(byes.byes_for("DEN", 2023), &[2]);
        assert!(byes.is_bye("BUF", 2023, 2));
        assert!(!byes.is_bye("BUF", 2023, 1));
    }

    #[test]
    fn postseason_rows_do_not_shape_byes() {
        let mut games = vec![reg(2023, 1, "ATL", "BUF"), reg(2023, 2, "ATL", "BUF")];
        games.push(ScheduleGame {
            game_type: SeasonType::Post,
            ..reg(2023, 19, "ATL", "CAR")
        });
        let byes = extract_bye_weeks(&games);
        // CAR only appears in the postseason, so it has no bye entry at all.
        assert_eq!(byes.byes_for("CAR", 2023), &[] as &[i32]);
        assert_eq!(byes.byes_for("ATL", 2023), &[] as &[i32]);
    }

    #[test]
    fn entity_absent_all_season_gets_every_league_week() {
        // DEN plays in 2022 but sits out all of 2023.
        let games = vec![
            reg(2022, 1, "ATL", "DEN"),
            reg(2023, 1, "ATL", "BUF"),
            reg(2023, 2, "ATL", "BUF"),
        ];
        let byes = extract_bye_weeks(&games);
        assert_eq!(byes.byes_for("DEN", 2023), &[1, 2]);
        assert_eq!(byes.byes_for("DEN", 2022), &[] as &[i32]);
    }

    #[test]
    fn score_lookup_orients_to_the_caller() {
        let mut game = reg(2023, 1, "ATL", "BUF");
        game.home_score = Some(24);
        game.away_score = Some(17);
        let lookup = ScoreLookup::build(&[game]);
        assert_eq!(lookup.get(2023, 1, "ATL", "BUF"), Some((24, 17)));
        assert_eq!(lookup.get(2023, 1, "BUF", "ATL"), Some((17, 24)));
        assert_eq!(lookup.get(2023, 2, "ATL", "BUF"), None);
    }
}
