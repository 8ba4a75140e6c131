use crate::aggregate::TeamWeekAggregate;
use crate::game_log::{Opponent, Outcome, TeamGameLog, collapse_block};
use crate::schedule::ScoreLookup;

/// Running win/loss/tie tally for one team within one season. Never shared
/// across entities; reset whenever the traversal crosses a season boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeasonRecord {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

impl SeasonRecord {
    pub fn tally(&mut self, points_for: i64, points_against: i64) {
        if points_for > points_against {
            self.wins += 1;
        } else if points_for < points_against {
            self.losses += 1;
        } else {
            self.ties += 1;
        }
    }

    /// "W-L", switching to "W-L-T" once a tie has happened.
    pub fn label(&self) -> String {
        if self.ties > 0 {
            format!("{}-{}-{}", self.wins, self.losses, self.ties)
        } else {
            format!("{}-{}", self.wins, self.losses)
        }
    }
}

/// Walk one team's aggregated weeks chronologically and attach outcomes.
/// Byes keep the tally untouched and skip the lookup entirely; a lookup
/// miss yields an unknown outcome and does not advance the tally.
pub fn resolve_team_outcomes(
    rows: Vec<TeamWeekAggregate>,
    scores: &ScoreLookup,
) -> Vec<TeamGameLog> {
    let mut rows = rows;
    rows.sort_by_key(|row| (row.season, row.week, row.season_type));

    let mut record = SeasonRecord::default();
    let mut current_season: Option<i32> = None;
    let mut out = Vec::with_capacity(rows.len());

    for row in rows {
        let outcome = match &row.opponent {
            Opponent::Bye => Outcome::Bye,
            Opponent::Unknown => Outcome::Unknown,
            Opponent::Team(opponent) => {
                if current_season != Some(row.season) {
                    record = SeasonRecord::default();
                    current_season = Some(row.season);
                }
                match scores.get(row.season, row.week, &row.team, opponent) {
                    Some((points_for, points_against)) => {
                        record.tally(points_for, points_against);
                        Outcome::Final {
                            points_for,
                            points_against,
                            record: record.label(),
                        }
                    }
                    None => Outcome::Unknown,
                }
            }
        };

        out.push(TeamGameLog {
            team: row.team,
            season: row.season,
            week: row.week,
            season_type: row.season_type,
            opponent: row.opponent,
            outcome,
            offense: collapse_block(row.offense),
            defense: collapse_block(row.defense),
            special_teams: collapse_block(row.special_teams),
        });
    }

    out
}
