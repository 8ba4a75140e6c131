use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::Hash;

use crate::aggregate::TeamWeekAggregate;
use crate::game_log::{Opponent, PlayerGameLog, SeasonType};
use crate::schedule::ByeWeekIndex;

/// Provider re-reports resolve to the last-seen row for a natural key,
/// keeping the original encounter order otherwise.
fn dedup_last_by<T, K, F>(rows: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut out: Vec<T> = Vec::with_capacity(rows.len());
    let mut slots: HashMap<K, usize> = HashMap::new();
    for row in rows {
        let k = key(&row);
        if let Some(&slot) = slots.get(&k) {
            out[slot] = row;
        } else {
            slots.insert(k, out.len());
            out.push(row);
        }
    }
    out
}

/// Weeks absent from `observed`, strictly inside its min..max span.
/// Leading and trailing absence is never synthesized.
fn interior_gaps(observed: &BTreeSet<i32>) -> Vec<i32> {
    let (Some(&min), Some(&max)) = (observed.iter().next(), observed.iter().next_back()) else {
        return Vec::new();
    };
    (min..=max).filter(|week| !observed.contains(week)).collect()
}

fn gap_opponent(byes: &ByeWeekIndex, entity: &str, season: i32, week: i32) -> Opponent {
    if byes.is_bye(entity, season, week) {
        Opponent::Bye
    } else {
        // Unscheduled gap: a data-quality signal, kept visible.
        Opponent::Unknown
    }
}

/// Fill one player's series. Grouping is (season, season-type, team
/// affiliation at the time), so a mid-season trade starts a fresh span and
/// the old team's weeks are not back-filled under the new one.
pub fn fill_player_gaps(logs: Vec<PlayerGameLog>, byes: &ByeWeekIndex) -> Vec<PlayerGameLog> {
    let mut logs = dedup_last_by(logs, |log| (log.season, log.week, log.season_type));

    let mut groups: BTreeMap<(i32, SeasonType, String), BTreeSet<i32>> = BTreeMap::new();
    let mut exemplar: HashMap<(i32, SeasonType, String), usize> = HashMap::new();
    for (idx, log) in logs.iter().enumerate() {
        let key = (log.season, log.season_type, log.basics.team.clone());
        groups.entry(key.clone()).or_default().insert(log.week);
        exemplar.entry(key).or_insert(idx);
    }

    let mut synthesized = Vec::new();
    for ((season, season_type, team), observed) in &groups {
        let idx = exemplar[&(*season, *season_type, team.clone())];
        let template = &logs[idx];
        for week in interior_gaps(observed) {
            let opponent = gap_opponent(byes, team, *season, week);
            synthesized.push(PlayerGameLog::placeholder(
                &template.player_id,
                template.basics.clone(),
                *season,
                week,
                *season_type,
                opponent,
            ));
        }
    }

    logs.extend(synthesized);
    logs.sort_by_key(|log| (log.season, log.week, log.season_type));
    logs
}

/// Fill one team's aggregated series; the affiliation is the team itself.
pub fn fill_team_gaps(rows: Vec<TeamWeekAggregate>, byes: &ByeWeekIndex) -> Vec<TeamWeekAggregate> {
    let mut rows = dedup_last_by(rows, |row| {
        (
            row.season,
            row.week,
            row.season_type,
            row.opponent.label().map(str::to_string),
        )
    });

    let mut groups: BTreeMap<(i32, SeasonType, String), BTreeSet<i32>> = BTreeMap::new();
    for row in &rows {
        groups
            .entry((row.season, row.season_type, row.team.clone()))
            .or_default()
            .insert(row.week);
    }

    let mut synthesized = Vec::new();
    for ((season, season_type, team), observed) in &groups {
        for week in interior_gaps(observed) {
            let opponent = gap_opponent(byes, team, *season, week);
            synthesized.push(TeamWeekAggregate::placeholder(
                team,
                *season,
                week,
                *season_type,
                opponent,
            ));
        }
    }

    rows.extend(synthesized);
    rows.sort_by_key(|row| (row.season, row.week, row.season_type));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_gaps_ignore_leading_and_trailing_absence() {
        let observed: BTreeSet<i32> = [4, 5, 8, 10].into_iter().collect();
        assert_eq!(interior_gaps(&observed), vec![6, 7, 9]);

        let single: BTreeSet<i32> = [3].into_iter().collect();
        assert!(interior_gaps(&single).is_empty());
        assert!(interior_gaps(&BTreeSet::new()).is_empty());
    }

    #[test]
    fn dedup_keeps_the_last_seen_row() {
        let rows = vec![(1, "old"), (2, "only"), (1, "new")];
        let deduped = dedup_last_by(rows, |&(k, _)| k);
        assert_eq!(deduped, vec![(1, "new"), (2, "only")]);
    }
}
