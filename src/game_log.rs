use std::fmt;

use anyhow::{Context, Result};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

pub const BYE_MARKER: &str = "BYE";

/// Variants are declared in chronological order so the derived `Ord`
/// sorts preseason before regular season before postseason.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum SeasonType {
    #[serde(rename = "PRE")]
    Pre,
    #[default]
    #[serde(rename = "REG")]
    Reg,
    #[serde(rename = "POST")]
    Post,
}

impl SeasonType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PRE" => Some(Self::Pre),
            "REG" => Some(Self::Reg),
            "POST" => Some(Self::Post),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pre => "PRE",
            Self::Reg => "REG",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for SeasonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who an entity faced in a given week. `Bye` is a scheduled absence,
/// `Unknown` is a gap with no schedule explanation and must be preserved
/// as a data-quality signal rather than dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Opponent {
    Team(String),
    Bye,
    Unknown,
}

impl Opponent {
    pub fn from_label(label: Option<&str>) -> Self {
        match label {
            None => Self::Unknown,
            Some(BYE_MARKER) => Self::Bye,
            Some(team) => Self::Team(team.to_string()),
        }
    }

    /// The persisted form: team abbreviation, `"BYE"`, or nothing.
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Team(team) => Some(team),
            Self::Bye => Some(BYE_MARKER),
            Self::Unknown => None,
        }
    }

    pub fn team(&self) -> Option<&str> {
        match self {
            Self::Team(team) => Some(team),
            _ => None,
        }
    }
}

impl Serialize for Opponent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.label() {
            Some(label) => serializer.serialize_str(label),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Opponent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Self::from_label(raw.as_deref()))
    }
}

/// Natural key of one game record inside an entity's partition. Player
/// records leave `opponent` empty (a player appears at most once per week);
/// team records carry the opponent label, `"BYE"` included.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameKey {
    pub season: i32,
    pub week: i32,
    pub season_type: SeasonType,
    pub opponent: Option<String>,
}

/// Final score and running record for a resolved team game. `Unknown`
/// covers schedule lookup misses: the game stays in the series but the
/// running tally is not advanced by it.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Bye,
    Final {
        points_for: i64,
        points_against: i64,
        record: String,
    },
    Unknown,
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bye => serializer.serialize_str(BYE_MARKER),
            Self::Unknown => serializer.serialize_none(),
            Self::Final {
                points_for,
                points_against,
                record,
            } => {
                use serde::ser::SerializeStruct;
                let mut s = serializer.serialize_struct("Outcome", 3)?;
                s.serialize_field("points_for", points_for)?;
                s.serialize_field("points_against", points_against)?;
                s.serialize_field("record", record)?;
                s.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Outcome {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        match raw {
            Value::Null => Ok(Self::Unknown),
            Value::String(s) if s == BYE_MARKER => Ok(Self::Bye),
            Value::Object(map) => {
                let int = |key: &str| {
                    map.get(key)
                        .and_then(Value::as_i64)
                        .ok_or_else(|| D::Error::custom(format!("outcome missing {key}")))
                };
                Ok(Self::Final {
                    points_for: int("points_for")?,
                    points_against: int("points_against")?,
                    record: map
                        .get("record")
                        .and_then(Value::as_str)
                        .ok_or_else(|| D::Error::custom("outcome missing record"))?
                        .to_string(),
                })
            }
            other => Err(D::Error::custom(format!("invalid outcome: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Player statistic blocks. A block collapses to `None` on the record when
// every value in it is zero or absent, so partitions stay sparse.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassingStats {
    pub completions: Option<i64>,
    pub attempts: Option<i64>,
    pub yards: Option<f64>,
    pub tds: Option<i64>,
    pub interceptions: Option<i64>,
    pub sacks: Option<f64>,
    pub sack_yards: Option<f64>,
    pub air_yards: Option<f64>,
    pub first_downs: Option<i64>,
    pub epa: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RushingStats {
    pub carries: Option<i64>,
    pub yards: Option<f64>,
    pub tds: Option<i64>,
    pub fumbles: Option<i64>,
    pub fumbles_lost: Option<i64>,
    pub first_downs: Option<i64>,
    pub epa: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceivingStats {
    pub receptions: Option<i64>,
    pub targets: Option<i64>,
    pub yards: Option<f64>,
    pub tds: Option<i64>,
    pub fumbles: Option<i64>,
    pub air_yards: Option<f64>,
    pub yards_after_catch: Option<f64>,
    pub first_downs: Option<i64>,
    pub epa: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MiscStats {
    pub special_teams_tds: Option<i64>,
    pub fantasy_points: Option<f64>,
    pub fantasy_points_ppr: Option<f64>,
}

/// Descriptive fields snapshotted onto every player game record, so a
/// partition row is readable without a join against the profile table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerBasics {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub position: Option<String>,
    pub position_group: Option<String>,
    pub headshot_url: Option<String>,
    pub team: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerGameLog {
    pub player_id: String,
    pub season: i32,
    pub week: i32,
    pub season_type: SeasonType,
    pub opponent: Opponent,
    pub basics: PlayerBasics,
    pub passing: Option<PassingStats>,
    pub rushing: Option<RushingStats>,
    pub receiving: Option<ReceivingStats>,
    pub misc: Option<MiscStats>,
}

impl PlayerGameLog {
    /// Synthesized row for a week with no observed activity.
    pub fn placeholder(
        player_id: &str,
        basics: PlayerBasics,
        season: i32,
        week: i32,
        season_type: SeasonType,
        opponent: Opponent,
    ) -> Self {
        Self {
            player_id: player_id.to_string(),
            season,
            week,
            season_type,
            opponent,
            basics,
            passing: None,
            rushing: None,
            receiving: None,
            misc: None,
        }
    }

    pub fn key(&self) -> GameKey {
        GameKey {
            season: self.season,
            week: self.week,
            season_type: self.season_type,
            opponent: None,
        }
    }

    pub fn stored(&self) -> Result<StoredRecord> {
        Ok(StoredRecord {
            key: self.key(),
            payload: serde_json::to_value(self).context("serialize player game log")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Team statistic blocks.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OffenseStats {
    pub completions: i64,
    pub attempts: i64,
    pub passing_yards: f64,
    pub passing_tds: i64,
    pub carries: i64,
    pub rushing_yards: f64,
    pub rushing_tds: i64,
}

/// Per-role receiving breakouts are keyed by position so the set of roles
/// is configuration, not schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefenseStats {
    pub passing_yards_allowed: f64,
    pub rushing_yards_allowed: f64,
    pub carries_allowed: i64,
    pub sacks: f64,
    pub interceptions: i64,
    pub receiving_yards_allowed: std::collections::BTreeMap<String, f64>,
    pub receptions_allowed: std::collections::BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecialTeamsStats {
    pub tds: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamGameLog {
    pub team: String,
    pub season: i32,
    pub week: i32,
    pub season_type: SeasonType,
    pub opponent: Opponent,
    pub outcome: Outcome,
    pub offense: Option<OffenseStats>,
    pub defense: Option<DefenseStats>,
    pub special_teams: Option<SpecialTeamsStats>,
}

impl TeamGameLog {
    pub fn key(&self) -> GameKey {
        GameKey {
            season: self.season,
            week: self.week,
            season_type: self.season_type,
            opponent: self.opponent.label().map(str::to_string),
        }
    }

    pub fn stored(&self) -> Result<StoredRecord> {
        Ok(StoredRecord {
            key: self.key(),
            payload: serde_json::to_value(self).context("serialize team game log")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Entity profiles.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub name: Option<String>,
    pub position: Option<String>,
    pub birth_date: Option<String>,
    pub team: Option<String>,
    pub rookie_year: Option<i64>,
    pub entry_year: Option<i64>,
    pub status: Option<String>,
    pub jersey_number: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamProfile {
    pub name: Option<String>,
    pub color: Option<String>,
    pub color2: Option<String>,
    pub logo: Option<String>,
}

/// The store's uniform unit: natural key plus the full record as a JSON
/// payload. The payload keeps fields the key omits (a player's actual
/// opponent, the descriptor blocks).
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub key: GameKey,
    pub payload: Value,
}

fn all_zero_or_null(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Number(n) => n.as_f64().map(|f| f == 0.0).unwrap_or(false),
        Value::Object(map) => map.values().all(all_zero_or_null),
        _ => false,
    }
}

/// Block-level null collapsing: a statistic block whose values are all
/// zero or absent is stored as `None`, not as a block of zeros.
pub fn collapse_block<T: Serialize>(block: T) -> Option<T> {
    match serde_json::to_value(&block) {
        Ok(v) if all_zero_or_null(&v) => None,
        _ => Some(block),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opponent_round_trips_through_labels() {
        assert_eq!(Opponent::from_label(Some("KC")), Opponent::Team("KC".into()));
        assert_eq!(Opponent::from_label(Some(BYE_MARKER)), Opponent::Bye);
        assert_eq!(Opponent::from_label(None), Opponent::Unknown);
        assert_eq!(Opponent::Bye.label(), Some(BYE_MARKER));
        assert_eq!(Opponent::Unknown.label(), None);
    }

    #[test]
    fn outcome_serializes_to_sentinel_or_object() {
        let bye = serde_json::to_value(&Outcome::Bye).unwrap();
        assert_eq!(bye, serde_json::json!(BYE_MARKER));

        let unknown = serde_json::to_value(&Outcome::Unknown).unwrap();
        assert!(unknown.is_null());

        let done = Outcome::Final {
            points_for: 24,
            points_against: 17,
            record: "1-0".to_string(),
        };
        let v = serde_json::to_value(&done).unwrap();
        assert_eq!(v["points_for"], 24);
        let back: Outcome = serde_json::from_value(v).unwrap();
        assert_eq!(back, done);
    }

    #[test]
    fn zeroed_blocks_collapse_to_none() {
        let zeros = PassingStats {
            completions: Some(0),
            attempts: Some(0),
            yards: Some(0.0),
            ..PassingStats::default()
        };
        assert!(collapse_block(zeros).is_none());

        let live = PassingStats {
            completions: Some(18),
            attempts: Some(27),
            yards: Some(212.0),
            ..PassingStats::default()
        };
        assert!(collapse_block(live).is_some());

        let empty_offense = OffenseStats::default();
        assert!(collapse_block(empty_offense).is_none());
    }

    #[test]
    fn season_type_parses_case_insensitively() {
        assert_eq!(SeasonType::parse("reg"), Some(SeasonType::Reg));
        assert_eq!(SeasonType::parse(" POST "), Some(SeasonType::Post));
        assert_eq!(SeasonType::parse("exhibition"), None);
        assert!(SeasonType::Pre < SeasonType::Reg);
        assert!(SeasonType::Reg < SeasonType::Post);
    }
}
