use gridiron_sync::game_log::{
    Opponent, PassingStats, PlayerBasics, PlayerGameLog, SeasonType, StoredRecord,
};
use gridiron_sync::store::{PartitionedStore, SqliteStore};
use gridiron_sync::sync::sync_entity;
use serde_json::json;

fn player_log(week: i32, opponent: Opponent) -> PlayerGameLog {
    PlayerGameLog {
        player_id: "00-001".to_string(),
        season: 2023,
        week,
        season_type: SeasonType::Reg,
        opponent,
        basics: PlayerBasics {
            team: "ATL".to_string(),
            ..PlayerBasics::default()
        },
        passing: Some(PassingStats {
            yards: Some(200.0 + f64::from(week)),
            ..PassingStats::default()
        }),
        rushing: None,
        receiving: None,
        misc: None,
    }
}

fn stored(logs: &[PlayerGameLog]) -> Vec<StoredRecord> {
    logs.iter().map(|log| log.stored().unwrap()).collect()
}

#[test]
fn syncing_the_same_batch_twice_is_a_noop() {
    let mut store = SqliteStore::in_memory("player").unwrap();
    let records = stored(&[
        player_log(1, Opponent::Team("BUF".to_string())),
        player_log(2, Opponent::Team("CAR".to_string())),
    ]);

    let first = sync_entity(&mut store, "00-001", &records).unwrap();
    assert_eq!(first.appended, 2);
    assert_eq!(first.skipped, 0);

    let second = sync_entity(&mut store, "00-001", &records).unwrap();
    assert_eq!(second.appended, 0);
    assert_eq!(second.skipped, 2);

    assert_eq!(store.load_records("00-001").unwrap().len(), 2);
}

#[test]
fn only_the_delta_is_written_on_rerun() {
    let mut store = SqliteStore::in_memory("player").unwrap();
    let initial = stored(&[player_log(1, Opponent::Team("BUF".to_string()))]);
    sync_entity(&mut store, "00-001", &initial).unwrap();

    let wider = stored(&[
        player_log(1, Opponent::Team("BUF".to_string())),
        player_log(2, Opponent::Team("CAR".to_string())),
        player_log(3, Opponent::Team("DEN".to_string())),
    ]);
    let outcome = sync_entity(&mut store, "00-001", &wider).unwrap();
    assert_eq!(outcome.appended, 2);
    assert_eq!(outcome.skipped, 1);

    let keys = store.list_keys("00-001").unwrap();
    assert_eq!(keys.len(), 3);
}

#[test]
fn a_persisted_placeholder_is_never_overwritten() {
    let mut store = SqliteStore::in_memory("player").unwrap();

    let mut placeholder = player_log(3, Opponent::Bye);
    placeholder.passing = None;
    sync_entity(&mut store, "00-001", &stored(&[placeholder])).unwrap();

    // A later run reports a genuine game for the same week; the natural key
    // already exists, so the stored row keeps its BYE marker.
    let late_report = player_log(3, Opponent::Team("BUF".to_string()));
    let outcome = sync_entity(&mut store, "00-001", &stored(&[late_report])).unwrap();
    assert_eq!(outcome.appended, 0);

    let records = store.load_records("00-001").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].payload["opponent"], json!("BYE"));
}

#[test]
fn duplicate_keys_inside_one_batch_keep_the_first() {
    let mut store = SqliteStore::in_memory("player").unwrap();
    let records = stored(&[
        player_log(1, Opponent::Team("BUF".to_string())),
        player_log(1, Opponent::Team("BUF".to_string())),
    ]);

    let outcome = sync_entity(&mut store, "00-001", &records).unwrap();
    assert_eq!(outcome.appended, 1);
}

#[test]
fn partitions_are_independent_per_entity() {
    let mut store = SqliteStore::in_memory("player").unwrap();
    sync_entity(
        &mut store,
        "00-001",
        &stored(&[player_log(1, Opponent::Team("BUF".to_string()))]),
    )
    .unwrap();

    assert!(store.list_keys("00-002").unwrap().is_empty());
    let outcome = sync_entity(
        &mut store,
        "00-002",
        &stored(&[player_log(1, Opponent::Team("BUF".to_string()))]),
    )
    .unwrap();
    assert_eq!(outcome.appended, 1);
    assert_eq!(store.load_records("00-001").unwrap().len(), 1);
}

#[test]
fn profiles_upsert_rather_than_duplicate() {
    let mut store = SqliteStore::in_memory("player").unwrap();
    store
        .upsert_profile("00-001", &json!({"name": "Old Name"}))
        .unwrap();
    store
        .upsert_profile("00-001", &json!({"name": "New Name"}))
        .unwrap();

    assert_eq!(store.profile_ids().unwrap(), vec!["00-001".to_string()]);
}
