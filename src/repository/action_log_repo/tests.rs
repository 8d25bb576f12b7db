use super::ActionLogRepository;
use crate::domain::action_log::{ActionLog, ActionType};
use rusqlite::Connection;
use serde_json::json;
use std::sync::{Arc, Mutex};

fn setup_test_db() -> Arc<Mutex<Connection>> {
    let conn = Connection::open_in_memory().unwrap();
    crate::db::configure_sqlite_connection(&conn).unwrap();
    crate::db::init_schema(&conn).unwrap();
    Arc::new(Mutex::new(conn))
}

#[test]
fn test_insert_and_find_by_id() {
    let repo = ActionLogRepository::new(setup_test_db());

    let log = ActionLog::new(1, Some(10), ActionType::PlaceProduct, "user1")
        .with_payload(json!({"row": 0, "column": 0}))
        .with_detail("陈列商品".to_string());
    let id = repo.insert(&log).unwrap();
    assert_eq!(id, log.action_id);

    let found = repo.find_by_id(&id).unwrap().unwrap();
    assert_eq!(found.shelf_id, 1);
    assert_eq!(found.placement_id, Some(10));
    assert_eq!(found.actor, "user1");
    assert_eq!(found.parsed_action_type(), Some(ActionType::PlaceProduct));
    assert_eq!(found.payload_json.unwrap()["row"], 0);
}

#[test]
fn test_find_missing() {
    let repo = ActionLogRepository::new(setup_test_db());
    assert!(repo.find_by_id("nope").unwrap().is_none());
}

#[test]
fn test_find_by_shelf_latest_first() {
    let repo = ActionLogRepository::new(setup_test_db());

    let first = ActionLog::new(1, Some(1), ActionType::PlaceProduct, "u");
    let second = ActionLog::new(1, Some(1), ActionType::RemovePlacement, "u");
    let other = ActionLog::new(2, None, ActionType::DeleteShelf, "u");
    for log in [&first, &second, &other] {
        repo.insert(log).unwrap();
    }

    let logs = repo.find_by_shelf(1, 10).unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].action_id, second.action_id);

    let limited = repo.find_by_shelf(1, 1).unwrap();
    assert_eq!(limited.len(), 1);

    assert_eq!(repo.find_by_placement(1).unwrap().len(), 2);
    assert_eq!(repo.count_by_type(2, "DeleteShelf").unwrap(), 1);
}
