use taskflow_core::db::open_db_in_memory;
use taskflow_core::{
    KeyValueStore, KvTaskRepository, SqliteKeyValueStore, StoreError, Task, TaskRepository,
    TaskService, TASKS_KEY,
};

#[test]
fn load_returns_empty_list_when_nothing_is_stored() {
    let conn = open_db_in_memory().unwrap();
    let repo = KvTaskRepository::new(SqliteKeyValueStore::new(&conn));

    assert!(repo.load_tasks().unwrap().is_empty());
}

#[test]
fn save_and_load_preserve_order_and_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = KvTaskRepository::new(SqliteKeyValueStore::new(&conn));

    let mut first = Task::new("first").unwrap();
    first.priority = Some(3.0);
    first.reason = Some("later".to_string());
    let mut second = Task::new("second").unwrap();
    second.is_completed = true;
    let tasks = vec![first, second];

    repo.save_tasks(&tasks).unwrap();
    assert_eq!(repo.load_tasks().unwrap(), tasks);
}

#[test]
fn stored_value_is_a_json_array_under_tasks_key() {
    let conn = open_db_in_memory().unwrap();
    let repo = KvTaskRepository::new(SqliteKeyValueStore::new(&conn));
    let task = Task::new("inspect raw").unwrap();
    repo.save_tasks(std::slice::from_ref(&task)).unwrap();

    let raw = repo.store().get(TASKS_KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value[0]["id"], task.id.to_string());
    assert_eq!(value[0]["isCompleted"], false);
}

#[test]
fn corrupt_value_is_reported_by_repository() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKeyValueStore::new(&conn);
    store.set(TASKS_KEY, "{not json").unwrap();
    let repo = KvTaskRepository::new(store);

    let err = repo.load_tasks().unwrap_err();
    assert!(matches!(err, StoreError::InvalidData { ref key, .. } if key == TASKS_KEY));
}

#[test]
fn service_starts_empty_on_corrupt_value_and_overwrites_on_next_change() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKeyValueStore::new(&conn);
    store
        .set(TASKS_KEY, r#"[{"id":"not-a-uuid","description":"x"}]"#)
        .unwrap();

    let mut service = TaskService::open(KvTaskRepository::new(store)).unwrap();
    assert!(service.tasks().is_empty());

    service.add_task("fresh start", None).unwrap();
    let reopened = KvTaskRepository::new(SqliteKeyValueStore::new(&conn));
    let tasks = reopened.load_tasks().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].description, "fresh start");
}
