use offline_sync::{
    FileStorage, InMemoryRemote, KeyValueStorage, MutationQueueStore, OperationKind, QueueDrainer,
    QueueWriter, DEFAULT_QUEUE_KEY,
};
use serde_json::json;

#[test]
fn queue_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = MutationQueueStore::new(FileStorage::open(dir.path()).unwrap());
        let writer = QueueWriter::new(store);
        writer
            .enqueue("jobs", OperationKind::Insert, json!({"name": "Test Job"}))
            .unwrap();
        writer
            .enqueue("customers", OperationKind::Delete, json!({"id": "c-3"}))
            .unwrap();
    }

    let store = MutationQueueStore::new(FileStorage::open(dir.path()).unwrap());
    assert_eq!(store.len().unwrap(), 2);

    let remote = InMemoryRemote::new();
    let drainer = QueueDrainer::new(store.clone(), remote.clone());
    assert_eq!(drainer.drain().unwrap().completed, 2);

    let reopened = MutationQueueStore::new(FileStorage::open(dir.path()).unwrap());
    assert!(reopened.is_empty().unwrap());
}

#[test]
fn picks_up_queue_left_by_mobile_client() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::open(dir.path()).unwrap();
    storage
        .set(
            DEFAULT_QUEUE_KEY,
            r#"[
                {"id":"b","table":"customers","operation":"update","data":{"id":"c-1","city":"Enid"},"timestamp":200},
                {"id":"a","table":"customers","operation":"insert","data":{"id":"c-1"},"timestamp":100}
            ]"#,
        )
        .unwrap();

    let remote = InMemoryRemote::new();
    let drainer = QueueDrainer::new(MutationQueueStore::new(storage), remote.clone());
    let result = drainer.drain().unwrap();

    assert_eq!(result.completed, 2);
    assert_eq!(remote.rows("customers"), vec![json!({"id": "c-1", "city": "Enid"})]);
}
