use offline_sync::{
    ManualConnectivity, MutationOutcome, OfflineFirstClient, OperationKind, QueueError,
    RetryClass, SyncConfig,
};
use serde_json::json;

use crate::support::Fixture;

#[test]
fn online_writes_go_straight_to_remote() {
    let fx = Fixture::new();
    let client =
        OfflineFirstClient::new(fx.writer.clone(), fx.remote.clone(), ManualConnectivity::online());

    let outcome = client
        .insert("customers", json!({"id": "c-1", "last_name": "Hopper"}))
        .unwrap();

    assert_eq!(outcome, MutationOutcome::Applied);
    assert_eq!(fx.remote.rows("customers").len(), 1);
    assert_eq!(fx.pending(), 0);
}

#[test]
fn offline_writes_are_queued_then_replayed() {
    let fx = Fixture::new();
    let connectivity = ManualConnectivity::offline();
    let client = OfflineFirstClient::new(fx.writer.clone(), fx.remote.clone(), connectivity.clone());

    let outcome = client
        .update("customers", json!({"id": "c-1", "phone": "555-0199"}))
        .unwrap();

    let MutationOutcome::Queued(id) = outcome else {
        panic!("expected the update to be queued");
    };
    let queued = fx.store.list().unwrap();
    assert_eq!(queued[0].id, id);
    assert_eq!(queued[0].kind, OperationKind::Update);
    assert_eq!(fx.remote.call_count(), 0);

    connectivity.set_connected(true);
    fx.drainer.drain().unwrap();
    assert_eq!(fx.pending(), 0);
    assert_eq!(fx.remote.call_count(), 1);
}

#[test]
fn online_remote_failure_is_returned_not_queued() {
    let fx = Fixture::new();
    fx.remote.fail_table("proposals", RetryClass::Transient);
    let client =
        OfflineFirstClient::new(fx.writer.clone(), fx.remote.clone(), ManualConnectivity::online());

    let err = client
        .insert("proposals", json!({"bid_value": 900}))
        .unwrap_err();

    assert!(matches!(err, QueueError::Remote(_)));
    assert!(err.is_transient());
    assert_eq!(fx.pending(), 0);
}

#[test]
fn online_delete_without_key_is_rejected_locally() {
    let fx = Fixture::new();
    let client = OfflineFirstClient::new(fx.writer.clone(), fx.remote.clone(), ManualConnectivity::online())
        .with_config(SyncConfig::default().with_collection_key("projects", "project_id"));

    let err = client.delete("projects", json!({"id": "p-1"})).unwrap_err();

    assert!(matches!(
        err,
        QueueError::MissingKey { ref field, .. } if field == "project_id"
    ));
    assert_eq!(fx.remote.call_count(), 0);
}
