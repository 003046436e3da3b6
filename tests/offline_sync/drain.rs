use offline_sync::{
    MatchKey, NewOperation, OperationKind, QueueError, RemoteCall, RetryClass, SyncConfig,
    QueueDrainer,
};
use serde_json::json;

use crate::support::Fixture;

#[test]
fn single_insert_is_replayed_and_removed() {
    let fx = Fixture::new();
    fx.writer
        .enqueue("jobs", OperationKind::Insert, json!({"name": "Test Job"}))
        .unwrap();

    let result = fx.drainer.drain().unwrap();

    assert_eq!(result.completed, 1);
    assert_eq!(fx.pending(), 0);
    assert_eq!(
        fx.remote.calls(),
        vec![RemoteCall::Insert {
            table: "jobs".into(),
            row: json!({"name": "Test Job"}),
        }]
    );
    assert_eq!(fx.remote.rows("jobs"), vec![json!({"name": "Test Job"})]);
}

#[test]
fn queue_is_empty_after_fully_successful_drain() {
    let fx = Fixture::new();
    for i in 0..5 {
        fx.writer
            .enqueue("customers", OperationKind::Insert, json!({"id": format!("c-{i}")}))
            .unwrap();
        fx.clock.advance(1);
    }
    fx.writer
        .enqueue("customers", OperationKind::Update, json!({"id": "c-1", "city": "Tulsa"}))
        .unwrap();
    fx.writer
        .enqueue("customers", OperationKind::Delete, json!({"id": "c-2"}))
        .unwrap();

    let result = fx.drainer.drain().unwrap();

    assert_eq!(result.pending, 7);
    assert_eq!(result.completed, 7);
    assert_eq!(result.retained(), 0);
    assert_eq!(fx.pending(), 0);
    assert_eq!(fx.remote.rows("customers").len(), 4);
}

#[test]
fn keyless_update_stays_queued_without_remote_call() {
    let fx = Fixture::new();
    let id = fx
        .writer
        .enqueue("customers", OperationKind::Update, json!({}))
        .unwrap();

    let result = fx.drainer.drain().unwrap();

    assert_eq!(result.invalid, 1);
    assert_eq!(result.completed, 0);
    assert_eq!(fx.remote.call_count(), 0);
    let remaining = fx.store.list().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, id);
    assert!(matches!(&result.errors[0], QueueError::EntryInvalid { id: bad, .. } if *bad == id));
}

#[test]
fn keyless_delete_is_skipped_while_others_apply() {
    let fx = Fixture::new();
    fx.writer
        .enqueue("projects", OperationKind::Delete, json!({"notes": "no key"}))
        .unwrap();
    fx.clock.advance(1);
    fx.writer
        .enqueue("projects", OperationKind::Insert, json!({"id": "p-1"}))
        .unwrap();

    let result = fx.drainer.drain().unwrap();

    assert_eq!(result.invalid, 1);
    assert_eq!(result.completed, 1);
    assert_eq!(fx.remote.call_count(), 1);
    assert_eq!(fx.pending(), 1);
}

#[test]
fn replays_in_enqueue_time_order_not_storage_order() {
    let fx = Fixture::new();
    // Stored order is t3, t1, t2.
    for (t, name) in [(30, "third"), (10, "first"), (20, "second")] {
        fx.clock.set(t);
        fx.store
            .append(NewOperation::insert("jobs", json!({"name": name})))
            .unwrap();
    }

    fx.drainer.drain().unwrap();

    let names: Vec<_> = fx
        .remote
        .calls()
        .iter()
        .map(|call| call.row().unwrap()["name"].clone())
        .collect();
    assert_eq!(names, vec![json!("first"), json!("second"), json!("third")]);
}

#[test]
fn ties_keep_stored_order() {
    let fx = Fixture::new();
    fx.clock.set(5);
    for n in 0..4 {
        fx.store
            .append(NewOperation::insert("jobs", json!({"n": n})))
            .unwrap();
    }

    fx.drainer.drain().unwrap();

    let ns: Vec<_> = fx
        .remote
        .calls()
        .iter()
        .map(|call| call.row().unwrap()["n"].clone())
        .collect();
    assert_eq!(ns, vec![json!(0), json!(1), json!(2), json!(3)]);
}

#[test]
fn failed_middle_operation_remains_queued() {
    let fx = Fixture::new();
    fx.clock.set(3);
    let third = fx
        .store
        .append(NewOperation::insert("jobs", json!({"name": "Driveway"})))
        .unwrap();
    fx.clock.set(1);
    let first = fx
        .store
        .append(NewOperation::insert("customers", json!({"id": "c-1"})))
        .unwrap();
    fx.clock.set(2);
    let second = fx
        .store
        .append(NewOperation::update("customers", json!({"id": "c-1", "phone": "555"})))
        .unwrap();

    fx.remote.fail_when(
        |call| call.kind() == OperationKind::Update,
        RetryClass::Transient,
    );

    let result = fx.drainer.drain().unwrap();

    assert_eq!(result.completed, 2);
    assert_eq!(result.failed, 1);
    assert!(result.errors[0].is_transient());
    let remaining: Vec<_> = fx.store.list().unwrap().into_iter().map(|op| op.id).collect();
    assert_eq!(remaining, vec![second.clone()]);
    assert_ne!(remaining[0], first);
    assert_ne!(remaining[0], third);

    // The pass was not rolled back.
    assert_eq!(fx.remote.rows("customers"), vec![json!({"id": "c-1"})]);
    assert_eq!(fx.remote.rows("jobs").len(), 1);

    fx.remote.clear_failures();
    let retry = fx.drainer.drain().unwrap();
    assert_eq!(retry.completed, 1);
    assert_eq!(fx.pending(), 0);
    assert_eq!(
        fx.remote.rows("customers"),
        vec![json!({"id": "c-1", "phone": "555"})]
    );
}

#[test]
fn second_drain_is_a_noop() {
    let fx = Fixture::new();
    fx.writer
        .enqueue("jobs", OperationKind::Insert, json!({"name": "Patch"}))
        .unwrap();
    fx.writer
        .enqueue("jobs", OperationKind::Delete, json!({"id": "j-0"}))
        .unwrap();

    fx.drainer.drain().unwrap();
    let calls_after_first = fx.remote.call_count();

    let second = fx.drainer.drain().unwrap();

    assert_eq!(second.pending, 0);
    assert_eq!(second.completed, 0);
    assert_eq!(fx.remote.call_count(), calls_after_first);
}

#[test]
fn permanently_rejected_entry_is_retried_every_pass() {
    let fx = Fixture::new();
    fx.remote.fail_table("estimates", RetryClass::Permanent);
    let id = fx
        .writer
        .enqueue("estimates", OperationKind::Insert, json!({"bid_value": 4200}))
        .unwrap();

    for pass in 1..=3 {
        let result = fx.drainer.drain().unwrap();
        assert_eq!(result.permanently_failed_ids(), vec![&id]);
        assert_eq!(fx.remote.call_count(), pass);
    }
    assert_eq!(fx.pending(), 1);
}

#[test]
fn per_collection_key_field() {
    let fx = Fixture::new();
    let drainer = QueueDrainer::new(fx.store.clone(), fx.remote.clone()).with_config(
        SyncConfig::from_json_str(r#"{"key_fields":{"customers":"customer_id"}}"#).unwrap(),
    );
    fx.writer
        .enqueue("customers", OperationKind::Delete, json!({"id": "ignored", "customer_id": "c-7"}))
        .unwrap();
    fx.writer
        .enqueue("projects", OperationKind::Delete, json!({"id": "p-7"}))
        .unwrap();

    drainer.drain().unwrap();

    assert_eq!(
        fx.remote.calls(),
        vec![
            RemoteCall::Delete {
                table: "customers".into(),
                key: MatchKey::new("customer_id", json!("c-7")),
            },
            RemoteCall::Delete {
                table: "projects".into(),
                key: MatchKey::new("id", json!("p-7")),
            },
        ]
    );
}
