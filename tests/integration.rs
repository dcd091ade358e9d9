//! KVT - Integration Tests
//! End-to-end tests of the public API: independent stores written,
//! exchanged as JSON, merged and checked for convergence.

use std::sync::Arc;

use kvt::{Clock, Config, ConcurrentStore, ManualClock, Store, ValueTimestamp};

mod common {
    /// Route `log` output through the test harness.
    pub fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }
}

#[test]
fn test_two_stores_merge_scenario() {
    common::init_logging();
    let clock = ManualClock::new(1_000);

    // Create store with a few items.
    let mut store1 = Store::new();
    store1.set_with(&clock, "A", "one");
    store1.set_with(&clock, "B", "two");
    store1.set_with(&clock, "C", "three");

    // Another store with other items, some overlapping, some deleting, some new.
    clock.advance(1);
    let mut store2 = Store::new();
    store2.delete_with(&clock, "B");
    store2.set_with(&clock, "C", "four");
    store2.set_with(&clock, "D", "five");
    store2.set_with(&clock, "E", "six");
    store2.set_with(&clock, "F", "seven");

    // Later updates on the first store.
    clock.advance(1);
    store1.set_with(&clock, "E", "eight");
    store1.delete_with(&clock, "F");

    assert_eq!(store1.simple_string(), "A=one,B=two,C=three,E=eight,F/deleted");
    assert_eq!(store2.simple_string(), "B/deleted,C=four,D=five,E=six,F=seven");

    store1.absorb(&store2);
    assert_eq!(
        store1.simple_string(),
        "A=one,B/deleted,C=four,D=five,E=eight,F/deleted"
    );
}

#[test]
fn test_merge_via_json_exchange() {
    common::init_logging();
    let mut local = Store::new();
    local.set_timestamped("host", "alpha", 10);
    local.delete_timestamped("stale", 20);

    let mut remote = Store::new();
    remote.set_timestamped("host", "beta", 11);
    remote.set_timestamped("stale", "resurrect?", 15);
    remote.set_timestamped("region", "eu", 5);

    // Ship the remote store over the wire and merge it in.
    let payload = remote.to_json();
    let received = Store::from_json(&payload).unwrap();
    if received.hash() != local.hash() {
        local.absorb_owned(received);
    }

    assert_eq!(local.get("host"), "beta");
    assert_eq!(local.get("stale"), "");
    assert_eq!(local.simple_string(), "host=beta,region=eu,stale/deleted");
}

#[test]
fn test_absorb_is_idempotent() {
    let mut donor = Store::new();
    donor.set_timestamped("a", "1", 3);
    donor.delete_timestamped("b", 4);

    let mut receiver = Store::new();
    receiver.set_timestamped("a", "0", 1);
    receiver.set_timestamped("c", "2", 2);

    let mut once = receiver.clone();
    once.absorb(&donor);
    let mut twice = receiver.clone();
    twice.absorb(&donor);
    twice.absorb(&donor);

    assert_eq!(once, twice);
    assert_eq!(once.hash(), twice.hash());
}

#[test]
fn test_absorb_equals_replaying_writes_in_any_order() {
    let mut base = Store::new();
    base.set_timestamped("x", "base", 5);
    base.delete_timestamped("y", 9);
    base.set_timestamped("z", "base", 1);

    let writes: Vec<(&str, Option<&str>, i64)> = vec![
        ("x", Some("new"), 6),
        ("y", Some("late"), 8),
        ("z", None, 1),
        ("w", Some("fresh"), 2),
    ];
    let donor: Store = writes
        .iter()
        .map(|(k, v, ts)| (k.to_string(), ValueTimestamp::new(v.map(str::to_string), *ts)))
        .collect();

    let mut merged = base.clone();
    merged.absorb(&donor);

    for order in [[0, 1, 2, 3], [3, 2, 1, 0], [2, 0, 3, 1]] {
        let mut replayed = base.clone();
        for i in order {
            let (key, value, ts) = writes[i];
            match value {
                Some(value) => replayed.set_timestamped(key, value, ts),
                None => replayed.delete_timestamped(key, ts),
            };
        }
        assert_eq!(replayed, merged);
        assert_eq!(replayed.hash(), merged.hash());
    }
    assert_eq!(merged.simple_string(), "w=fresh,x=new,y/deleted,z=base");
}

#[test]
fn test_merge_converges_both_directions() {
    let mut a = Store::new();
    a.set_timestamped("k1", "a", 1);
    a.set_timestamped("k2", "a", 4);
    let mut b = Store::new();
    b.set_timestamped("k1", "b", 2);
    b.delete_timestamped("k2", 3);

    let mut ab = a.clone();
    ab.absorb(&b);
    let mut ba = b.clone();
    ba.absorb(&a);

    assert_eq!(ab, ba);
    assert_eq!(ab.simple_string(), "k1=b,k2=a");
}

#[test]
fn test_hash_detects_divergence() {
    let mut a = Store::new();
    let mut b = Store::new();
    for (i, key) in ["one", "two", "three"].iter().enumerate() {
        a.set_timestamped(*key, "v", i as i64);
    }
    for (i, key) in ["three", "one", "two"].iter().enumerate() {
        let ts = ["one", "two", "three"]
            .iter()
            .position(|k| k == key)
            .unwrap() as i64;
        b.set_timestamped(*key, format!("other{}", i), ts);
    }
    assert_eq!(a.hash(), b.hash());

    b.set_timestamped("two", "v", 100);
    assert_ne!(a.hash(), b.hash());
    assert_eq!(a.hash().len(), 16);
}

#[test]
fn test_store_json_examples() {
    let store: Store = [
        ("A".to_string(), ValueTimestamp::live("one", 1)),
        ("B".to_string(), ValueTimestamp::tombstone(2)),
    ]
    .into_iter()
    .collect();
    assert_eq!(store.to_string(), r#"{"A":["one",1],"B":[null,2]}"#);
    assert_eq!(store.entry("A").unwrap().to_string(), "one,1");
    assert_eq!(store.entry("B").unwrap().to_string(), "nil,2");
}

#[test]
fn test_bad_payload_is_rejected_whole() {
    let err = Store::from_json(r#"{"good":["v",1],"bad":[1,2]}"#).unwrap_err();
    assert_eq!(err.to_string(), "invalid value from: [1,2]");
    assert!(Store::from_json("not json").is_err());
}

#[test]
fn test_concurrent_store_sync_round() {
    common::init_logging();
    let clock = Arc::new(ManualClock::new(0));
    let config = Config::default();
    let node_a = ConcurrentStore::with_clock(config.clone(), clock.clone()).unwrap();
    let node_b = ConcurrentStore::with_clock(config, clock.clone()).unwrap();

    clock.set(10);
    node_a.set("leader", "a");
    clock.set(20);
    node_b.set("leader", "b");
    node_b.delete("temp");

    // Exchange snapshots over "the wire".
    let from_b = Store::from_json(&node_b.to_json()).unwrap();
    let from_a = Store::from_json(&node_a.to_json()).unwrap();
    node_a.absorb_owned(from_b);
    node_b.absorb_owned(from_a);

    assert_eq!(node_a.hash(), node_b.hash());
    assert_eq!(node_a.get("leader"), "b");
    assert_eq!(clock.now_nanos(), 20);
}
