//! LocalCluster Tests
//!
//! Tests verify:
//! - Each mutation enqueues its backup sweep as one batch
//! - Clear and no-op mutations produce no notifications
//! - Partition routing is stable and in range
//! - Reachability toggling
//! - Query evaluation over stored values

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use gridmap::config::ClientConfig;
use gridmap::error::GridError;
use gridmap::event::Category;
use gridmap::key::Key;
use gridmap::query::PredicateCompiler;
use gridmap::transport::{LocalCluster, NotificationSink, OpKind, RawNotification, Transport};
use gridmap::value::{encode_value, Value};
use parking_lot::{Condvar, Mutex};

const WAIT: Duration = Duration::from_secs(5);

// =============================================================================
// Helper Functions
// =============================================================================

/// Records every delivered batch
#[derive(Default)]
struct RecordingSink {
    batches: Mutex<Vec<Vec<RawNotification>>>,
    arrived: Condvar,
}

impl RecordingSink {
    fn wait_for(&self, count: usize) -> Vec<Vec<RawNotification>> {
        let deadline = Instant::now() + WAIT;
        let mut batches = self.batches.lock();
        while batches.len() < count {
            if self.arrived.wait_until(&mut batches, deadline).timed_out() {
                break;
            }
        }
        batches.clone()
    }
}

impl NotificationSink for RecordingSink {
    fn deliver(&self, batch: &[RawNotification]) {
        self.batches.lock().push(batch.to_vec());
        self.arrived.notify_all();
    }
}

fn setup_cluster(partitions: usize) -> (Arc<LocalCluster>, Arc<RecordingSink>) {
    let config = ClientConfig::builder()
        .client_name("cluster-tests")
        .partition_count(partitions)
        .build();
    let cluster = LocalCluster::new(&config).unwrap();
    let sink = Arc::new(RecordingSink::default());
    cluster.subscribe(sink.clone());
    (cluster, sink)
}

fn bytes(text: &str) -> Bytes {
    encode_value(&Value::from(text)).unwrap()
}

fn key(text: &str) -> Key {
    Key::from_canonical(text)
}

fn shape(batch: &[RawNotification]) -> Vec<(Category, Option<Bytes>)> {
    batch
        .iter()
        .map(|n| (n.category, n.value.clone()))
        .collect()
}

// =============================================================================
// Mutation Tests
// =============================================================================

#[test]
fn test_insert_enqueues_full_sweep() {
    let (cluster, sink) = setup_cluster(1);

    let ack = cluster
        .raw_mutate("m", &key("a1"), Some(bytes("b2")), OpKind::Put)
        .unwrap();
    assert!(ack.applied);
    assert_eq!(ack.previous, None);

    let batches = sink.wait_for(1);
    assert_eq!(
        shape(&batches[0]),
        vec![
            (Category::Added, Some(bytes("b2"))),
            (Category::Removed, Some(bytes("b2"))),
            (Category::Updated, Some(bytes("b2"))),
            (Category::Evicted, None),
        ]
    );
    assert!(batches[0].iter().all(|n| &*n.map_name == "m" && n.key == key("a1")));
}

#[test]
fn test_overwrite_enqueues_update_and_evict() {
    let (cluster, sink) = setup_cluster(1);

    cluster
        .raw_mutate("m", &key("a1"), Some(bytes("b1")), OpKind::Put)
        .unwrap();
    let ack = cluster
        .raw_mutate("m", &key("a1"), Some(bytes("b2")), OpKind::Put)
        .unwrap();
    assert_eq!(ack.previous, Some(bytes("b1")));

    let batches = sink.wait_for(2);
    assert_eq!(
        shape(&batches[1]),
        vec![
            (Category::Updated, Some(bytes("b2"))),
            (Category::Evicted, None),
        ]
    );
}

#[test]
fn test_remove_enqueues_sweep_with_previous_value() {
    let (cluster, sink) = setup_cluster(1);

    cluster
        .raw_mutate("m", &key("a1"), Some(bytes("b1")), OpKind::Put)
        .unwrap();
    let ack = cluster
        .raw_mutate("m", &key("a1"), None, OpKind::Remove)
        .unwrap();
    assert_eq!(ack.previous, Some(bytes("b1")));

    let batches = sink.wait_for(2);
    assert_eq!(
        shape(&batches[1]),
        vec![
            (Category::Removed, Some(bytes("b1"))),
            (Category::Updated, None),
            (Category::Evicted, None),
        ]
    );
}

#[test]
fn test_evict_enqueues_single_notification() {
    let (cluster, sink) = setup_cluster(1);

    cluster
        .raw_mutate("m", &key("a1"), Some(bytes("b1")), OpKind::Put)
        .unwrap();
    let ack = cluster
        .raw_mutate("m", &key("a1"), None, OpKind::Evict)
        .unwrap();
    assert!(ack.applied);

    let batches = sink.wait_for(2);
    assert_eq!(shape(&batches[1]), vec![(Category::Evicted, None)]);
    assert_eq!(cluster.raw_get("m", &key("a1")).unwrap(), None);
}

#[test]
fn test_absent_key_mutations_are_silent() {
    let (cluster, sink) = setup_cluster(1);

    let removed = cluster
        .raw_mutate("m", &key("ghost"), None, OpKind::Remove)
        .unwrap();
    let evicted = cluster
        .raw_mutate("m", &key("ghost"), None, OpKind::Evict)
        .unwrap();
    assert!(!removed.applied);
    assert!(!evicted.applied);

    // A later put on the same partition is the first batch seen
    cluster
        .raw_mutate("m", &key("real"), Some(bytes("v")), OpKind::Put)
        .unwrap();
    let batches = sink.wait_for(1);
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0][0].key, key("real"));
}

#[test]
fn test_clear_is_silent() {
    let (cluster, sink) = setup_cluster(1);

    cluster
        .raw_mutate("m", &key("a1"), Some(bytes("v")), OpKind::Put)
        .unwrap();
    cluster.raw_clear("m").unwrap();
    cluster
        .raw_mutate("m", &key("a2"), Some(bytes("v")), OpKind::Put)
        .unwrap();

    let batches = sink.wait_for(2);
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[1][0].key, key("a2"));
    assert_eq!(cluster.raw_size("m").unwrap(), 1);
}

#[test]
fn test_put_without_value_is_rejected() {
    let (cluster, _sink) = setup_cluster(1);
    assert!(matches!(
        cluster.raw_mutate("m", &key("a1"), None, OpKind::Put),
        Err(GridError::Serialization(_))
    ));
}

// =============================================================================
// Partitioning Tests
// =============================================================================

#[test]
fn test_partition_routing_is_stable() {
    let (cluster, _sink) = setup_cluster(8);
    assert_eq!(cluster.partition_count(), 8);

    for i in 0..100 {
        let k = key(&i.to_string());
        let first = cluster.partition_for("m", &k);
        assert!(first < 8);
        assert_eq!(cluster.partition_for("m", &k), first);
    }
}

#[test]
fn test_same_key_batches_arrive_in_order() {
    let (cluster, sink) = setup_cluster(8);

    for i in 0..50 {
        let value = bytes(&format!("v{}", i));
        cluster
            .raw_mutate("m", &key("hot"), Some(value), OpKind::Put)
            .unwrap();
    }

    let batches = sink.wait_for(50);
    assert_eq!(batches.len(), 50);
    for (i, batch) in batches.iter().enumerate() {
        let expected = bytes(&format!("v{}", i));
        assert_eq!(batch.iter().find_map(|n| n.value.clone()), Some(expected));
    }
}

#[test]
fn test_zero_partitions_rejected() {
    let config = ClientConfig::builder().partition_count(0).build();
    assert!(matches!(
        LocalCluster::new(&config),
        Err(GridError::Config(_))
    ));
}

// =============================================================================
// Reachability Tests
// =============================================================================

#[test]
fn test_unreachable_cluster_fails_every_operation() {
    let (cluster, _sink) = setup_cluster(1);
    let predicate = PredicateCompiler::new().compile("a = 1").unwrap();

    cluster.set_reachable(false);
    assert!(!cluster.is_reachable());

    let unavailable = |result: gridmap::Result<()>| {
        matches!(result, Err(GridError::TransportUnavailable(_)))
    };
    assert!(unavailable(
        cluster
            .raw_mutate("m", &key("k"), Some(bytes("v")), OpKind::Put)
            .map(|_| ())
    ));
    assert!(unavailable(cluster.raw_get("m", &key("k")).map(|_| ())));
    assert!(unavailable(cluster.raw_clear("m")));
    assert!(unavailable(cluster.raw_size("m").map(|_| ())));
    assert!(unavailable(cluster.raw_query("m", &predicate).map(|_| ())));

    cluster.set_reachable(true);
    assert_eq!(cluster.raw_size("m").unwrap(), 0);
}

// =============================================================================
// Query Tests
// =============================================================================

#[test]
fn test_query_decodes_and_filters() {
    let (cluster, _sink) = setup_cluster(2);
    let compiler = PredicateCompiler::new();

    for (k, age) in [("ann", 45), ("bob", 30), ("cid", 45)] {
        let value = Value::record([("age", Value::from(age))]);
        cluster
            .raw_mutate("people", &key(k), Some(encode_value(&value).unwrap()), OpKind::Put)
            .unwrap();
    }

    let predicate = compiler.compile("age = 45").unwrap();
    let keys: Vec<Key> = cluster
        .raw_query("people", &predicate)
        .unwrap()
        .into_iter()
        .map(|(k, _)| k)
        .collect();
    assert_eq!(keys, vec![key("ann"), key("cid")]);

    assert!(cluster.raw_query("empty", &predicate).unwrap().is_empty());
    assert_eq!(cluster.map_names(), vec!["people".to_string()]);
}
