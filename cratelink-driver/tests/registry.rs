use std::{collections::HashMap, sync::Arc, thread, time::Duration};

use cratelink_client_base::interface::Endpoint;
use cratelink_client_memory::{MemoryClientConnector, MemoryCluster};
use cratelink_driver::{ClientHandleRegistry, ConnectionString};
use pretty_assertions::assert_eq;

fn start_registry(version: &str) -> (Arc<MemoryCluster>, ClientHandleRegistry) {
    let cluster = Arc::new(MemoryCluster::new(version));
    let registry = ClientHandleRegistry::new(MemoryClientConnector::new(Arc::clone(&cluster)));

    (cluster, registry)
}

fn localhost_conn_str() -> ConnectionString {
    ConnectionString::new(vec![Endpoint::new("localhost", 5432)], None, HashMap::new())
}

#[test]
fn test_concurrent_acquires_construct_a_single_client() {
    cratelink_logging::init_for_tests();
    let (cluster, registry) = start_registry("5.2.3");
    cluster
        .set_connect_delay(Some(Duration::from_millis(50)))
        .unwrap();

    let threads: Vec<_> = (0..2)
        .map(|_| {
            let registry = registry.clone();
            let conn_str = localhost_conn_str();
            thread::spawn(move || registry.acquire(&conn_str).unwrap())
        })
        .collect();

    let handles: Vec<_> = threads.into_iter().map(|t| t.join().unwrap()).collect();

    assert_eq!(cluster.connect_count(), 1);
    assert_eq!(registry.handle_count("localhost:5432").unwrap(), 2);

    drop(handles);

    assert_eq!(cluster.close_count(), 1);
    assert_eq!(registry.urls().unwrap(), Vec::<String>::new());
}

#[test]
fn test_interleaved_acquire_and_release_across_threads() {
    cratelink_logging::init_for_tests();
    let (cluster, registry) = start_registry("5.2.3");

    let threads: Vec<_> = (0..4)
        .map(|_| {
            let registry = registry.clone();
            let conn_str = localhost_conn_str();
            thread::spawn(move || {
                for _ in 0..25 {
                    let handle = registry.acquire(&conn_str).unwrap();
                    assert_eq!(handle.url(), "localhost:5432");
                }
            })
        })
        .collect();

    for thread in threads {
        thread.join().unwrap();
    }

    assert_eq!(registry.urls().unwrap(), Vec::<String>::new());
    assert_eq!(cluster.connect_count(), cluster.close_count());
    assert!(cluster.connect_count() >= 1);
}

#[test]
fn test_handles_outlive_the_registry() {
    cratelink_logging::init_for_tests();
    let (cluster, registry) = start_registry("5.2.3");

    let handle = registry.acquire(&localhost_conn_str()).unwrap();
    drop(registry);

    assert_eq!(
        handle.client().server_version().unwrap().to_string(),
        "5.2.3"
    );

    drop(handle);
    assert_eq!(cluster.close_count(), 1);
}
