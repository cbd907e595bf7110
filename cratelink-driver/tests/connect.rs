use std::sync::Arc;

use cratelink_client_base::interface::QueryResult;
use cratelink_driver::{DriverError, DriverRegistry, Feature, UrlDriver};
use pretty_assertions::assert_eq;
use serde_json::json;

mod common;

#[test]
fn test_open_connection_and_execute_statement() {
    cratelink_logging::init_for_tests();
    let cluster = common::start_cluster("5.2.3");
    cluster
        .add_response(
            "select name from sys.cluster",
            QueryResult::new(vec!["name".into()], vec![vec![json!("crate")]]),
        )
        .unwrap();
    let driver = common::driver_for(&cluster);

    let mut connection = driver
        .connect("crate://node-1.cluster:5432,node-2.cluster:5432", &common::no_options())
        .unwrap()
        .unwrap();

    let result = connection
        .execute("select name from sys.cluster", &[])
        .unwrap();

    assert_eq!(result.cols, vec!["name".to_string()]);
    assert_eq!(result.rows, vec![vec![json!("crate")]]);
    assert_eq!(result.row_count, 1);
    assert_eq!(
        cluster.executed().unwrap(),
        vec![("select name from sys.cluster".to_string(), vec![])]
    );

    connection.close();
    assert!(connection.is_closed());
    assert_eq!(cluster.close_count(), 1);
    assert_eq!(driver.client_urls().unwrap(), Vec::<String>::new());
}

#[test]
fn test_jdbc_prefixed_url_connects_and_applies_schema() {
    cratelink_logging::init_for_tests();
    let cluster = common::start_cluster("5.2.3");
    let driver = common::driver_for(&cluster);

    assert!(driver.accepts_url("jdbc:crate://localhost:5432/doc"));

    let connection = driver
        .connect("jdbc:crate://localhost:5432/doc", &common::no_options())
        .unwrap()
        .unwrap();

    assert_eq!(connection.url().unwrap(), "localhost:5432/doc");
    assert_eq!(connection.schema().unwrap(), Some("doc"));
}

#[test]
fn test_urls_with_other_schemes_are_declined() {
    cratelink_logging::init_for_tests();
    let cluster = common::start_cluster("5.2.3");
    let driver = common::driver_for(&cluster);

    assert!(!driver.accepts_url("postgresql://localhost:5432"));
    assert!(driver
        .connect("postgresql://localhost:5432", &common::no_options())
        .unwrap()
        .is_none());
    assert_eq!(cluster.connect_count(), 0);
}

#[test]
fn test_connections_with_equal_endpoints_share_a_single_client() {
    cratelink_logging::init_for_tests();
    let cluster = common::start_cluster("5.2.3");
    let driver = common::driver_for(&cluster);

    let mut first = driver
        .connect("crate://localhost:5432", &common::no_options())
        .unwrap()
        .unwrap();
    let mut second = driver
        .connect("crate://localhost:5432?strict=true", &common::no_options())
        .unwrap()
        .unwrap();

    assert_eq!(cluster.connect_count(), 1);
    assert_eq!(driver.client_urls().unwrap(), vec!["localhost:5432".to_string()]);

    let mut third = driver
        .connect("crate://localhost:5432/doc", &common::no_options())
        .unwrap()
        .unwrap();

    assert_eq!(cluster.connect_count(), 2);

    first.close();
    assert_eq!(cluster.close_count(), 0);

    second.close();
    assert_eq!(cluster.close_count(), 1);

    third.close();
    assert_eq!(cluster.close_count(), 2);
    assert_eq!(driver.client_urls().unwrap(), Vec::<String>::new());
}

#[test]
fn test_connect_fails_when_cluster_is_unreachable() {
    cratelink_logging::init_for_tests();
    let cluster = common::start_cluster("5.2.3");
    cluster.set_fail_connects(true);
    let driver = common::driver_for(&cluster);

    let err = driver
        .connect("crate://localhost:5432", &common::no_options())
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<DriverError>(),
        Some(DriverError::UnreachableCluster { .. })
    ));
    assert_eq!(cluster.connect_count(), 0);
    assert_eq!(driver.client_urls().unwrap(), Vec::<String>::new());
}

#[test]
fn test_malformed_url_fails_without_connecting() {
    cratelink_logging::init_for_tests();
    let cluster = common::start_cluster("5.2.3");
    let driver = common::driver_for(&cluster);

    let err = driver
        .connect("crate://localhost:5432?strict", &common::no_options())
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<DriverError>(),
        Some(DriverError::MalformedUrl(_))
    ));
    assert_eq!(cluster.connect_count(), 0);
}

#[test]
fn test_strict_connections_reject_transaction_control() {
    cratelink_logging::init_for_tests();
    let cluster = common::start_cluster("5.2.3");
    let driver = common::driver_for(&cluster);

    let mut connection = driver
        .connect("crate://localhost:5432?strict=true", &common::no_options())
        .unwrap()
        .unwrap();

    assert!(connection.auto_commit().unwrap());
    connection.set_auto_commit(true).unwrap();

    for err in [
        connection.set_auto_commit(false).unwrap_err(),
        connection.commit().unwrap_err(),
    ] {
        assert!(matches!(
            err.downcast_ref::<DriverError>(),
            Some(DriverError::Unsupported(Feature::ManualCommit))
        ));
    }

    let err = connection.rollback().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DriverError>(),
        Some(DriverError::Unsupported(Feature::Rollback))
    ));

    let err = connection.set_savepoint("sp1").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DriverError>(),
        Some(DriverError::Unsupported(Feature::Savepoints))
    ));
}

#[test]
fn test_lenient_connections_ignore_transaction_control() {
    cratelink_logging::init_for_tests();
    let cluster = common::start_cluster("5.2.3");
    let driver = common::driver_for(&cluster);

    let mut connection = driver
        .connect("crate://localhost:5432", &common::no_options())
        .unwrap()
        .unwrap();

    connection.set_auto_commit(false).unwrap();
    assert!(connection.auto_commit().unwrap());
    connection.commit().unwrap();
    connection.rollback().unwrap();
    connection.set_savepoint("sp1").unwrap();
    connection.release_savepoint("sp1").unwrap();
    connection.rollback_to_savepoint("sp1").unwrap();
}

#[test]
fn test_schema_segment_is_ignored_on_old_clusters() {
    cratelink_logging::init_for_tests();
    let cluster = common::start_cluster("0.47.9");
    let driver = common::driver_for(&cluster);

    let connection = driver
        .connect("crate://localhost:5432/doc", &common::no_options())
        .unwrap()
        .unwrap();

    assert!(!connection.supports(Feature::SchemaSelection));
    assert_eq!(connection.schema().unwrap(), None);
}

#[test]
fn test_driver_registry_routes_to_the_accepting_driver() {
    cratelink_logging::init_for_tests();
    let cluster = common::start_cluster("5.2.3");
    cluster
        .add_response("select 1", QueryResult::new(vec!["1".into()], vec![vec![json!(1)]]))
        .unwrap();

    let mut registry = DriverRegistry::new();
    registry.register(Arc::new(common::driver_for(&cluster)));

    let connection = registry
        .connect("crate://localhost:5432", &common::no_options())
        .unwrap();
    assert_eq!(connection.execute("select 1", &[]).unwrap().row_count, 1);

    let err = registry
        .connect("mysql://localhost:3306", &common::no_options())
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DriverError>(),
        Some(DriverError::NoDriver(_))
    ));
}
