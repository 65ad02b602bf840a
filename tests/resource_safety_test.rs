use std::panic::{AssertUnwindSafe, catch_unwind};

use rucksbase::{
    Code, Error, MemCluster, MemConnector, ScanSpec, Status, StoreClient,
    store::{Admin, Table},
};

fn setup() -> (MemCluster, StoreClient<MemConnector>) {
    let cluster = MemCluster::new();
    let client = StoreClient::embedded(&cluster);
    client.create_table("t").unwrap();
    client.add_column("t", "f", None, None, None).unwrap();
    for i in 0..20 {
        client
            .put("t", &format!("r{i:02}"), "f", "q", None, "v", true)
            .unwrap();
    }
    (cluster, client)
}

fn balanced(cluster: &MemCluster) {
    let stats = cluster.statistics().snapshot();
    assert_eq!(stats.admins_opened, stats.admins_closed);
    assert_eq!(stats.tables_opened, stats.tables_closed);
    assert_eq!(stats.scanners_opened, stats.scanners_closed);
    assert_eq!(cluster.open_handles(), 0);
}

#[test]
fn test_handles_released_after_success() {
    let (cluster, client) = setup();
    client.get("t", "r01", None, None, None, None).unwrap();
    client.exists_table("t").unwrap();
    let _ = client.scan("t", &ScanSpec::new().fetch_size(3)).unwrap().count();
    balanced(&cluster);
}

#[test]
fn test_handles_released_after_operation_error() {
    let (cluster, client) = setup();
    assert!(client.get("t", "r01", Some("ghost"), None, None, None).is_err());
    assert!(client.create_table("t").is_err());
    assert!(client.modify_column("t", "ghost", &Default::default()).is_err());
    balanced(&cluster);
}

#[test]
fn test_custom_closure_error() {
    #[derive(Debug)]
    struct Rejected;

    impl From<Rejected> for Error {
        fn from(_: Rejected) -> Self {
            Error::InvalidArgument("rejected by caller".into())
        }
    }

    let (cluster, client) = setup();
    let err = client
        .with_table("t", |_table| Err::<(), _>(Rejected))
        .unwrap_err();
    assert!(err.is_invalid_argument());
    balanced(&cluster);
}

#[test]
fn test_handles_released_after_panic() {
    let (cluster, client) = setup();

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        client
            .with_table("t", |table| -> Result<(), Status> {
                let _ = table.name();
                panic!("callback blew up");
            })
            .unwrap();
    }));
    assert!(outcome.is_err());

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        client
            .with_admin(|admin| -> Result<(), Status> {
                admin.is_master_running()?;
                panic!("callback blew up");
            })
            .unwrap();
    }));
    assert!(outcome.is_err());
    balanced(&cluster);
}

#[test]
fn test_injected_table_failures() {
    let (cluster, client) = setup();
    cluster.fail_table_ops(true);

    let err = client.get("t", "r01", None, None, None, None).unwrap_err();
    assert_eq!(err.status().unwrap().code(), Code::IOError);
    let err = client.put("t", "r01", "f", "q", None, "v", true).unwrap_err();
    assert_eq!(err.status().unwrap().code(), Code::IOError);
    let mut scan = client.scan("t", &ScanSpec::new()).unwrap();
    assert!(scan.next().unwrap().is_err());
    assert!(scan.next().is_none());
    drop(scan);

    cluster.fail_table_ops(false);
    balanced(&cluster);
}

#[test]
fn test_release_failure_surfaces_after_success() {
    let (cluster, client) = setup();
    cluster.fail_close(true);

    let err = client.get("t", "r01", None, None, None, None).unwrap_err();
    assert_eq!(err.status().unwrap().code(), Code::IOError);

    cluster.fail_close(false);
    balanced(&cluster);
}

#[test]
fn test_operation_failure_wins_over_release_failure() {
    let (cluster, client) = setup();
    cluster.fail_close(true);

    let err = client
        .get("t", "r01", Some("ghost"), None, None, None)
        .unwrap_err();
    assert_eq!(err.status().unwrap().code(), Code::NoSuchColumnFamily);

    cluster.fail_close(false);
    balanced(&cluster);
}

#[test]
fn test_scan_release_failure() {
    let (cluster, client) = setup();

    let mut scan = client.scan("t", &ScanSpec::new().fetch_size(5)).unwrap();
    scan.next().unwrap().unwrap();
    cluster.fail_close(true);
    let err = scan.close().unwrap_err();
    assert_eq!(err.status().unwrap().code(), Code::IOError);
    assert!(scan.next().is_none());

    let mut scan = client.scan("t", &ScanSpec::new().fetch_size(5)).unwrap();
    scan.next().unwrap().unwrap();
    drop(scan);

    cluster.fail_close(false);
    balanced(&cluster);
}

#[test]
fn test_connect_failures_leave_nothing_open() {
    let (cluster, client) = setup();
    cluster.stop_master();
    assert!(client.exists_table("t").is_err());
    assert!(!client.alive());
    cluster.start_master();

    assert!(client.get("missing", "r", None, None, None, None).is_err());
    assert!(client.scan("missing", &ScanSpec::new()).is_err());
    balanced(&cluster);
}

#[test]
fn test_blank_arguments_open_nothing() {
    let (cluster, client) = setup();
    let before = cluster.statistics().snapshot();

    assert!(client.get(" ", "r", None, None, None, None).unwrap_err().is_invalid_argument());
    assert!(client.delete_table("").unwrap_err().is_invalid_argument());
    assert!(client.exists_column("t", "").unwrap_err().is_invalid_argument());

    let after = cluster.statistics().snapshot();
    assert_eq!(before.admins_opened, after.admins_opened);
    assert_eq!(before.tables_opened, after.tables_opened);
}
