use rucksbase::{
    BloomFilterType, Code, ColumnFamilyPatch, CompressionType, Error, MemCluster, StoreClient,
};

fn setup() -> (MemCluster, StoreClient<rucksbase::MemConnector>) {
    let cluster = MemCluster::new();
    let client = StoreClient::embedded(&cluster);
    (cluster, client)
}

fn code(err: &Error) -> Option<Code> {
    err.status().map(|s| s.code())
}

#[test]
fn test_table_existence_lifecycle() {
    let (cluster, client) = setup();

    assert!(!client.exists_table("orders").unwrap());
    client.create_table("orders").unwrap();
    assert!(client.exists_table("orders").unwrap());
    client.delete_table("orders").unwrap();
    assert!(!client.exists_table("orders").unwrap());

    assert_eq!(cluster.open_handles(), 0);
}

#[test]
fn test_create_twice_fails_with_exists() {
    let (cluster, client) = setup();
    client.create_table("orders").unwrap();
    client.add_column("orders", "o", None, None, None).unwrap();

    let err = client.create_table("orders").unwrap_err();
    assert!(matches!(err, Error::Service { .. }));
    assert!(err.status().unwrap().is_table_exists());

    // The first table is untouched.
    assert!(client.exists_column("orders", "o").unwrap());
    assert_eq!(cluster.open_handles(), 0);
}

#[test]
fn test_delete_missing_table_fails() {
    let (_cluster, client) = setup();
    let err = client.delete_table("nope").unwrap_err();
    assert_eq!(code(&err), Some(Code::TableNotFound));
}

#[test]
fn test_disable_enable_round_trip() {
    let (_cluster, client) = setup();
    client.create_table("orders").unwrap();

    assert!(!client.is_disabled_table("orders").unwrap());
    client.disable_table("orders").unwrap();
    assert!(client.is_disabled_table("orders").unwrap());
    client.enable_table("orders").unwrap();
    assert!(!client.is_disabled_table("orders").unwrap());
}

#[test]
fn test_missing_table_is_not_disabled() {
    let (_cluster, client) = setup();
    assert!(!client.is_disabled_table("another-table-name").unwrap());
}

#[test]
fn test_enable_disable_missing_table_fails() {
    let (_cluster, client) = setup();
    assert_eq!(
        code(&client.enable_table("nope").unwrap_err()),
        Some(Code::TableNotFound)
    );
    assert_eq!(
        code(&client.disable_table("nope").unwrap_err()),
        Some(Code::TableNotFound)
    );
}

#[test]
fn test_add_column_applies_supplied_fields() {
    let (_cluster, client) = setup();
    client.create_table("orders").unwrap();
    client
        .add_column("orders", "o", Some(10), Some(true), None)
        .unwrap();

    assert!(client.exists_column("orders", "o").unwrap());
    assert!(!client.exists_column("orders", "x").unwrap());
    assert!(!client.is_disabled_table("orders").unwrap());

    let desc = client.table_descriptor("orders").unwrap();
    let family = desc.family("o").unwrap();
    assert_eq!(family.max_versions, 10);
    assert!(family.in_memory);
    assert_eq!(family.replication_scope, 0);
}

#[test]
fn test_modify_column_preserves_absent_fields() {
    let (_cluster, client) = setup();
    client.create_table("orders").unwrap();
    client
        .add_column("orders", "o", Some(7), Some(true), Some(1))
        .unwrap();

    let patch = ColumnFamilyPatch::new()
        .compression(CompressionType::Snappy)
        .bloom_filter(BloomFilterType::Row)
        .time_to_live(3600)
        .value("owner", "billing");
    client.modify_column("orders", "o", &patch).unwrap();

    let desc = client.table_descriptor("orders").unwrap();
    let family = desc.family("o").unwrap();
    assert_eq!(family.max_versions, 7);
    assert!(family.in_memory);
    assert_eq!(family.replication_scope, 1);
    assert_eq!(family.compression, CompressionType::Snappy);
    assert_eq!(family.bloom_filter, BloomFilterType::Row);
    assert_eq!(family.time_to_live, 3600);
    assert_eq!(family.value("owner"), Some("billing"));
    assert!(!client.is_disabled_table("orders").unwrap());
}

#[test]
fn test_modify_missing_family_fails() {
    let (cluster, client) = setup();
    client.create_table("orders").unwrap();

    let err = client
        .modify_column("orders", "ghost", &ColumnFamilyPatch::new().max_versions(2))
        .unwrap_err();
    assert_eq!(code(&err), Some(Code::NoSuchColumnFamily));
    assert!(!client.is_disabled_table("orders").unwrap());
    assert_eq!(cluster.open_handles(), 0);
}

#[test]
fn test_unsupported_compression_is_rejected() {
    let (_cluster, client) = setup();
    client.create_table("orders").unwrap();
    client.add_column("orders", "o", None, None, None).unwrap();

    let err = client
        .modify_column(
            "orders",
            "o",
            &ColumnFamilyPatch::new().compression(CompressionType::Lzo),
        )
        .unwrap_err();
    assert_eq!(code(&err), Some(Code::NotSupported));

    let desc = client.table_descriptor("orders").unwrap();
    assert_eq!(desc.family("o").unwrap().compression, CompressionType::None);
}

#[test]
fn test_delete_column() {
    let (_cluster, client) = setup();
    client.create_table("orders").unwrap();
    client.add_column("orders", "o", None, None, None).unwrap();
    client.add_column("orders", "audit", None, None, None).unwrap();

    client.delete_column("orders", "audit").unwrap();
    assert!(!client.exists_column("orders", "audit").unwrap());
    assert!(client.exists_column("orders", "o").unwrap());
    assert!(!client.is_disabled_table("orders").unwrap());
}

#[test]
fn test_exists_column_on_missing_table() {
    let (cluster, client) = setup();
    let err = client.exists_column("nope", "o").unwrap_err();
    assert_eq!(code(&err), Some(Code::TableNotFound));
    assert_eq!(cluster.open_handles(), 0);
}

#[test]
fn test_alive() {
    let (cluster, client) = setup();
    assert!(client.alive());

    cluster.stop_master();
    assert!(!client.alive());
    cluster.start_master();
    assert!(client.alive());

    client.add_properties([("coordinator.quorum", "nowhere")]);
    assert!(!client.alive());
    assert_eq!(cluster.open_handles(), 0);
}

#[test]
fn test_add_properties_only_affects_new_handles() {
    let (cluster, client) = setup();
    client.create_table("orders").unwrap();

    client.add_properties([("coordinator.client_port", "9999")]);
    let err = client.exists_table("orders").unwrap_err();
    assert_eq!(code(&err), Some(Code::ConnectionRefused));

    client.add_properties([("coordinator.client_port", "2181")]);
    assert!(client.exists_table("orders").unwrap());
    assert_eq!(
        client.configuration().get("coordinator.quorum").as_deref(),
        Some("localhost")
    );
    assert_eq!(cluster.open_handles(), 0);
}

#[test]
fn test_admin_ops_fail_when_master_down() {
    let (cluster, client) = setup();
    cluster.stop_master();
    let err = client.create_table("orders").unwrap_err();
    assert_eq!(code(&err), Some(Code::MasterNotRunning));
    assert!(!cluster.has_table("orders"));
}
