use rucksbase::{Code, Json, MemCluster, MemConnector, StoreClient};
use serde::{Deserialize, Serialize};

fn setup(max_versions: u32) -> (MemCluster, StoreClient<MemConnector>) {
    let cluster = MemCluster::new();
    let client = StoreClient::embedded(&cluster);
    client.create_table("orders").unwrap();
    client
        .add_column("orders", "o", Some(max_versions), None, None)
        .unwrap();
    client
        .add_column("orders", "meta", Some(max_versions), None, None)
        .unwrap();
    (cluster, client)
}

#[test]
fn test_put_then_get() {
    let (cluster, client) = setup(3);
    client
        .put("orders", "r1", "o", "status", None, "shipped", true)
        .unwrap();

    let result = client
        .get("orders", "r1", Some("o"), Some("status"), None, None)
        .unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.value(b"o", b"status").unwrap().as_ref(), b"shipped");
    assert_eq!(
        result.cells()[0].value_as::<String>().unwrap(),
        "shipped".to_string()
    );
    assert_eq!(cluster.open_handles(), 0);
}

#[test]
fn test_unjournaled_round_trip() {
    let (_cluster, client) = setup(3);
    client.put("orders", "r1", "o", "q", None, "v", false).unwrap();

    let result = client
        .get("orders", "r1", Some("o"), Some("q"), None, None)
        .unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.cells()[0].value.as_ref(), b"v");
}

#[test]
fn test_assigned_versions_accumulate() {
    let (_cluster, client) = setup(10);
    for v in ["v1", "v2", "v3"] {
        client.put("orders", "r1", "o", "q", None, v, true).unwrap();
    }

    let all = client
        .get("orders", "r1", Some("o"), Some("q"), Some(10), None)
        .unwrap();
    let values: Vec<&[u8]> = all.cells().iter().map(|c| c.value.as_ref()).collect();
    assert_eq!(values, vec![b"v3".as_slice(), b"v2".as_slice(), b"v1".as_slice()]);

    let latest = client
        .get("orders", "r1", Some("o"), Some("q"), Some(1), None)
        .unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest.cells()[0].value.as_ref(), b"v3");
}

#[test]
fn test_missing_row_is_empty() {
    let (_cluster, client) = setup(3);
    let result = client.get("orders", "nope", None, None, None, None).unwrap();
    assert!(result.is_empty());
    assert_eq!(result.row().as_ref(), b"nope");
    assert!(!client.exists("orders", "nope", None, None).unwrap());
}

#[test]
fn test_versions_newest_first() {
    let (_cluster, client) = setup(10);
    for (ts, v) in [(100, "v1"), (200, "v2"), (300, "v3")] {
        client
            .put("orders", "r1", "o", "q", Some(ts), v, true)
            .unwrap();
    }

    let all = client
        .get("orders", "r1", Some("o"), Some("q"), Some(10), None)
        .unwrap();
    let stamps: Vec<i64> = all.cells().iter().map(|c| c.timestamp).collect();
    assert_eq!(stamps, vec![300, 200, 100]);
    assert_eq!(all.cells()[0].value.as_ref(), b"v3");

    let latest = client
        .get("orders", "r1", Some("o"), Some("q"), Some(1), None)
        .unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest.cells()[0].value.as_ref(), b"v3");

    let at = client
        .get("orders", "r1", Some("o"), Some("q"), None, Some(200))
        .unwrap();
    assert_eq!(at.len(), 1);
    assert_eq!(at.cells()[0].value.as_ref(), b"v2");
}

#[test]
fn test_family_limit_trims_versions() {
    let (_cluster, client) = setup(2);
    for ts in 1..=4 {
        client
            .put("orders", "r1", "o", "q", Some(ts), &ts, true)
            .unwrap();
    }
    let all = client
        .get("orders", "r1", Some("o"), Some("q"), Some(10), None)
        .unwrap();
    let stamps: Vec<i64> = all.cells().iter().map(|c| c.timestamp).collect();
    assert_eq!(stamps, vec![4, 3]);
}

#[test]
fn test_store_assigned_timestamps_increase() {
    let (_cluster, client) = setup(5);
    client.put("orders", "r1", "o", "q", None, "a", true).unwrap();
    client.put("orders", "r1", "o", "q", None, "b", true).unwrap();

    let all = client
        .get("orders", "r1", Some("o"), Some("q"), Some(5), None)
        .unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.cells()[0].timestamp > all.cells()[1].timestamp);
    assert_eq!(all.cells()[0].value.as_ref(), b"b");
}

#[test]
fn test_get_scopes() {
    let (_cluster, client) = setup(3);
    client.put("orders", "r1", "o", "a", Some(1), "1", true).unwrap();
    client.put("orders", "r1", "o", "b", Some(1), "2", true).unwrap();
    client
        .put("orders", "r1", "meta", "c", Some(1), "3", true)
        .unwrap();

    assert_eq!(client.get("orders", "r1", None, None, None, None).unwrap().len(), 3);
    assert_eq!(client.get("orders", "r1", Some("o"), None, None, None).unwrap().len(), 2);
    assert_eq!(
        client
            .get("orders", "r1", Some("o"), Some("b"), None, None)
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn test_get_unknown_family_fails() {
    let (cluster, client) = setup(3);
    let err = client
        .get("orders", "r1", Some("ghost"), None, None, None)
        .unwrap_err();
    assert_eq!(err.status().unwrap().code(), Code::NoSuchColumnFamily);
    assert_eq!(cluster.open_handles(), 0);
}

#[test]
fn test_delete_shapes() {
    let (_cluster, client) = setup(5);
    let fill = |row: &str| {
        for ts in [10, 20] {
            client.put("orders", row, "o", "a", Some(ts), "x", true).unwrap();
            client.put("orders", row, "o", "b", Some(ts), "y", true).unwrap();
            client.put("orders", row, "meta", "c", Some(ts), "z", true).unwrap();
        }
    };
    let count = |row: &str| {
        client
            .get("orders", row, None, None, Some(5), None)
            .unwrap()
            .len()
    };

    fill("whole");
    client.delete("orders", "whole", None, None, None, false).unwrap();
    assert_eq!(count("whole"), 0);

    fill("family");
    client
        .delete("orders", "family", Some("o"), None, None, false)
        .unwrap();
    assert_eq!(count("family"), 2);

    fill("latest");
    client
        .delete("orders", "latest", Some("o"), Some("a"), None, false)
        .unwrap();
    let left = client
        .get("orders", "latest", Some("o"), Some("a"), Some(5), None)
        .unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left.cells()[0].timestamp, 10);

    fill("version");
    client
        .delete("orders", "version", Some("o"), Some("a"), Some(10), false)
        .unwrap();
    let left = client
        .get("orders", "version", Some("o"), Some("a"), Some(5), None)
        .unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left.cells()[0].timestamp, 20);

    fill("columns");
    client
        .delete("orders", "columns", Some("o"), Some("a"), None, true)
        .unwrap();
    assert!(!client
        .get("orders", "columns", Some("o"), Some("a"), Some(5), None)
        .unwrap()
        .contains_column(b"o", b"a"));
    assert_eq!(count("columns"), 4);
}

#[test]
fn test_delete_all_versions_up_to_cutoff() {
    let (_cluster, client) = setup(5);
    for ts in [10, 20, 30] {
        client.put("orders", "r", "o", "a", Some(ts), "x", true).unwrap();
    }
    client
        .delete("orders", "r", Some("o"), Some("a"), Some(20), true)
        .unwrap();
    let left = client
        .get("orders", "r", Some("o"), Some("a"), Some(5), None)
        .unwrap();
    let stamps: Vec<i64> = left.cells().iter().map(|c| c.timestamp).collect();
    assert_eq!(stamps, vec![30]);
}

#[test]
fn test_exists() {
    let (_cluster, client) = setup(3);
    client.put("orders", "r1", "o", "q", Some(5), "v", true).unwrap();
    assert!(client.exists("orders", "r1", None, None).unwrap());
    assert!(client.exists("orders", "r1", None, Some(5)).unwrap());
    assert!(!client.exists("orders", "r1", None, Some(6)).unwrap());
}

#[test]
fn test_typed_values() {
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Order {
        id: u32,
        total: f64,
    }

    let (_cluster, client) = setup(3);
    let order = Order { id: 7, total: 12.5 };
    client
        .put("orders", "r1", "o", "doc", None, &Json(&order), true)
        .unwrap();
    client.put("orders", "r1", "o", "n", None, &42i64, true).unwrap();

    let result = client.get("orders", "r1", Some("o"), None, None, None).unwrap();
    let doc = result.value(b"o", b"doc").unwrap();
    let decoded: Order = serde_json::from_slice(doc).unwrap();
    assert_eq!(decoded, order);
    assert_eq!(
        result.column_latest(b"o", b"n").unwrap().value_as::<i64>().unwrap(),
        42
    );
}

#[test]
fn test_unjournaled_write_is_visible() {
    let (cluster, client) = setup(3);
    client.put("orders", "r1", "o", "q", None, "v", false).unwrap();
    assert!(client.exists("orders", "r1", None, None).unwrap());
    assert_eq!(cluster.statistics().snapshot().unjournaled_writes, 1);
}

#[test]
fn test_disabled_table_rejects_rows() {
    let (cluster, client) = setup(3);
    client.disable_table("orders").unwrap();
    let err = client
        .put("orders", "r1", "o", "q", None, "v", true)
        .unwrap_err();
    assert_eq!(err.status().unwrap().code(), Code::TableNotEnabled);
    assert_eq!(cluster.open_handles(), 0);
}

#[test]
fn test_missing_table() {
    let (_cluster, client) = setup(3);
    let err = client.get("nope", "r1", None, None, None, None).unwrap_err();
    assert_eq!(err.status().unwrap().code(), Code::TableNotFound);
}

#[test]
fn test_blank_arguments() {
    let (cluster, client) = setup(3);
    assert!(client.get("", "r1", None, None, None, None).unwrap_err().is_invalid_argument());
    assert!(client
        .increment("orders", "", "o", "n", 1, true)
        .unwrap_err()
        .is_invalid_argument());
    assert!(client
        .increment("orders", "r1", "o", " ", 1, true)
        .unwrap_err()
        .is_invalid_argument());
    assert_eq!(cluster.open_handles(), 0);
}
