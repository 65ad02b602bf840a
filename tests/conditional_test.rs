use std::{sync::Arc, thread};

use rucksbase::{CellCheck, Code, ColumnDelete, ColumnPut, MemCluster, MemConnector, StoreClient};

fn setup() -> (MemCluster, StoreClient<MemConnector>) {
    let cluster = MemCluster::new();
    let client = StoreClient::embedded(&cluster);
    client.create_table("accounts").unwrap();
    client.add_column("accounts", "a", Some(3), None, None).unwrap();
    (cluster, client)
}

fn latest(client: &StoreClient<MemConnector>, row: &str, q: &str) -> Option<String> {
    client
        .get("accounts", row, Some("a"), Some(q), None, None)
        .unwrap()
        .column_latest(b"a", q.as_bytes())
        .map(|c| c.value_as::<String>().unwrap())
}

#[test]
fn test_check_and_put() {
    let (_cluster, client) = setup();
    client
        .put("accounts", "r1", "a", "state", None, "open", true)
        .unwrap();

    let put = ColumnPut::new("a", "state", "closed").unwrap();
    let wrong = CellCheck::equals("a", "state", "pending").unwrap();
    assert!(!client.check_and_put("accounts", "r1", &wrong, &put).unwrap());
    assert_eq!(latest(&client, "r1", "state").as_deref(), Some("open"));

    let right = CellCheck::equals("a", "state", "open").unwrap();
    assert!(client.check_and_put("accounts", "r1", &right, &put).unwrap());
    assert_eq!(latest(&client, "r1", "state").as_deref(), Some("closed"));
}

#[test]
fn test_check_and_put_absent() {
    let (_cluster, client) = setup();
    let claim = ColumnPut::new("a", "owner", "alice").unwrap();
    let absent = CellCheck::absent("a", "owner");

    assert!(client.check_and_put("accounts", "r1", &absent, &claim).unwrap());

    let second = ColumnPut::new("a", "owner", "bob").unwrap();
    assert!(!client.check_and_put("accounts", "r1", &absent, &second).unwrap());
    assert_eq!(latest(&client, "r1", "owner").as_deref(), Some("alice"));
}

#[test]
fn test_check_other_column() {
    let (_cluster, client) = setup();
    client.put("accounts", "r1", "a", "lock", None, "me", true).unwrap();

    let check = CellCheck::equals("a", "lock", "me").unwrap();
    let put = ColumnPut::new("a", "balance", &10i64).unwrap().timestamp(5);
    assert!(client.check_and_put("accounts", "r1", &check, &put).unwrap());

    let result = client
        .get("accounts", "r1", Some("a"), Some("balance"), None, None)
        .unwrap();
    assert_eq!(result.cells()[0].timestamp, 5);
    assert_eq!(result.cells()[0].value_as::<i64>().unwrap(), 10);
}

#[test]
fn test_check_and_delete() {
    let (_cluster, client) = setup();
    client.put("accounts", "r1", "a", "state", None, "open", true).unwrap();
    client.put("accounts", "r1", "a", "note", None, "x", true).unwrap();

    let wrong = CellCheck::equals("a", "state", "closed").unwrap();
    assert!(!client
        .check_and_delete("accounts", "r1", &wrong, &ColumnDelete::row())
        .unwrap());
    assert!(client.exists("accounts", "r1", None, None).unwrap());

    let right = CellCheck::equals("a", "state", "open").unwrap();
    assert!(client
        .check_and_delete("accounts", "r1", &right, &ColumnDelete::column("a", "note"))
        .unwrap());
    assert_eq!(latest(&client, "r1", "note"), None);
    assert_eq!(latest(&client, "r1", "state").as_deref(), Some("open"));

    assert!(client
        .check_and_delete("accounts", "r1", &right, &ColumnDelete::row())
        .unwrap());
    assert!(!client.exists("accounts", "r1", None, None).unwrap());
}

#[test]
fn test_check_unknown_family() {
    let (cluster, client) = setup();
    let check = CellCheck::absent("ghost", "q");
    let put = ColumnPut::new("a", "q", "v").unwrap();
    let err = client.check_and_put("accounts", "r1", &check, &put).unwrap_err();
    assert_eq!(err.status().unwrap().code(), Code::NoSuchColumnFamily);
    assert_eq!(cluster.open_handles(), 0);
}

#[test]
fn test_increment() {
    let (_cluster, client) = setup();
    assert_eq!(client.increment("accounts", "r1", "a", "hits", 5, true).unwrap(), 5);
    assert_eq!(client.increment("accounts", "r1", "a", "hits", -2, true).unwrap(), 3);
    assert_eq!(client.increment("accounts", "r1", "a", "hits", 1, false).unwrap(), 4);

    let stored = client
        .get("accounts", "r1", Some("a"), Some("hits"), None, None)
        .unwrap();
    assert_eq!(stored.cells()[0].value_as::<i64>().unwrap(), 4);
}

#[test]
fn test_increment_non_counter_fails() {
    let (_cluster, client) = setup();
    client.put("accounts", "r1", "a", "name", None, "alice", true).unwrap();
    let err = client
        .increment("accounts", "r1", "a", "name", 1, true)
        .unwrap_err();
    assert_eq!(err.status().unwrap().code(), Code::InvalidArgument);
}

#[test]
fn test_increment_overflow_fails() {
    let (_cluster, client) = setup();
    client
        .put("accounts", "r1", "a", "n", None, &i64::MAX, true)
        .unwrap();
    let err = client.increment("accounts", "r1", "a", "n", 1, true).unwrap_err();
    assert_eq!(err.status().unwrap().code(), Code::InvalidArgument);
    assert_eq!(latest_counter(&client), i64::MAX);
}

fn latest_counter(client: &StoreClient<MemConnector>) -> i64 {
    client
        .get("accounts", "r1", Some("a"), Some("n"), None, None)
        .unwrap()
        .cells()[0]
        .value_as::<i64>()
        .unwrap()
}

#[test]
fn test_concurrent_increments() {
    let (_cluster, client) = setup();
    let client = Arc::new(client);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let client = Arc::clone(&client);
            thread::spawn(move || {
                for _ in 0..100 {
                    client.increment("accounts", "r1", "a", "n", 1, true).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(latest_counter(&client), 800);
}

#[test]
fn test_concurrent_claims_have_one_winner() {
    let (_cluster, client) = setup();
    let client = Arc::new(client);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let client = Arc::clone(&client);
            thread::spawn(move || {
                let claim = ColumnPut::new("a", "owner", format!("worker-{i}")).unwrap();
                client
                    .check_and_put("accounts", "r1", &CellCheck::absent("a", "owner"), &claim)
                    .unwrap()
            })
        })
        .collect();
    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|won| *won)
        .count();
    assert_eq!(winners, 1);
}
