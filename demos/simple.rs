use rucksbase::{
    CellCheck, ColumnFamilyPatch, ColumnPut, CompressionType, MemCluster, ScanSpec, StoreClient,
};

fn main() {
    println!("RucksBase Simple Example");

    let cluster = MemCluster::new();
    let client = StoreClient::embedded(&cluster);
    println!("Store alive: {}", client.alive());

    client.create_table("people").expect("Failed to create table");
    client
        .add_column("people", "info", Some(3), None, None)
        .expect("Failed to add column family");
    client
        .modify_column(
            "people",
            "info",
            &ColumnFamilyPatch::new().compression(CompressionType::Snappy),
        )
        .expect("Failed to modify column family");

    client
        .put("people", "alice", "info", "name", None, "Alice", true)
        .expect("Failed to put");
    client
        .put("people", "alice", "info", "age", None, "30", true)
        .expect("Failed to put");
    client
        .put("people", "bob", "info", "name", None, "Bob", true)
        .expect("Failed to put");

    let alice = client
        .get("people", "alice", Some("info"), None, None, None)
        .expect("Failed to get");
    for cell in alice.cells() {
        println!(
            "alice {}: {}",
            String::from_utf8_lossy(&cell.qualifier),
            String::from_utf8_lossy(&cell.value)
        );
    }

    let check = CellCheck::equals("info", "age", "30").expect("Failed to encode check");
    let birthday = ColumnPut::new("info", "age", "31").expect("Failed to encode put");
    let applied = client
        .check_and_put("people", "alice", &check, &birthday)
        .expect("Failed to check and put");
    println!("Birthday applied: {applied}");

    let visits = client
        .increment("people", "bob", "info", "visits", 1, true)
        .expect("Failed to increment");
    println!("Bob visits: {visits}");

    for row in client
        .scan("people", &ScanSpec::new().family("info").fetch_size(1))
        .expect("Failed to scan")
    {
        let row = row.expect("Failed to read row");
        println!("row {}: {} cells", String::from_utf8_lossy(row.row()), row.len());
    }

    client
        .delete("people", "bob", None, None, None, false)
        .expect("Failed to delete");
    let bob_exists = client
        .exists("people", "bob", None, None)
        .expect("Failed to check row");
    println!("Bob exists after delete: {bob_exists}");

    client.delete_table("people").expect("Failed to delete table");
    println!("Open handles: {}", cluster.open_handles());
    println!("{}", cluster.statistics().snapshot());
}
