use uid64::{decompose, Snowflake};

fn main() {
    let node_id = 1;
    let snowflake = Snowflake::with_node_id(node_id).unwrap();

    let id1 = snowflake.next_id().unwrap();
    let id2 = snowflake.next_id().unwrap();
    let id3 = snowflake.next_id().unwrap();

    println!("id1: {}", id1);
    println!("id2: {}", id2);
    println!("id3: {}", id3);
    println!("id3 parts: {:?}", decompose(id3));

    assert!(id1 < id2);
    assert!(id2 < id3);
}

// Output:
// id1: 1561529313386303488
// id2: 1561529313386303489
// id3: 1561529313386303490
// id3 parts: IdParts { timestamp: 372297600123, node_id: 1, sequence: 2 }
