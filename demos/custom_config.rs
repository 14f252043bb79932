use {
    std::error::Error,
    uid64::{Snowflake, SystemClock},
};

fn main() -> Result<(), Box<dyn Error>> {
    let epoch = 1_609_459_200_000; // 2021-01-01 00:00:00.000 UTC

    // No explicit node id: it is derived from the host's hardware addresses
    // on the first call.
    let snowflake = Snowflake::builder().with_clock(SystemClock::with_epoch(epoch)?).build()?;
    let sfid = snowflake.next_id()?;
    println!("Snowflake ID: {}", sfid);
    println!("Node ID: {:?}", snowflake.node_id());
    Ok(())
}
