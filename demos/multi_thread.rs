use {
    std::{
        error::Error,
        sync::{mpsc, Arc},
        thread,
    },
    uid64::Snowflake,
};

fn main() -> Result<(), Box<dyn Error>> {
    let node_id = 1;
    let snowflake = Arc::new(Snowflake::with_node_id(node_id)?);
    let (tx, rx) = mpsc::channel();

    for _ in 0 .. 10 {
        let snowflake = Arc::clone(&snowflake);
        let tx = tx.clone();

        thread::spawn(move || match snowflake.next_id() {
            Ok(sfid) => {
                let _ = tx.send(sfid);
            }
            Err(e) => {
                println!("Generate error: {}", e);
            }
        });
    }
    drop(tx);

    for sfid in rx {
        println!("Snowflake ID: {}", sfid);
    }

    Ok(())
}
