//! Publish one message to a local broker.
//!
//! Start a STOMP broker on localhost:61613 (ActiveMQ's default STOMP
//! port), then:
//!
//! ```sh
//! cargo run -p stompwire-client --example publish
//! ```

use stompwire_client::{Result, StompConnection};

fn main() -> Result<()> {
    let mut conn = StompConnection::new();
    conn.open("127.0.0.1", 61613)?;
    conn.connect("", "")?;
    conn.send("/queue/examples", "hello from stompwire")?;
    conn.disconnect()?;
    conn.close()?;
    println!("published one message to /queue/examples");
    Ok(())
}
