//! Minimal echo server: accepts one peer and echoes ints back under a
//! negotiated loop until the client sends "Stop".
//!
//! Run with:
//!   cargo run --example echo-server
//!
//! In another terminal:
//!   cargo run --features cli -- send --port 5000 --kind int 512 --count 3

use ezsocket::peer::{
    ConnectionConfig, Connection, Listener, LoopSession, StopHandle, TerminationPolicy,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let listener = Listener::bind(&ConnectionConfig::server("127.0.0.1", 5000))?;
    eprintln!("Listening on {}", listener.local_addr());

    let mut conn = listener.accept()?;
    eprintln!("Peer connected: {:?}", conn.peer_addr());

    let mut echo = |conn: &mut Connection, _stop: &StopHandle| -> ezsocket::peer::Result<()> {
        let value = conn.read_int()?;
        eprintln!("Received {value}");
        conn.send_int(value)
    };

    let report = LoopSession::new(TerminationPolicy::Negotiated)
        .with_ips_report(true)
        .run_server(&mut conn, &mut echo)?;
    eprintln!("Served {} iterations ({:.1} IPS)", report.iterations, report.ips());

    conn.disconnect()?;
    Ok(())
}
