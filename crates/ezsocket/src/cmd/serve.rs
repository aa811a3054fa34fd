use std::thread;

use ezsocket_frame::ValueKind;
use ezsocket_peer::{
    Connection, Listener, LoopReport, LoopSession, Role, StopHandle, TerminationPolicy,
};
use tracing::{debug, error, info};

use crate::cmd::{peer_label, ServeArgs};
use crate::exit::{peer_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_report, OutputFormat};

pub fn run(args: ServeArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.conn.to_config(Role::Server)?;
    let listener = Listener::bind(&config).map_err(|err| peer_error("bind failed", err))?;
    install_exit_handler()?;

    let kind = ValueKind::from(args.kind);
    let policy = args.policy.to_policy(args.count);
    info!(addr = %listener.local_addr(), %kind, ?policy, "serving");

    let mut sessions = Vec::new();
    loop {
        if args.max_peers.is_some_and(|max| listener.accepted() >= max) {
            break;
        }

        let conn = listener
            .accept()
            .map_err(|err| peer_error("accept failed", err))?;
        let peer = peer_label(&conn);
        let ips = args.ips;

        let handle = thread::Builder::new()
            .name(format!("peer-{}", listener.accepted()))
            .spawn(move || serve_peer(conn, kind, policy, ips, &peer, format))
            .map_err(|err| CliError::new(INTERNAL, format!("failed to spawn session: {err}")))?;

        // Without a peer limit the server runs until interrupted; sessions are detached.
        if args.max_peers.is_some() {
            sessions.push(handle);
        }
    }

    let mut code = SUCCESS;
    for handle in sessions {
        let session_code = handle.join().unwrap_or(INTERNAL);
        if code == SUCCESS {
            code = session_code;
        }
    }
    Ok(code)
}

/// Echo values of `kind` back to one peer until the policy or the peer ends the session.
fn serve_peer(
    mut conn: Connection,
    kind: ValueKind,
    policy: TerminationPolicy,
    ips: bool,
    peer: &str,
    format: OutputFormat,
) -> i32 {
    let mut session = LoopSession::new(policy).with_ips_report(ips);
    let mut echo = |conn: &mut Connection, _: &StopHandle| -> ezsocket_peer::Result<()> {
        let value = conn.read_value(kind)?;
        debug!(%kind, "echoing value");
        conn.send_value(&value)
    };

    let result = session.run_server(&mut conn, &mut echo);
    let _ = conn.disconnect();

    match result {
        Ok(report) => {
            print_report(&report, Role::Server, peer, format);
            SUCCESS
        }
        Err(err) if err.is_disconnect() => {
            info!(peer, iterations = session.iterations(), "peer disconnected");
            let report = LoopReport {
                iterations: session.iterations(),
                elapsed: session.elapsed(),
            };
            print_report(&report, Role::Server, peer, format);
            SUCCESS
        }
        Err(err) => {
            let err = peer_error("session failed", err);
            error!(peer, error = %err, "session failed");
            err.code
        }
    }
}

fn install_exit_handler() -> CliResult<()> {
    ctrlc::set_handler(|| {
        info!("interrupt received, shutting down");
        std::process::exit(SUCCESS);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
