use ezsocket_frame::ValueKind;
use ezsocket_peer::{Connection, Listener, LoopSession, Role, StopHandle, TerminationPolicy};

use crate::cmd::{install_ctrlc_handler, peer_label, session_outcome, ListenArgs};
use crate::exit::{peer_error, CliResult, SUCCESS};
use crate::output::{print_value, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.conn.to_config(Role::Server)?;
    let listener = Listener::bind(&config).map_err(|err| peer_error("bind failed", err))?;

    let stop = StopHandle::default();
    install_ctrlc_handler(stop.clone())?;

    let kind = ValueKind::from(args.kind);
    let mut printed = 0u64;

    while !stop.is_stopped() {
        let mut conn = listener
            .accept()
            .map_err(|err| peer_error("accept failed", err))?;
        let peer = peer_label(&conn);

        let mut session =
            LoopSession::new(TerminationPolicy::Indefinite).with_stop_handle(stop.clone());
        let mut print = |conn: &mut Connection, stop: &StopHandle| -> ezsocket_peer::Result<()> {
            let value = conn.read_value(kind)?;
            printed = printed.saturating_add(1);
            print_value(&value, &peer, printed, format);
            if args.count.is_some_and(|count| printed >= count) {
                stop.stop();
            }
            Ok(())
        };

        let result = session.run_server(&mut conn, &mut print);
        let _ = conn.disconnect();
        session_outcome(result, "receive failed")?;
    }

    Ok(SUCCESS)
}
