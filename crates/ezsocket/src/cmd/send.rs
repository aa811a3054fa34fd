use ezsocket_frame::value::{parse_bool, parse_float_list, parse_int_list};
use ezsocket_frame::{Value, ValueKind};
use ezsocket_peer::{connect_with_config, Connection, LoopSession, Role, StopHandle};

use crate::cmd::{install_ctrlc_handler, peer_label, PolicyArg, SendArgs};
use crate::exit::{peer_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_report, print_value, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let kind = ValueKind::from(args.kind);
    let value = resolve_value(&args, kind)?;

    let config = args.conn.to_config(Role::Client)?;
    let mut conn =
        connect_with_config(&config).map_err(|err| peer_error("connect failed", err))?;
    let peer = peer_label(&conn);

    let mut session = LoopSession::new(args.policy.to_policy(args.count)).with_ips_report(args.ips);
    install_ctrlc_handler(session.stop_handle())?;

    // Negotiated loops end when this side says so.
    let limit = (args.policy == PolicyArg::Negotiated).then_some(args.count);
    let mut exchanged = 0u64;
    let mut exchange = |conn: &mut Connection, stop: &StopHandle| -> ezsocket_peer::Result<()> {
        conn.send_value(&value)?;
        let echo = conn.read_value(kind)?;
        exchanged += 1;
        print_value(&echo, &peer, exchanged, format);
        if limit.is_some_and(|n| exchanged >= n) {
            stop.stop();
        }
        Ok(())
    };

    let report = session
        .run_client(&mut conn, &mut exchange)
        .map_err(|err| peer_error("exchange failed", err))?;
    print_report(&report, Role::Client, &peer, format);

    conn.disconnect()
        .map_err(|err| peer_error("disconnect failed", err))?;
    Ok(SUCCESS)
}

fn resolve_value(args: &SendArgs, kind: ValueKind) -> CliResult<Value> {
    if kind == ValueKind::Image {
        let path = args
            .file
            .as_ref()
            .ok_or_else(|| CliError::usage("--kind image requires --file"))?;
        let img = ezsocket_frame::image::open(path).map_err(|err| {
            CliError::new(
                DATA_INVALID,
                format!("failed reading image {}: {err}", path.display()),
            )
        })?;
        return Ok(Value::Image(img));
    }

    let text = args
        .value
        .as_deref()
        .ok_or_else(|| CliError::usage(format!("a value is required for --kind {kind}")))?;
    parse_value(kind, text)
}

fn parse_value(kind: ValueKind, text: &str) -> CliResult<Value> {
    let invalid = |reason: String| CliError::usage(format!("invalid {kind} value '{text}': {reason}"));

    match kind {
        ValueKind::Bool => parse_bool(text.trim().as_bytes())
            .map(Value::Bool)
            .ok_or_else(|| invalid("expected true, false, 1 or 0".to_string())),
        ValueKind::Int => text
            .trim()
            .parse::<i32>()
            .map(Value::Int)
            .map_err(|err| invalid(err.to_string())),
        ValueKind::Float => text
            .trim()
            .parse::<f32>()
            .map(Value::Float)
            .map_err(|err| invalid(err.to_string())),
        ValueKind::Str => Ok(Value::Str(text.to_string())),
        ValueKind::IntList => parse_int_list(text)
            .map(Value::IntList)
            .map_err(|err| invalid(err.to_string())),
        ValueKind::FloatList => parse_float_list(text)
            .map(Value::FloatList)
            .map_err(|err| invalid(err.to_string())),
        ValueKind::Image => Err(CliError::usage("images are read from --file")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit::USAGE;

    #[test]
    fn parses_values_by_kind() {
        assert_eq!(parse_value(ValueKind::Int, "512").unwrap(), Value::Int(512));
        assert_eq!(parse_value(ValueKind::Float, "3.14").unwrap(), Value::Float(3.14));
        assert_eq!(parse_value(ValueKind::Bool, "1").unwrap(), Value::Bool(true));
        assert_eq!(
            parse_value(ValueKind::Str, " spaced ").unwrap(),
            Value::Str(" spaced ".to_string())
        );
        assert_eq!(
            parse_value(ValueKind::IntList, "[1, 2, 3]").unwrap(),
            Value::IntList(vec![1, 2, 3])
        );
        assert_eq!(
            parse_value(ValueKind::FloatList, "[3.14,3.14]").unwrap(),
            Value::FloatList(vec![3.14, 3.14])
        );
    }

    #[test]
    fn rejects_malformed_values_as_usage() {
        for (kind, text) in [
            (ValueKind::Int, "12x"),
            (ValueKind::Int, "99999999999"),
            (ValueKind::Bool, "maybe"),
            (ValueKind::IntList, "[1,2,]"),
            (ValueKind::Image, "photo.jpg"),
        ] {
            let err = parse_value(kind, text).unwrap_err();
            assert_eq!(err.code, USAGE, "{kind} '{text}'");
        }
    }
}
