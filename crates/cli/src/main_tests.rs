// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parses_tunnel_list_with_kind_filter() {
    let cli = Cli::try_parse_from(["tunnel", "list", "--kind", "mtproto"]).unwrap();
    match cli.command {
        Commands::Tunnel(TunnelCommand::List { kind: Some(_) }) => {}
        _ => panic!("expected Tunnel(List) with a kind filter"),
    }
}

#[test]
fn parses_daemon_status_with_no_subcommand_defaulting() {
    let cli = Cli::try_parse_from(["tunnel", "daemon"]).unwrap();
    match cli.command {
        Commands::Daemon(args) => assert!(args.command.is_none()),
        _ => panic!("expected Daemon command"),
    }
}

#[test]
fn rejects_create_without_required_fields() {
    let result = Cli::try_parse_from(["tunnel", "create", "--name", "x"]);
    assert!(result.is_err());
}

#[test]
fn output_format_defaults_to_text() {
    let cli = Cli::try_parse_from(["tunnel", "list"]).unwrap();
    assert!(matches!(cli.output, OutputFormat::Text));
}
