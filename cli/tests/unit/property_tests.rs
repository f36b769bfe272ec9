//! Property-based tests for the pure builders.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::HashMap;

use hostbridge_cli::domain::connection::resolve;
use hostbridge_cli::domain::inventory::{render_ssh, select_ssh_hosts};
use hostbridge_cli::domain::known_hosts::{TrustLine, build};
use hostbridge_cli::domain::play::shell_quote;
use proptest::prelude::*;

/// Undoes POSIX single-quote quoting as produced by `shell_quote`.
fn unquote(s: &str) -> String {
    let mut out = String::new();
    let mut quoted = false;
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, quoted) {
            ('\'', _) => quoted = !quoted,
            ('\\', false) => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            (c, _) => out.push(c),
        }
    }
    out
}

proptest! {
    #[test]
    fn prop_shell_quote_round_trips(s in "\\PC*") {
        prop_assert_eq!(unquote(&shell_quote(&s)), s);
    }

    #[test]
    fn prop_known_hosts_lines_are_trimmed(lines in prop::collection::vec("[ \\t]*[a-z0-9.]{1,12} ssh-ed25519 [A-Za-z0-9+/]{4,20}[ \\t]*", 0..6)) {
        let trust: Vec<TrustLine> = lines.iter().cloned().map(TrustLine::raw).collect();
        let content = build(&trust);
        prop_assert!(content.ends_with('\n'));
        for line in content.lines() {
            prop_assert_eq!(line, line.trim());
        }
        prop_assert_eq!(content.lines().count(), lines.len().max(1));
    }

    #[test]
    fn prop_resource_less_inventory_lists_every_alias(aliases in prop::collection::vec("[a-z][a-z0-9-]{0,10}", 1..5)) {
        let hosts = select_ssh_hosts("", &aliases);
        prop_assert_eq!(hosts.len(), aliases.len());
        prop_assert!(hosts.iter().all(|h| h.ansible_host.is_empty()));
    }

    #[test]
    fn prop_ssh_inventory_has_password_line_only_with_password(password in "[A-Za-z0-9]{0,12}") {
        let attrs: HashMap<String, String> = [
            ("type".to_string(), "ssh".to_string()),
            ("host".to_string(), "10.0.0.5".to_string()),
            ("password".to_string(), password.clone()),
        ]
        .into_iter()
        .collect();
        let descriptor = resolve(&attrs).unwrap();
        let out = render_ssh(&descriptor, &["web1".to_string()], &[]).unwrap();
        prop_assert_eq!(out.contains("ansible_password="), !password.is_empty());
        prop_assert_eq!(out.matches("[host:vars]").count(), 1);
    }
}
