//! `hostbridge version`

use serde::Serialize;

#[derive(Serialize)]
struct VersionInfo {
    version: &'static str,
    playbook_program: &'static str,
}

/// Prints the crate version, as JSON when asked.
pub fn run(json: bool) {
    let info = VersionInfo {
        version: env!("CARGO_PKG_VERSION"),
        playbook_program: crate::domain::play::PLAYBOOK_PROGRAM,
    };
    if json {
        match serde_json::to_string(&info) {
            Ok(text) => println!("{text}"),
            Err(e) => tracing::error!(error = %e, "cannot serialize version"),
        }
    } else {
        println!("hostbridge {}", info.version);
    }
}
