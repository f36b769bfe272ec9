//! Known-hosts records and file content.

use std::fmt;

/// A single known-hosts record (`<host> <key-type> <base64-key>`), or a raw
/// multi-line blob already in that format as emitted by `ssh-keyscan`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustLine(String);

impl TrustLine {
    /// Wraps raw known-hosts text verbatim.
    #[must_use]
    pub fn raw(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Pairs a host with a `<key-type> <base64-key>` public key.
    #[must_use]
    pub fn for_host(host: &str, key: &str) -> Self {
        Self(format!("{host} {}", key.trim()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrustLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds known-hosts file content: trimmed lines joined with `\n`, plus a
/// trailing newline. An empty slice yields `"\n"`.
#[must_use]
pub fn build(lines: &[TrustLine]) -> String {
    let mut content = lines
        .iter()
        .map(|l| l.as_str().trim())
        .collect::<Vec<_>>()
        .join("\n");
    content.push('\n');
    content
}
