//! Script-line tokenization.

/// Splits a script line into tokens on single spaces, dropping empty tokens.
///
/// There is no quoting support: `"a b"` yields `"\"a"` and `"b\""`. Tabs and
/// other whitespace stay inside tokens, matching how script lines are
/// delimited by the target application.
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split(' ').filter(|t| !t.is_empty()).collect()
}

/// True for tokens naming a remote resource: `http://` or `https://`, case-sensitive.
pub fn is_remote_reference(token: &str) -> bool {
    token.starts_with("http://") || token.starts_with("https://")
}
