use std::sync::LazyLock;

use regex::Regex;

static CALLBACK_PATH: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(/[A-Za-z0-9_.~\-]+)+$").ok());

/// Check that a callback path is absolute and made of path-safe segments,
/// e.g. `/slack_events/v1/mybot-v1_events`.
pub fn is_valid_path(path: &str) -> bool {
    CALLBACK_PATH
        .as_ref()
        .is_some_and(|re| re.is_match(path))
}
