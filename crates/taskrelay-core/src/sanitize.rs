//! Best-effort stripping of embedded decision directives from agent prose.
//!
//! Agent `say` text sometimes carries an inline JSON directive of the shape
//! `{"question": ..., "options": [...]}` (quote style varies) that drives
//! the host UI's decision prompt. Clients should never see it. This is a
//! heuristic substring filter, not a parser: it makes no well-formedness
//! assumptions and degrades to a no-op on anything it cannot match.

use std::sync::OnceLock;

use regex::Regex;

/// Matches one embedded directive: an object opening with a `question` key
/// and containing an `options` array, up to the next closing brace.
const DIRECTIVE_PATTERN: &str =
    r#"\{\s*["']question["']\s*:[\s\S]*?["']options["']\s*:\s*\[[^\]]*\][\s\S]*?\}"#;

fn directive_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DIRECTIVE_PATTERN).ok()).as_ref()
}

/// Remove embedded decision directives from `raw` and trim the result.
///
/// Adjacent directive fragments left by naive concatenation (`}{`) collapse
/// to a single space. Never fails: if the matcher is unavailable the input
/// comes back unchanged apart from trimming. Callers must treat an
/// all-whitespace result (empty after trim) as "nothing to display".
pub fn sanitize(raw: &str) -> String {
    let Some(re) = directive_re() else {
        return raw.trim().to_string();
    };
    let stripped = re.replace_all(raw, "");
    stripped.replace("}{", " ").trim().to_string()
}
