//! Cleanup of user messages and shell commands pulled from session logs.

/// Longest kept user message, in characters.
pub const USER_TEXT_LIMIT: usize = 180;
/// Longest kept command, in characters.
pub const COMMAND_LIMIT: usize = 120;

const SHELL_WRAPPERS: &[&str] = &["/bin/zsh -lc ", "zsh -lc ", "bash -lc "];

/// Injected agent context rather than something the user typed.
const NOISE_FRAGMENTS: &[&str] = &[
    "<instructions>",
    "<permissions instructions>",
    "<environment_context>",
];
const NOISE_WORDS: &[&str] = &["you are codex", "collaboration mode", "token_count"];

/// Whitespace runs collapsed; longer text cut to `limit` chars ending in `…`.
pub fn shorten_text(text: &str, limit: usize) -> String {
    let compact = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if compact.chars().count() <= limit {
        return compact;
    }
    let head: String = compact.chars().take(limit.saturating_sub(1)).collect();
    format!("{}…", head.trim_end())
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// `needle` in `haystack` with a word boundary on both sides.
fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(pos, _)| {
        let before = haystack[..pos].chars().next_back();
        let after = haystack[pos + needle.len()..].chars().next();
        !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
    })
}

pub fn is_noise_text(text: &str) -> bool {
    if text.chars().count() < 4 {
        return true;
    }
    let lowered = text.to_lowercase();
    if let Some(rest) = lowered.strip_prefix('#') {
        if rest.trim_start().starts_with("agents.md instructions") {
            return true;
        }
    }
    NOISE_FRAGMENTS.iter().any(|f| lowered.contains(f))
        || NOISE_WORDS.iter().any(|w| contains_word(&lowered, w))
}

/// Shortened user message, or empty when it is noise.
pub fn sanitize_user_text(text: &str) -> String {
    let cleaned = shorten_text(text, USER_TEXT_LIMIT);
    if is_noise_text(&cleaned) {
        return String::new();
    }
    cleaned
}

/// First simple command of a shell line: wrapper, heredoc body and any
/// pipeline or `&&`/`||` chain dropped.
pub fn sanitize_command(command: &str) -> String {
    let mut compact = command.split_whitespace().collect::<Vec<_>>().join(" ");
    if compact.is_empty() {
        return compact;
    }
    if let Some(inner) = SHELL_WRAPPERS
        .iter()
        .find_map(|prefix| compact.strip_prefix(prefix))
    {
        compact = inner.trim().trim_matches('\'').trim_matches('"').to_string();
    }
    if let Some((head, _)) = compact.split_once("<<") {
        compact = head.trim().to_string();
    }
    for sep in ["&&", "||", "|"] {
        if let Some((head, _)) = compact.split_once(sep) {
            compact = head.trim().to_string();
        }
    }
    shorten_text(&compact, COMMAND_LIMIT)
}

/// Push `value` unless it is empty, already present, or `items` is full.
pub fn append_unique(items: &mut Vec<String>, value: String, limit: usize) {
    if value.is_empty() || items.len() >= limit || items.contains(&value) {
        return;
    }
    items.push(value);
}
