//! Post-processing of coach text before it is shown on screen.

/// Default on-screen length, in characters.
pub const FEEDBACK_CHAR_LIMIT: usize = 28;

const SENTENCE_TERMINATORS: [char; 4] = ['。', '.', '!', '?'];

/// Reduce an LLM reply to one short line.
///
/// Keeps the first line, cuts at the first sentence terminator, trims, and
/// truncates to `limit` characters with a trailing ellipsis.
pub fn shorten_feedback(text: &str, limit: usize) -> String {
    let first_line = text.trim().lines().next().unwrap_or_default();
    let sentence = first_line
        .split(SENTENCE_TERMINATORS)
        .next()
        .unwrap_or_default()
        .trim();

    if sentence.chars().count() <= limit {
        return sentence.to_string();
    }

    let mut shortened: String = sentence.chars().take(limit).collect();
    shortened.truncate(shortened.trim_end().len());
    shortened.push('…');
    shortened
}
