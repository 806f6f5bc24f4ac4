//! Telegram (legacy) Markdown helpers.

/// Escape the characters legacy Markdown treats as entity delimiters.
///
/// Only valid outside of entities; text inside backticks is sent verbatim.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Fenced block for multi-line monospace text.
pub fn code_block(text: &str) -> String {
    format!("```\n{}\n```", text.trim_end_matches('\n'))
}
