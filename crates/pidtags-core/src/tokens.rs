//! Degraded-mode tokenization.
//!
//! When a host has no positional data, recognition falls back to splitting
//! a raw text blob into candidate tokens and classifying each one.
//! Instrument pairing is impossible in this mode (there is no geometry to
//! pair fragments with), which is a documented capability reduction.

/// Punctuation characters that terminate a token in addition to whitespace.
const TOKEN_PUNCTUATION: &[char] = &[',', ';', '.', '(', ')', '[', ']', '{', '}'];

/// Split unstructured text into deduplicated candidate tokens.
///
/// Splits on whitespace and on the fixed punctuation class
/// `, ; . ( ) [ ] { }`, discards empty fragments, and deduplicates by exact
/// string equality keeping the first occurrence.
pub fn extract_tokens(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();

    for raw in text.split(|c: char| c.is_whitespace() || TOKEN_PUNCTUATION.contains(&c)) {
        if raw.is_empty() {
            continue;
        }
        if tokens.iter().any(|t| t == raw) {
            continue;
        }
        tokens.push(raw.to_string());
    }

    tokens
}
