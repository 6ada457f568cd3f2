//! Space-delimited tokenizer.
//!
//! Tokens are separated by U+0020 only. Each token is trimmed of surrounding
//! control characters and spaces, so a trailing newline does not glue itself
//! to the last word of a line. Punctuation and case are left untouched.

const DELIMITER: char = ' ';

fn is_trimmable(c: char) -> bool {
    c <= DELIMITER
}

/// Split `text` into non-empty tokens
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split(DELIMITER)
        .map(|token| token.trim_matches(is_trimmable))
        .filter(|token| !token.is_empty())
}
