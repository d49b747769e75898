use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Canonical identifier for a title or a person's name
///
/// Lower-cases, strips diacritics, turns every run of characters outside
/// `[a-z0-9]` into one hyphen and trims hyphens at both ends.
/// `"Amélie (2001)"` becomes `"amelie-2001"`. Idempotent.
pub fn normalize_key(input: &str) -> String {
    let mut key = String::with_capacity(input.len());
    let mut separator = false;

    for c in input.to_lowercase().nfd() {
        if is_combining_mark(c) {
            continue;
        }
        if c.is_ascii_alphanumeric() {
            if separator && !key.is_empty() {
                key.push('-');
            }
            separator = false;
            key.push(c);
        } else {
            separator = true;
        }
    }

    key
}
