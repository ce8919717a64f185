//! Property name normalization.
//!
//! API fields are stored under snake_case keys, but callers may address them
//! in camelCase as well. `to_snake_case` is the pure derivation step; caching
//! the result per object type is left to `Schema` and `ResponseObject`.

/// Derive the snake_case spelling of `name`.
///
/// An underscore is inserted before every run of uppercase letters unless the
/// output already ends in a separator. A run that is followed by a capitalised
/// word gives up its last letter to that word, so `HTMLParser` becomes
/// `html_parser` while a trailing run such as the one in `estateID` stays a
/// single boundary. Leading underscores are trimmed.
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    let mut i = 0;

    while i < chars.len() {
        if !chars[i].is_ascii_uppercase() {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let mut end = i + 1;
        while end < chars.len()
            && chars[end].is_ascii_uppercase()
            && !chars.get(end + 1).is_some_and(char::is_ascii_lowercase)
        {
            end += 1;
        }

        if !out.ends_with('_') {
            out.push('_');
        }
        out.extend(chars[i..end].iter().map(char::to_ascii_lowercase));
        i = end;
    }

    out.trim_start_matches('_').to_string()
}
