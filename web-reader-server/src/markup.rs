//! SSML document builder with one timing mark per token.
//!
//! Each token is preceded by `<mark name="i"/>`, so the timepoint the
//! provider reports for mark `i` is the moment token `i` starts being spoken.
//! A client highlights token `i` from mark `i` until mark `i + 1` (or the end
//! of the audio).

use std::borrow::Cow;

/// Serialize tokens into a `<speak>` document with a mark before each token.
///
/// Entries are separated by a single space regardless of tokenizer policy.
///
/// # Example
///
/// ```
/// use web_reader_server::markup::build_markup;
///
/// let ssml = build_markup(&["Hello", "world"]);
/// assert_eq!(ssml, r#"<speak><mark name="0"/>Hello <mark name="1"/>world</speak>"#);
/// ```
pub fn build_markup<S: AsRef<str>>(tokens: &[S]) -> String {
    let body = tokens
        .iter()
        .enumerate()
        .map(|(i, token)| format!(r#"<mark name="{}"/>{}"#, i, escape_markup(token.as_ref())))
        .collect::<Vec<_>>()
        .join(" ");

    format!("<speak>{}</speak>", body)
}

/// Escape the five XML metacharacters.
///
/// Unescaped text produces malformed SSML and the provider rejects the
/// whole request.
pub fn escape_markup(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    Cow::Owned(escaped)
}

/// Token index encoded in a mark name, if it is one of ours.
pub fn mark_index(mark_name: &str) -> Option<usize> {
    if mark_name.is_empty() || !mark_name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    mark_name.parse().ok()
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    /// Remove every escape sequence we emit.
    fn strip_entities(s: &str) -> String {
        s.replace("&amp;", "")
            .replace("&lt;", "")
            .replace("&gt;", "")
            .replace("&quot;", "")
            .replace("&apos;", "")
    }

    proptest! {
        /// Escaped text never contains a raw metacharacter outside an entity.
        #[test]
        fn escaped_text_has_no_raw_metacharacters(text in ".{0,60}") {
            let escaped = escape_markup(&text);
            let stripped = strip_entities(&escaped);
            prop_assert!(!stripped.contains(['&', '<', '>', '"', '\'']));
        }

        /// One mark per token, numbered 0..n in document order.
        #[test]
        fn one_mark_per_token_in_order(tokens in prop::collection::vec("[^<>&\"']{0,10}", 0..15)) {
            let ssml = build_markup(&tokens);
            prop_assert_eq!(ssml.matches("<mark ").count(), tokens.len());

            let mut cursor = 0;
            for (i, token) in tokens.iter().enumerate() {
                let entry = format!(r#"<mark name="{}"/>{}"#, i, token);
                let found = ssml[cursor..].find(&entry);
                prop_assert!(found.is_some(), "entry {} missing after offset {}", i, cursor);
                cursor += found.unwrap() + entry.len();
            }
        }
    }
}
