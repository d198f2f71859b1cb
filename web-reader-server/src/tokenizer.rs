//! Splits input text into the display units that each receive one timing mark.
//!
//! Two policies exist, chosen by the target voice: whitespace-delimited words,
//! and punctuation-delimited sentence fragments for Mandarin voices where
//! words are not separated by spaces.

use web_reader_common::error::Error;

/// Substring identifying a Mandarin-family voice (`cmn-CN-…`, `cmn-TW-…`).
pub const MANDARIN_VOICE_MARKER: &str = "cmn";

/// Characters that close a fragment under the sentence policy.
///
/// Full-width CJK punctuation plus the ASCII terminators and separators.
pub const SENTENCE_DELIMITERS: &[char] = &[
    '。', '？', '！', '.', '!', '?', '：', ':', '；', ';', '、', ',', '，',
];

/// How text is split into tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPolicy {
    /// Split on runs of whitespace.
    Words,
    /// Split after each sentence delimiter.
    Sentences,
}

impl TokenPolicy {
    /// Pick the policy for a voice identifier.
    pub fn for_voice(voice_id: &str) -> Self {
        if voice_id.contains(MANDARIN_VOICE_MARKER) {
            TokenPolicy::Sentences
        } else {
            TokenPolicy::Words
        }
    }
}

/// Split `text` into ordered tokens for `voice_id`.
///
/// Under the sentence policy the trailing buffer is always appended, so text
/// ending in a delimiter yields a final empty token. Marks are numbered by
/// token position, so the count must stay exactly as produced here.
///
/// # Errors
/// Returns `Error::EmptyTokenization` if non-empty input produced no tokens.
pub fn tokenize(text: &str, voice_id: &str) -> Result<Vec<String>, Error> {
    let tokens = match TokenPolicy::for_voice(voice_id) {
        TokenPolicy::Words => split_words(text),
        TokenPolicy::Sentences => split_sentences(text),
    };

    if tokens.is_empty() && !text.is_empty() {
        return Err(Error::EmptyTokenization);
    }
    Ok(tokens)
}

fn split_words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        current.push(ch);
        if SENTENCE_DELIMITERS.contains(&ch) {
            segments.push(current.trim().to_string());
            current.clear();
        }
    }
    segments.push(current.trim().to_string());

    segments
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    /// Text made of words separated by arbitrary whitespace runs.
    fn spaced_text_strategy() -> impl Strategy<Value = String> {
        (
            prop::collection::vec("[A-Za-z0-9'.,!?-]{1,12}", 1..20),
            prop::collection::vec("[ \t\n]{1,4}", 1..20),
            "[ \t\n]{0,3}",
        )
            .prop_map(|(words, gaps, lead)| {
                let mut text = lead;
                for (i, word) in words.iter().enumerate() {
                    if i > 0 {
                        text.push_str(&gaps[i % gaps.len()]);
                    }
                    text.push_str(word);
                }
                text
            })
    }

    proptest! {
        /// Joining word tokens with single spaces reproduces the
        /// whitespace-collapsed input.
        #[test]
        fn words_rejoin_to_normalized_input(text in spaced_text_strategy()) {
            let tokens = tokenize(&text, "en-US-Wavenet-D").unwrap();
            let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
            prop_assert_eq!(tokens.join(" "), normalized);
            prop_assert!(tokens.iter().all(|t| !t.is_empty()));
        }

        /// Sentence tokens never lose non-whitespace characters and the
        /// count is one more than the number of delimiters.
        #[test]
        fn sentences_preserve_content(text in "[你好世界。！，a-z .!?]{0,40}") {
            let tokens = tokenize(&text, "cmn-CN-Wavenet-A").unwrap();
            let delimiters = text.chars().filter(|c| SENTENCE_DELIMITERS.contains(c)).count();
            prop_assert_eq!(tokens.len(), delimiters + 1);

            let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
            prop_assert_eq!(strip(&tokens.concat()), strip(&text));
        }
    }
}
