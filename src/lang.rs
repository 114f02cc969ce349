//! Heuristic language labeling for finalized transcript text.
//!
//! The engine does not tag which language a finished utterance was spoken in,
//! so finalized entries are labeled with a simple script count: Hangul
//! syllables versus Latin letters.

/// Label for Korean-script text.
pub const KOREAN: &str = "ko";

/// Label for Latin-script (English) text.
pub const ENGLISH: &str = "en";

/// Classify finalized transcript text as Korean or English.
///
/// Counts characters in the Hangul Syllables block (U+AC00..U+D7A3) against
/// ASCII letters. Hangul wins only on a strictly greater count; a tie
/// (including all-symbol or empty text) is labeled English.
pub fn classify(text: &str) -> &'static str {
    let mut hangul = 0usize;
    let mut latin = 0usize;
    for c in text.chars() {
        if ('\u{AC00}'..='\u{D7A3}').contains(&c) {
            hangul += 1;
        } else if c.is_ascii_alphabetic() {
            latin += 1;
        }
    }
    if hangul > latin { KOREAN } else { ENGLISH }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn korean_text_is_korean() {
        assert_eq!(classify("안녕하세요"), KOREAN);
    }

    #[test]
    fn english_text_is_english() {
        assert_eq!(classify("hello there"), ENGLISH);
    }

    #[test]
    fn mixed_text_follows_majority() {
        assert_eq!(classify("안녕하세요 hi"), KOREAN);
        assert_eq!(classify("안녕 hello there"), ENGLISH);
    }

    #[test]
    fn tie_favors_english() {
        // Two Hangul syllables vs two Latin letters: equal counts → "en".
        assert_eq!(classify("안녕 hi"), ENGLISH);
    }

    #[test]
    fn empty_and_symbol_only_text_is_english() {
        assert_eq!(classify(""), ENGLISH);
        assert_eq!(classify("123 !?"), ENGLISH);
    }

    #[test]
    fn punctuation_and_digits_are_not_counted() {
        // One Hangul syllable beats zero Latin letters regardless of digits.
        assert_eq!(classify("안 123,456!"), KOREAN);
    }

    #[test]
    fn hangul_jamo_outside_syllable_block_is_not_counted() {
        // U+3131 is a compatibility jamo, not in the syllables block.
        assert_eq!(classify("ㄱ a"), ENGLISH);
    }
}
