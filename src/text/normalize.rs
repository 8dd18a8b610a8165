//! OCR text normalization.
//!
//! Recognition output is noisy: digits and letters get swapped, stray
//! punctuation splits words, and rarity labels come back one character off.
//! Normalization folds that noise into a lower-case, single-spaced form that
//! the rule matcher can substring-search.

use strsim::levenshtein;

/// Rarity words recognized by the dictionary (multi-word labels are split).
pub const RARITY_VOCABULARY: &[&str] = &[
    "common",
    "rare",
    "epic",
    "legendary",
    "mythic",
    "brainrot",
    "god",
    "secret",
];

/// Currency words recognized by the dictionary.
pub const CURRENCY_VOCABULARY: &[&str] = &["coins", "cash", "robux"];

/// Currency glyphs kept verbatim so the price parser can see them.
const CURRENCY_GLYPHS: &[char] = &['$', '¢', '£', '€', '¥'];

/// Corrects recognition noise in a raw text fragment.
///
/// Implementations must never fail: text they cannot improve is returned as-is
/// (lower-cased and whitespace-collapsed at minimum).
pub trait Normalize: Send {
    fn normalize(&self, raw: &str) -> String;
}

/// Deterministic bounded-edit-distance corrector.
///
/// A token is replaced by its nearest vocabulary entry only when the distance
/// is within [`max_edits`] for the token's length and the nearest entry is unique.
#[derive(Debug, Clone)]
pub struct DictionaryNormalizer {
    vocabulary: Vec<String>,
}

impl Default for DictionaryNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl DictionaryNormalizer {
    /// Creates a normalizer over the built-in rarity and currency words.
    pub fn new() -> Self {
        Self::with_extra_words(std::iter::empty::<&str>())
    }

    /// Creates a normalizer over the built-in words plus `extra`.
    pub fn with_extra_words<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocabulary: Vec<String> = RARITY_VOCABULARY
            .iter()
            .chain(CURRENCY_VOCABULARY)
            .map(|w| w.to_string())
            .collect();

        for word in extra {
            let word = word.as_ref().trim().to_lowercase();
            if !word.is_empty()
                && word.chars().all(char::is_alphabetic)
                && !vocabulary.contains(&word)
            {
                vocabulary.push(word);
            }
        }

        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Returns the dictionary replacement for `token`, or `None` to keep it.
    ///
    /// Only purely alphabetic tokens are candidates; numbers and mixed tokens
    /// are left for the price parser.
    pub fn correct_token(&self, token: &str) -> Option<&str> {
        if !token.chars().all(char::is_alphabetic) {
            return None;
        }
        if self.vocabulary.iter().any(|w| w == token) {
            return None;
        }

        let token_len = token.chars().count();
        let budget = max_edits(token_len);
        if budget == 0 {
            return None;
        }

        let mut best: Option<(usize, &str)> = None;
        let mut tied = false;
        for word in &self.vocabulary {
            // "gold" must not collapse into "god"
            let word_len = word.chars().count();
            if word_len <= SHORT_WORD_LEN && word_len != token_len {
                continue;
            }
            let distance = levenshtein(token, word);
            match best {
                Some((d, _)) if distance > d => {}
                Some((d, _)) if distance == d => tied = true,
                _ => {
                    best = Some((distance, word.as_str()));
                    tied = false;
                }
            }
        }

        match best {
            Some((distance, word)) if distance <= budget && !tied => Some(word),
            _ => None,
        }
    }
}

impl Normalize for DictionaryNormalizer {
    fn normalize(&self, raw: &str) -> String {
        let mut chars: Vec<char> = raw.to_lowercase().chars().collect();
        repair_confusions(&mut chars);
        let cleaned = strip_separators(&chars);

        cleaned
            .split_whitespace()
            .map(|token| self.correct_token(token).unwrap_or(token))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Dictionary entries this short are only matched by tokens of equal length.
const SHORT_WORD_LEN: usize = 3;

/// Edit budget for a token of `len` characters.
///
/// Tokens of three characters or fewer get no budget at all: one edit is a
/// third of the word, enough to turn unrelated short words ("gad", "cat")
/// into vocabulary entries.
pub fn max_edits(len: usize) -> usize {
    match len {
        0..=3 => 0,
        4..=6 => 1,
        _ => 2,
    }
}

/// Swaps digit/letter look-alikes that sit inside the other class.
///
/// `1o5` becomes `105`, `brainr0t` becomes `brainrot`. Neighbours are read from
/// the unmodified input so a repair never cascades into the next character.
fn repair_confusions(chars: &mut [char]) {
    if chars.len() < 3 {
        return;
    }
    let original = chars.to_vec();

    for i in 1..original.len() - 1 {
        let (prev, next) = (original[i - 1], original[i + 1]);

        if prev.is_ascii_digit() && next.is_ascii_digit() {
            if let Some(digit) = letter_as_digit(original[i]) {
                chars[i] = digit;
            }
        } else if prev.is_alphabetic() && next.is_alphabetic() {
            if let Some(letter) = digit_as_letter(original[i]) {
                chars[i] = letter;
            }
        }
    }
}

fn letter_as_digit(c: char) -> Option<char> {
    match c {
        'o' => Some('0'),
        'i' | 'l' | '|' => Some('1'),
        's' => Some('5'),
        _ => None,
    }
}

fn digit_as_letter(c: char) -> Option<char> {
    match c {
        '0' => Some('o'),
        '1' => Some('l'),
        '5' => Some('s'),
        _ => None,
    }
}

/// Replaces grouping punctuation with spaces.
///
/// Commas and periods survive only between two digits (thousand separators).
/// Apostrophes are dropped without splitting the word.
fn strip_separators(chars: &[char]) -> String {
    let mut out = String::with_capacity(chars.len());

    for (i, &c) in chars.iter().enumerate() {
        if c.is_alphanumeric() || CURRENCY_GLYPHS.contains(&c) {
            out.push(c);
            continue;
        }

        let between_digits = i > 0
            && i + 1 < chars.len()
            && chars[i - 1].is_ascii_digit()
            && chars[i + 1].is_ascii_digit();

        match c {
            ',' | '.' if between_digits => out.push(c),
            '\'' | '\u{2019}' => {}
            _ => out.push(' '),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn normalize(raw: &str) -> String {
        DictionaryNormalizer::new().normalize(raw)
    }

    #[test]
    fn test_lowercases_and_collapses_whitespace() {
        assert_eq!(normalize("  Golden   SLIME "), "golden slime");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn test_keeps_thousand_separators_inside_numbers() {
        assert_eq!(normalize("1,250G"), "1,250g");
        assert_eq!(normalize("$12.345"), "$12.345");
    }

    #[test]
    fn test_strips_grouping_punctuation() {
        assert_eq!(normalize("Rare, Epic"), "rare epic");
        assert_eq!(normalize("|Legendary|"), "legendary");
        assert_eq!(normalize("Brainrot-God"), "brainrot god");
    }

    #[test]
    fn test_corrects_near_rarity_labels() {
        assert_eq!(normalize("Legendry"), "legendary");
        assert_eq!(normalize("Mythlc"), "mythic");
        assert_eq!(normalize("SECRFT"), "secret");
        assert_eq!(normalize("Brainrat God"), "brainrot god");
    }

    #[test]
    fn test_repairs_digit_letter_confusion() {
        assert_eq!(normalize("1o5"), "105");
        assert_eq!(normalize("1,2O0"), "1,200");
        assert_eq!(normalize("Brainr0t"), "brainrot");
        assert_eq!(normalize("Myth1c"), "mythic");
    }

    #[test]
    fn test_short_tokens_are_never_corrected() {
        // "gad" is one edit from "god" but three-letter tokens get no budget
        assert_eq!(normalize("gad"), "gad");
        assert_eq!(normalize("ep"), "ep");
    }

    #[test]
    fn test_longer_tokens_never_shrink_into_short_entries() {
        assert_eq!(normalize("Gold"), "gold");
        assert_eq!(normalize("Good"), "good");
        assert_eq!(normalize("Gold Slime"), "gold slime");
        // Longer entries are still reachable
        assert_eq!(normalize("Rore"), "rare");
    }

    #[test]
    fn test_far_tokens_are_left_alone() {
        assert_eq!(normalize("Skibidi"), "skibidi");
        assert_eq!(normalize("Toilet"), "toilet");
    }

    #[test]
    fn test_ambiguous_nearest_entry_is_left_alone() {
        let normalizer = DictionaryNormalizer::with_extra_words(["rake"]);
        // "rare" and "rake" are both one edit from "rate"
        assert_eq!(normalizer.normalize("rate"), "rate");
    }

    #[test]
    fn test_extra_vocabulary_is_lowercased_and_deduplicated() {
        let normalizer = DictionaryNormalizer::with_extra_words(["Rainbow", "epic", " ", "x2"]);
        let words = normalizer.vocabulary();
        assert!(words.contains(&"rainbow".to_string()));
        assert_eq!(words.iter().filter(|w| *w == "epic").count(), 1);
        assert!(!words.contains(&"x2".to_string()));
        assert_eq!(normalizer.normalize("Rainbw"), "rainbow");
    }

    #[test]
    fn test_max_edits_by_length() {
        assert_eq!(max_edits(3), 0);
        assert_eq!(max_edits(4), 1);
        assert_eq!(max_edits(6), 1);
        assert_eq!(max_edits(9), 2);
    }

    proptest! {
        #[test]
        fn prop_normalize_never_panics_and_has_no_ascii_uppercase(raw in ".{0,40}") {
            let out = normalize(&raw);
            prop_assert!(!out.chars().any(|c| c.is_ascii_uppercase()));
            prop_assert!(!out.starts_with(' ') && !out.ends_with(' '));
            prop_assert!(!out.contains("  "));
        }
    }
}
