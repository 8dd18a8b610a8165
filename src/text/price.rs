//! Price extraction from normalized OCR text.

use regex::Regex;
use std::sync::LazyLock;

/// Contiguous runs of digits and grouping separators, starting and ending
/// on a digit:
/// - Plain numbers: 450
/// - Grouped numbers: 1,250 or 1.250.000
/// - Misplaced separators: 1,25 (read as 125)
static PRICE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9](?:[0-9,.]*[0-9])?").expect("price pattern is valid")
});

/// Default ceiling for a plausible price. OCR occasionally merges unrelated
/// digit runs into one enormous number; anything above this is discarded.
pub const DEFAULT_MAX_PLAUSIBLE_PRICE: u64 = 1_000_000_000_000;

/// Extracts a monetary value from a text fragment.
#[derive(Debug, Clone, Copy)]
pub struct PriceParser {
    max_plausible: u64,
}

impl Default for PriceParser {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PLAUSIBLE_PRICE)
    }
}

impl PriceParser {
    pub fn new(max_plausible: u64) -> Self {
        Self { max_plausible }
    }

    /// Parses the longest digit run in `text`, separators stripped.
    ///
    /// Currency glyphs and words around the number are ignored. Returns `None`
    /// when there is no digit run or the value is implausibly large. When two
    /// runs have the same number of digits the first one wins.
    pub fn parse(&self, text: &str) -> Option<u64> {
        let mut longest: Option<(usize, &str)> = None;
        for m in PRICE_PATTERN.find_iter(text) {
            let digits = m.as_str().bytes().filter(u8::is_ascii_digit).count();
            if longest.is_none_or(|(best, _)| digits > best) {
                longest = Some((digits, m.as_str()));
            }
        }

        let (_, run) = longest?;
        let digits: String = run.chars().filter(char::is_ascii_digit).collect();
        let value = digits.parse::<u64>().ok()?;

        (value <= self.max_plausible).then_some(value)
    }
}
