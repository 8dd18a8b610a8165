//! Text cleanup for recognized on-screen fragments.
//!
//! This module provides:
//! - OCR noise correction against a small rarity/currency vocabulary
//! - Price extraction from corrected text

pub mod normalize;
pub mod price;

pub use normalize::{DictionaryNormalizer, Normalize};
pub use price::PriceParser;
