//! Rarity tiers and minimum-tier cascading.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Item rarity, ordered from least to most severe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
    Mythic,
    BrainrotGod,
    Secret,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown rarity tier: {0:?}")]
pub struct UnknownRarity(pub String);

impl Rarity {
    /// All tiers in severity order.
    pub const ALL: [Rarity; 7] = [
        Rarity::Common,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
        Rarity::Mythic,
        Rarity::BrainrotGod,
        Rarity::Secret,
    ];

    /// Display label as shown in game.
    pub fn label(self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
            Rarity::Legendary => "Legendary",
            Rarity::Mythic => "Mythic",
            Rarity::BrainrotGod => "Brainrot God",
            Rarity::Secret => "Secret",
        }
    }

    /// Lower-case label, the form normalized text is compared against.
    pub fn term(self) -> String {
        self.label().to_lowercase()
    }

    /// This tier and every tier above it.
    pub fn cascade(self) -> impl Iterator<Item = Rarity> {
        Self::ALL.into_iter().filter(move |tier| *tier >= self)
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Rarity {
    type Err = UnknownRarity;

    /// Case-insensitive; spaces, dashes and underscores are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        Self::ALL
            .into_iter()
            .find(|tier| tier.label().replace(' ', "").to_lowercase() == key)
            .ok_or_else(|| UnknownRarity(s.to_string()))
    }
}

impl TryFrom<String> for Rarity {
    type Error = UnknownRarity;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rarity> for String {
    fn from(value: Rarity) -> Self {
        value.label().to_string()
    }
}
