//! The fixed Strive character roster.
//!
//! Replay data identifies characters by a small integer code, which is the
//! character's position in [`ROSTER`]. Roster order is also the canonical row
//! order for every derived table.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Character names indexed by replay character code.
pub const ROSTER: [&str; 21] = [
    "Sol",
    "Ky",
    "May",
    "Axl",
    "Chipp",
    "Potemkin",
    "Faust",
    "Millia",
    "Zato-1",
    "Ramlethal",
    "Leo",
    "Nagoriyuki",
    "Giovanna",
    "Anji",
    "I-No",
    "Goldlewis",
    "Jack-O",
    "Happy Chaos",
    "Baiken",
    "Testament",
    "Bridget",
];

/// A roster character. Only constructible from a valid code or name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Character(u8);

impl Character {
    /// Number of characters on the roster.
    pub const COUNT: usize = ROSTER.len();

    /// Look up a character by replay code.
    pub fn from_code(code: i64) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .filter(|&idx| idx < Self::COUNT)
            .map(|idx| Self(idx as u8))
    }

    /// Look up a character by its canonical name.
    pub fn from_name(name: &str) -> Option<Self> {
        ROSTER
            .iter()
            .position(|&n| n == name)
            .map(|idx| Self(idx as u8))
    }

    /// All characters in roster order.
    pub fn all() -> impl DoubleEndedIterator<Item = Character> + ExactSizeIterator {
        (0..Self::COUNT).map(|idx| Self(idx as u8))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn name(self) -> &'static str {
        ROSTER[self.index()]
    }
}

impl fmt::Display for Character {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for Character {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Character({})", self.name())
    }
}

impl Serialize for Character {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Character {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Character::from_name(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown character: {}", name)))
    }
}
