#![forbid(unsafe_code)]

//! Tile identity and insertion placement.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque handle naming one host element (a tile, or a foreign drag source).
///
/// The host allocates ids; the engine never interprets the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileId(pub u64);

impl TileId {
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tile#{}", self.0)
    }
}

impl From<u64> for TileId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Where a moved tile lands relative to the base tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Before,
    After,
}

impl Placement {
    /// The opposite side.
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::Before => Self::After,
            Self::After => Self::Before,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a placement string is neither `before` nor `after`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementParseError {
    pub input: String,
}

impl fmt::Display for PlacementParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid placement {:?} (expected \"before\" or \"after\")",
            self.input
        )
    }
}

impl std::error::Error for PlacementParseError {}

impl FromStr for Placement {
    type Err = PlacementParseError;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("before") {
            Ok(Self::Before)
        } else if s.eq_ignore_ascii_case("after") {
            Ok(Self::After)
        } else {
            Err(PlacementParseError {
                input: s.to_owned(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_parses_case_insensitively() {
        assert_eq!("before".parse::<Placement>(), Ok(Placement::Before));
        assert_eq!("AFTER".parse::<Placement>(), Ok(Placement::After));
        assert_eq!("After".parse::<Placement>(), Ok(Placement::After));
        let err = "middle".parse::<Placement>().unwrap_err();
        assert_eq!(err.input, "middle");
    }

    #[test]
    fn placement_inverse_round_trips() {
        assert_eq!(Placement::Before.inverse(), Placement::After);
        assert_eq!(Placement::After.inverse().inverse(), Placement::After);
    }

    #[test]
    fn placement_serde_names() {
        let json = serde_json::to_string(&Placement::Before).expect("serialize");
        assert_eq!(json, "\"before\"");
        let tile: TileId = serde_json::from_str("7").expect("deserialize");
        assert_eq!(tile, TileId(7));
        assert_eq!(tile.to_string(), "tile#7");
    }
}
