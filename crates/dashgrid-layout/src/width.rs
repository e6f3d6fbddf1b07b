#![forbid(unsafe_code)]

//! Card width classes.
//!
//! The grid has six columns. A card spans two, three, four, or all six of
//! them, and that column count is the value persisted for each card.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of columns in one grid row.
pub const GRID_COLUMNS: u8 = 6;

/// Relative width a card occupies in its row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum WidthClass {
    /// One third of a row.
    Third,
    /// Half a row.
    #[default]
    Half,
    /// Two thirds of a row.
    TwoThirds,
    /// The whole row.
    Full,
}

impl WidthClass {
    /// Every width, narrowest first. This is also the button order in a
    /// card's width control.
    pub const ALL: [Self; 4] = [Self::Third, Self::Half, Self::TwoThirds, Self::Full];

    /// Grid columns spanned.
    #[must_use]
    pub const fn columns(self) -> u8 {
        match self {
            Self::Third => 2,
            Self::Half => 3,
            Self::TwoThirds => 4,
            Self::Full => GRID_COLUMNS,
        }
    }

    /// Parse a persisted column count.
    #[must_use]
    pub const fn from_columns(columns: u8) -> Option<Self> {
        match columns {
            2 => Some(Self::Third),
            3 => Some(Self::Half),
            4 => Some(Self::TwoThirds),
            6 => Some(Self::Full),
            _ => None,
        }
    }

    /// Short fraction label for width buttons.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Third => "1/3",
            Self::Half => "1/2",
            Self::TwoThirds => "2/3",
            Self::Full => "Full",
        }
    }
}

impl fmt::Display for WidthClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A persisted column count that is not one of the four width classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidWidth(pub u8);

impl fmt::Display for InvalidWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid width class: {} columns", self.0)
    }
}

impl std::error::Error for InvalidWidth {}

impl TryFrom<u8> for WidthClass {
    type Error = InvalidWidth;

    fn try_from(columns: u8) -> Result<Self, Self::Error> {
        Self::from_columns(columns).ok_or(InvalidWidth(columns))
    }
}

impl From<WidthClass> for u8 {
    fn from(width: WidthClass) -> Self {
        width.columns()
    }
}
