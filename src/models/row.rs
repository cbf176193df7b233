//! Row type catalog.
//!
//! Every job on the board is laid out in lanes ("rows"). The row type picks
//! the default drop rule used while the row is not split into boxes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BoardError;

/// Row classification.
///
/// The serialized names are kept exactly as stored (`"Forman"`, `"MPT"`,
/// `"crew"`, `"trucks"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RowType {
    /// Foreman lane.
    Forman,
    Equipment,
    Sweeper,
    /// Tack coat crew and supply.
    Tack,
    /// Maintenance of public traffic.
    #[serde(rename = "MPT")]
    Mpt,
    #[serde(rename = "crew")]
    Crew,
    #[serde(rename = "trucks")]
    Trucks,
}

impl RowType {
    /// Every row type in board order.
    pub const ALL: [RowType; 7] = [
        Self::Forman,
        Self::Equipment,
        Self::Sweeper,
        Self::Tack,
        Self::Mpt,
        Self::Crew,
        Self::Trucks,
    ];

    /// Stored name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Forman => "Forman",
            Self::Equipment => "Equipment",
            Self::Sweeper => "Sweeper",
            Self::Tack => "Tack",
            Self::Mpt => "MPT",
            Self::Crew => "crew",
            Self::Trucks => "trucks",
        }
    }
}

impl fmt::Display for RowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RowType {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| BoardError::UnknownRowType(s.to_string()))
    }
}
