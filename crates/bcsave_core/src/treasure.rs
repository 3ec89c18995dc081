use std::fmt;

use serde::{Deserialize, Serialize};

use crate::csv::Csv;
use crate::story::Era;

const GROUP_ROWS: std::ops::Range<usize> = 11..22;
const GROUP_TERMINATOR: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreasureLevel {
    None,
    Inferior,
    Normal,
    Superior,
    Custom(i32),
}

impl TreasureLevel {
    pub const NONE_RAW: i32 = 0;
    pub const INFERIOR_RAW: i32 = 1;
    pub const NORMAL_RAW: i32 = 2;
    pub const SUPERIOR_RAW: i32 = 3;

    pub fn from_raw(raw: i32) -> Self {
        match raw {
            Self::NONE_RAW => Self::None,
            Self::INFERIOR_RAW => Self::Inferior,
            Self::NORMAL_RAW => Self::Normal,
            Self::SUPERIOR_RAW => Self::Superior,
            other => Self::Custom(other),
        }
    }

    pub fn raw(&self) -> i32 {
        match *self {
            Self::None => Self::NONE_RAW,
            Self::Inferior => Self::INFERIOR_RAW,
            Self::Normal => Self::NORMAL_RAW,
            Self::Superior => Self::SUPERIOR_RAW,
            Self::Custom(other) => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::None => "None",
            Self::Inferior => "Inferior",
            Self::Normal => "Normal",
            Self::Superior => "Superior",
            Self::Custom(_) => "Custom",
        }
    }
}

impl fmt::Display for TreasureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Custom(v) => write!(f, "Custom ({})", v),
            _ => f.write_str(self.as_str()),
        }
    }
}

/// Named subsets of a chapter's stages that share one treasure.
///
/// Each group is a list of storage stage ids, read from the era's treasure data
/// table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TreasureGroups {
    groups: Vec<Vec<usize>>,
}

impl TreasureGroups {
    pub fn new(groups: Vec<Vec<usize>>) -> Self {
        Self { groups }
    }

    pub fn data_file_name(era: Era) -> &'static str {
        match era {
            Era::EmpireOfCats => "treasureData0.csv",
            Era::IntoTheFuture => "treasureData1.csv",
            Era::CatsOfTheCosmos => "treasureData2_0.csv",
        }
    }

    /// Groups live on rows 11..22 of the table; `-1` pads short groups and
    /// negative ids are never stage ids.
    pub fn from_csv(csv: &Csv) -> Self {
        let groups = csv
            .rows()
            .iter()
            .skip(GROUP_ROWS.start)
            .take(GROUP_ROWS.len())
            .map(|row| {
                row.iter()
                    .map(|cell| cell.to_int())
                    .filter(|&id| id != GROUP_TERMINATOR)
                    .filter_map(|id| usize::try_from(id).ok())
                    .collect()
            })
            .collect();
        Self { groups }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group(&self, index: usize) -> Option<&[usize]> {
        self.groups.get(index).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[usize]> {
        self.groups.iter().map(Vec::as_slice)
    }
}
