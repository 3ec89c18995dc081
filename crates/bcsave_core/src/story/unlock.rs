use std::fmt;

use serde::{Deserialize, Serialize};

use super::REAL_CHAPTER_COUNT;

const LAST_REVERSED_STAGE: usize = 45;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Era {
    EmpireOfCats,
    IntoTheFuture,
    CatsOfTheCosmos,
}

impl Era {
    pub const CHAPTERS_PER_ERA: usize = 3;

    pub fn from_real_chapter(real_chapter: usize) -> Self {
        match real_chapter / Self::CHAPTERS_PER_ERA {
            0 => Self::EmpireOfCats,
            1 => Self::IntoTheFuture,
            _ => Self::CatsOfTheCosmos,
        }
    }

    pub fn index(&self) -> usize {
        match *self {
            Self::EmpireOfCats => 0,
            Self::IntoTheFuture => 1,
            Self::CatsOfTheCosmos => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::EmpireOfCats => "Empire of Cats",
            Self::IntoTheFuture => "Into the Future",
            Self::CatsOfTheCosmos => "Cats of the Cosmos",
        }
    }
}

impl fmt::Display for Era {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterRequirement {
    pub chapter: usize,
    pub era: Era,
    /// 0-based position of the chapter inside its era.
    pub position: usize,
    /// Real chapters that must be fully cleared before this one unlocks.
    pub requires: &'static [usize],
}

pub static CHAPTER_REQUIREMENTS: [ChapterRequirement; REAL_CHAPTER_COUNT] = [
    ChapterRequirement {
        chapter: 0,
        era: Era::EmpireOfCats,
        position: 0,
        requires: &[],
    },
    ChapterRequirement {
        chapter: 1,
        era: Era::EmpireOfCats,
        position: 1,
        requires: &[0],
    },
    ChapterRequirement {
        chapter: 2,
        era: Era::EmpireOfCats,
        position: 2,
        requires: &[0, 1],
    },
    ChapterRequirement {
        chapter: 3,
        era: Era::IntoTheFuture,
        position: 0,
        requires: &[0],
    },
    ChapterRequirement {
        chapter: 4,
        era: Era::IntoTheFuture,
        position: 1,
        requires: &[0, 3],
    },
    ChapterRequirement {
        chapter: 5,
        era: Era::IntoTheFuture,
        position: 2,
        requires: &[0, 3, 4],
    },
    ChapterRequirement {
        chapter: 6,
        era: Era::CatsOfTheCosmos,
        position: 0,
        requires: &[0, 3],
    },
    ChapterRequirement {
        chapter: 7,
        era: Era::CatsOfTheCosmos,
        position: 1,
        requires: &[0, 3, 6],
    },
    ChapterRequirement {
        chapter: 8,
        era: Era::CatsOfTheCosmos,
        position: 2,
        requires: &[0, 3, 6, 7],
    },
];

pub fn requirement(real_chapter: usize) -> &'static ChapterRequirement {
    &CHAPTER_REQUIREMENTS[real_chapter]
}

/// Maps a UI stage index to its storage slot and back.
///
/// Stages 0..=45 are stored in reverse; 46 and 47 keep their order.
pub fn convert_stage_id(index: usize) -> usize {
    if index <= LAST_REVERSED_STAGE {
        LAST_REVERSED_STAGE - index
    } else {
        index
    }
}

pub fn chapter_label(real_chapter: usize) -> String {
    let requirement = requirement(real_chapter);
    format!("{} {}", requirement.era, requirement.position + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_rows_match_their_index_and_era() {
        for (index, row) in CHAPTER_REQUIREMENTS.iter().enumerate() {
            assert_eq!(row.chapter, index);
            assert_eq!(row.era, Era::from_real_chapter(index));
            assert_eq!(row.position, index % Era::CHAPTERS_PER_ERA);
            assert!(row.requires.iter().all(|&r| r < index));
        }
    }

    #[test]
    fn stage_conversion_is_an_involution() {
        for i in 0..48 {
            assert_eq!(convert_stage_id(convert_stage_id(i)), i);
        }
        assert_eq!(convert_stage_id(0), 45);
        assert_eq!(convert_stage_id(45), 0);
        assert_eq!(convert_stage_id(46), 46);
        assert_eq!(convert_stage_id(47), 47);
    }

    #[test]
    fn labels_number_chapters_within_their_era() {
        assert_eq!(chapter_label(0), "Empire of Cats 1");
        assert_eq!(chapter_label(5), "Into the Future 3");
        assert_eq!(chapter_label(6), "Cats of the Cosmos 1");
    }
}
