use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::{CHAPTER_COUNT, ITF_TIMED_SCORE_CHAPTERS, STAGE_COUNT, TREASURE_STAGE_COUNT};

const I32_WIDTH: usize = 4;

/// One per-chapter field of the story block.
///
/// The block is stored column-major: a pass writes one field for every chapter
/// it covers before the next field starts. The pass lists below are the on-disk
/// order for each section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChapterField {
    SelectedStage,
    Progress,
    ClearTimes,
    Treasure,
    TimeUntilTreasureChance,
    TreasureChanceDuration,
    TreasureChanceValue,
    TreasureChanceStageId,
    TreasureFestivalType,
    ItfTimedScores,
}

pub const BASE_PASSES: &[ChapterField] = &[
    ChapterField::SelectedStage,
    ChapterField::Progress,
    ChapterField::ClearTimes,
    ChapterField::Treasure,
];

pub const TREASURE_FESTIVAL_PASSES: &[ChapterField] = &[
    ChapterField::TimeUntilTreasureChance,
    ChapterField::TreasureChanceDuration,
    ChapterField::TreasureChanceValue,
    ChapterField::TreasureChanceStageId,
    ChapterField::TreasureFestivalType,
];

pub const ITF_TIMED_SCORE_PASSES: &[ChapterField] = &[ChapterField::ItfTimedScores];

impl ChapterField {
    /// Storage indices of the chapters this field is stored for.
    pub fn chapters(&self) -> Range<usize> {
        match self {
            Self::ItfTimedScores => ITF_TIMED_SCORE_CHAPTERS,
            _ => 0..CHAPTER_COUNT,
        }
    }

    pub fn values_per_chapter(&self) -> usize {
        match self {
            Self::ClearTimes | Self::ItfTimedScores => STAGE_COUNT,
            Self::Treasure => TREASURE_STAGE_COUNT,
            _ => 1,
        }
    }

    pub fn encoded_len(&self) -> usize {
        self.chapters().len() * self.values_per_chapter() * I32_WIDTH
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SelectedStage => "selected_stage",
            Self::Progress => "progress",
            Self::ClearTimes => "clear_times",
            Self::Treasure => "treasure",
            Self::TimeUntilTreasureChance => "time_until_treasure_chance",
            Self::TreasureChanceDuration => "treasure_chance_duration",
            Self::TreasureChanceValue => "treasure_chance_value",
            Self::TreasureChanceStageId => "treasure_chance_stage_id",
            Self::TreasureFestivalType => "treasure_festival_type",
            Self::ItfTimedScores => "itf_timed_scores",
        }
    }
}

pub fn encoded_len(passes: &[ChapterField]) -> usize {
    passes.iter().map(ChapterField::encoded_len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_lengths_match_layout() {
        assert_eq!(encoded_len(BASE_PASSES), 4080);
        assert_eq!(encoded_len(TREASURE_FESTIVAL_PASSES), 200);
        assert_eq!(encoded_len(ITF_TIMED_SCORE_PASSES), 612);
    }

    #[test]
    fn only_timed_scores_are_chapter_restricted() {
        assert_eq!(ChapterField::ItfTimedScores.chapters(), 5..8);
        assert_eq!(ChapterField::Treasure.chapters(), 0..10);
    }
}
