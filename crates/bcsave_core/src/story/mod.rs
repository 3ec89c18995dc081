mod fixed;
pub mod passes;
pub mod unlock;

use std::ops::Range;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::stream::{ByteStream, DecodeError};
pub use passes::{BASE_PASSES, ChapterField, ITF_TIMED_SCORE_PASSES, TREASURE_FESTIVAL_PASSES};
pub use unlock::{CHAPTER_REQUIREMENTS, ChapterRequirement, Era, chapter_label, convert_stage_id};

pub const STAGE_COUNT: usize = 51;
pub const PLAYABLE_STAGE_COUNT: usize = 48;
pub const TREASURE_STAGE_COUNT: usize = 49;
pub const CHAPTER_COUNT: usize = 10;
pub const REAL_CHAPTER_COUNT: usize = 9;
pub const SKIPPED_CHAPTER_INDEX: usize = 3;
pub const ITF_TIMED_SCORE_CHAPTERS: Range<usize> = 5..8;

const MAX_PROGRESS: i32 = PLAYABLE_STAGE_COUNT as i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Stage {
    pub clear_times: i32,
    pub treasure: i32,
    pub itf_timed_score: i32,
}

impl Stage {
    pub fn clear(&mut self, increase: bool) {
        if increase {
            self.clear_times = self.clear_times.saturating_add(1);
        } else {
            self.clear_times = self.clear_times.max(1);
        }
    }

    pub fn unclear(&mut self) {
        self.clear_times = 0;
    }

    pub fn is_cleared(&self) -> bool {
        self.clear_times > 0
    }

    pub fn set_treasure(&mut self, treasure: i32) {
        self.treasure = treasure;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Chapter {
    pub selected_stage: i32,
    /// Furthest stage reached, as stored. Edits keep it within `0..=48`.
    pub progress: i32,
    #[serde(with = "fixed")]
    pub stages: [Stage; STAGE_COUNT],
    pub time_until_treasure_chance: i32,
    pub treasure_chance_duration: i32,
    pub treasure_chance_value: i32,
    pub treasure_chance_stage_id: i32,
    pub treasure_festival_type: i32,
}

impl Default for Chapter {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Chapter {
    pub fn new(selected_stage: i32) -> Self {
        Self {
            selected_stage,
            progress: 0,
            stages: [Stage::default(); STAGE_COUNT],
            time_until_treasure_chance: 0,
            treasure_chance_duration: 0,
            treasure_chance_value: 0,
            treasure_chance_stage_id: 0,
            treasure_festival_type: 0,
        }
    }

    /// Clears one stage and moves the progress cursor.
    ///
    /// With `overwrite_progress` the cursor jumps to `stage_id`; otherwise it only
    /// moves forward, to just past the cleared stage.
    pub fn clear_stage(&mut self, stage_id: usize, increase: bool, overwrite_progress: bool) {
        self.stages[stage_id].clear(increase);
        let stage = (stage_id as i32).min(MAX_PROGRESS);
        if overwrite_progress {
            self.progress = stage;
        } else {
            self.progress = self.progress.max((stage + 1).min(MAX_PROGRESS));
        }
    }

    pub fn set_treasure(&mut self, stage_id: usize, treasure: i32) {
        self.stages[stage_id].set_treasure(treasure);
    }

    pub fn is_stage_clear(&self, stage_id: usize) -> bool {
        self.stages[stage_id].is_cleared()
    }

    /// Stages carrying a stored treasure value, including the one extra slot
    /// after the playable range.
    pub fn treasure_stages(&self) -> &[Stage] {
        &self.stages[..TREASURE_STAGE_COUNT]
    }

    pub fn valid_treasure_stages(&self) -> &[Stage] {
        &self.stages[..PLAYABLE_STAGE_COUNT]
    }

    pub fn valid_treasure_stages_mut(&mut self) -> &mut [Stage] {
        &mut self.stages[..PLAYABLE_STAGE_COUNT]
    }

    /// Sets the cursor to `progress` (at most 48), clears every stage before it
    /// and unclears every playable stage after it. Stage `progress` itself is
    /// left as it was.
    pub fn apply_progress(&mut self, progress: usize) {
        let progress = progress.min(PLAYABLE_STAGE_COUNT);
        self.progress = progress as i32;
        for stage in self.stages.iter_mut().take(PLAYABLE_STAGE_COUNT).skip(progress + 1) {
            stage.unclear();
        }
        for stage in &mut self.stages[..progress] {
            stage.clear(false);
        }
    }

    pub fn clear_chapter(&mut self) {
        self.apply_progress(PLAYABLE_STAGE_COUNT);
    }

    pub fn cleared_stage_count(&self) -> usize {
        self.stages[..PLAYABLE_STAGE_COUNT]
            .iter()
            .filter(|s| s.is_cleared())
            .count()
    }

    pub fn read_field(
        &mut self,
        field: ChapterField,
        stream: &mut ByteStream,
    ) -> Result<(), DecodeError> {
        match field {
            ChapterField::SelectedStage => self.selected_stage = stream.read_i32()?,
            ChapterField::Progress => self.progress = stream.read_i32()?,
            ChapterField::ClearTimes => {
                for stage in &mut self.stages {
                    stage.clear_times = stream.read_i32()?;
                }
            }
            ChapterField::Treasure => {
                for stage in &mut self.stages[..TREASURE_STAGE_COUNT] {
                    stage.treasure = stream.read_i32()?;
                }
            }
            ChapterField::TimeUntilTreasureChance => {
                self.time_until_treasure_chance = stream.read_i32()?
            }
            ChapterField::TreasureChanceDuration => {
                self.treasure_chance_duration = stream.read_i32()?
            }
            ChapterField::TreasureChanceValue => self.treasure_chance_value = stream.read_i32()?,
            ChapterField::TreasureChanceStageId => {
                self.treasure_chance_stage_id = stream.read_i32()?
            }
            ChapterField::TreasureFestivalType => {
                self.treasure_festival_type = stream.read_i32()?
            }
            ChapterField::ItfTimedScores => {
                for stage in &mut self.stages {
                    stage.itf_timed_score = stream.read_i32()?;
                }
            }
        }
        Ok(())
    }

    pub fn write_field(&self, field: ChapterField, stream: &mut ByteStream) {
        match field {
            ChapterField::SelectedStage => stream.write_i32(self.selected_stage),
            ChapterField::Progress => stream.write_i32(self.progress),
            ChapterField::ClearTimes => {
                for stage in &self.stages {
                    stream.write_i32(stage.clear_times);
                }
            }
            ChapterField::Treasure => {
                for stage in self.treasure_stages() {
                    stream.write_i32(stage.treasure);
                }
            }
            ChapterField::TimeUntilTreasureChance => {
                stream.write_i32(self.time_until_treasure_chance)
            }
            ChapterField::TreasureChanceDuration => stream.write_i32(self.treasure_chance_duration),
            ChapterField::TreasureChanceValue => stream.write_i32(self.treasure_chance_value),
            ChapterField::TreasureChanceStageId => stream.write_i32(self.treasure_chance_stage_id),
            ChapterField::TreasureFestivalType => stream.write_i32(self.treasure_festival_type),
            ChapterField::ItfTimedScores => {
                for stage in &self.stages {
                    stream.write_i32(stage.itf_timed_score);
                }
            }
        }
    }
}

/// The ten story chapters, in storage order.
///
/// Storage slot 3 is not a playable chapter; "real" chapter indices (0..9)
/// skip it and are what the unlock table and the editing operations use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryChapters {
    chapters: [Chapter; CHAPTER_COUNT],
}

impl Default for StoryChapters {
    fn default() -> Self {
        Self {
            chapters: std::array::from_fn(|_| Chapter::default()),
        }
    }
}

impl StoryChapters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_chapters(chapters: [Chapter; CHAPTER_COUNT]) -> Self {
        Self { chapters }
    }

    pub fn chapters(&self) -> &[Chapter; CHAPTER_COUNT] {
        &self.chapters
    }

    pub fn chapter(&self, index: usize) -> &Chapter {
        &self.chapters[index]
    }

    pub fn chapter_mut(&mut self, index: usize) -> &mut Chapter {
        &mut self.chapters[index]
    }

    pub fn read(stream: &mut ByteStream) -> Result<Self, DecodeError> {
        let mut story = Self::default();
        story.read_passes(stream, BASE_PASSES)?;
        Ok(story)
    }

    pub fn write(&self, stream: &mut ByteStream) {
        self.write_passes(stream, BASE_PASSES);
    }

    pub fn read_treasure_festival(&mut self, stream: &mut ByteStream) -> Result<(), DecodeError> {
        self.read_passes(stream, TREASURE_FESTIVAL_PASSES)
    }

    pub fn write_treasure_festival(&self, stream: &mut ByteStream) {
        self.write_passes(stream, TREASURE_FESTIVAL_PASSES);
    }

    pub fn read_itf_timed_scores(&mut self, stream: &mut ByteStream) -> Result<(), DecodeError> {
        self.read_passes(stream, ITF_TIMED_SCORE_PASSES)
    }

    pub fn write_itf_timed_scores(&self, stream: &mut ByteStream) {
        self.write_passes(stream, ITF_TIMED_SCORE_PASSES);
    }

    /// Decodes `passes` in order. Nothing is committed, and the stream is
    /// rewound, unless every pass decodes.
    pub fn read_passes(
        &mut self,
        stream: &mut ByteStream,
        passes: &[ChapterField],
    ) -> Result<(), DecodeError> {
        let start = stream.position();
        let mut staged = self.clone();
        for &field in passes {
            let pass_start = stream.position();
            let result = field
                .chapters()
                .try_for_each(|index| staged.chapters[index].read_field(field, stream));
            if let Err(e) = result {
                stream.seek_to(start)?;
                return Err(e);
            }
            debug!(
                field = field.as_str(),
                start = pass_start,
                end = stream.position(),
                "decoded chapter field pass"
            );
        }
        *self = staged;
        Ok(())
    }

    pub fn write_passes(&self, stream: &mut ByteStream, passes: &[ChapterField]) {
        for &field in passes {
            for index in field.chapters() {
                self.chapters[index].write_field(field, stream);
            }
        }
    }

    pub fn real_chapters(&self) -> Vec<&Chapter> {
        self.chapters
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != SKIPPED_CHAPTER_INDEX)
            .map(|(_, chapter)| chapter)
            .collect()
    }

    pub fn real_chapters_mut(&mut self) -> Vec<&mut Chapter> {
        self.chapters
            .iter_mut()
            .enumerate()
            .filter(|(i, _)| *i != SKIPPED_CHAPTER_INDEX)
            .map(|(_, chapter)| chapter)
            .collect()
    }

    pub fn storage_index(real_chapter: usize) -> usize {
        if real_chapter >= SKIPPED_CHAPTER_INDEX {
            real_chapter + 1
        } else {
            real_chapter
        }
    }

    pub fn real_chapter(&self, real_chapter: usize) -> &Chapter {
        &self.chapters[Self::storage_index(real_chapter)]
    }

    pub fn real_chapter_mut(&mut self, real_chapter: usize) -> &mut Chapter {
        &mut self.chapters[Self::storage_index(real_chapter)]
    }

    /// `chapter` is a storage index here, as in the save file.
    pub fn clear_stage(
        &mut self,
        chapter: usize,
        stage: usize,
        increase: bool,
        overwrite_progress: bool,
    ) {
        self.chapters[chapter].clear_stage(stage, increase, overwrite_progress);
    }

    pub fn set_treasure(&mut self, chapter: usize, stage: usize, treasure: i32) {
        self.chapters[chapter].set_treasure(stage, treasure);
    }

    pub fn is_stage_clear(&self, chapter: usize, stage: usize) -> bool {
        self.chapters[chapter].is_stage_clear(stage)
    }

    /// Fully clears every chapter `real_chapter` depends on. The chapter itself
    /// is not touched.
    pub fn clear_previous_chapters(&mut self, real_chapter: usize) {
        for &required in unlock::requirement(real_chapter).requires {
            self.real_chapter_mut(required).clear_chapter();
        }
    }
}

impl Serialize for StoryChapters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        fixed::serialize(&self.chapters, serializer)
    }
}

impl<'de> Deserialize<'de> for StoryChapters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self {
            chapters: fixed::deserialize(deserializer)?,
        })
    }
}
