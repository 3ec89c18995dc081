use tracing::warn;

use crate::document::{StoryDocument, StoryFormat};
use crate::edits;
use crate::story::{
    self, PLAYABLE_STAGE_COUNT, REAL_CHAPTER_COUNT, STAGE_COUNT, StoryChapters, chapter_label,
    convert_stage_id,
};
use crate::treasure::{TreasureGroups, TreasureLevel};

use super::error::{CoreError, CoreErrorCode};
use super::types::{ChapterSummary, StageEntry, StoryExport, StorySnapshot};

const MAX_PROGRESS: usize = PLAYABLE_STAGE_COUNT;

#[derive(Debug, Default, Clone, Copy)]
pub struct Engine;

#[derive(Debug)]
pub struct Session {
    document: StoryDocument,
}

impl Engine {
    pub fn new() -> Self {
        Self
    }

    pub fn open_bytes<B: AsRef<[u8]>>(
        &self,
        bytes: B,
        hint: Option<StoryFormat>,
    ) -> Result<Session, CoreError> {
        let bytes = bytes.as_ref();

        let format = match hint {
            Some(format) => format,
            None => StoryFormat::detect(bytes.len()).ok_or_else(|| {
                let expected: Vec<String> = StoryFormat::ALL
                    .iter()
                    .map(|f| f.encoded_len().to_string())
                    .collect();
                CoreError::new(
                    CoreErrorCode::FormatDetection,
                    format!(
                        "input is {} bytes, which matches no story layout (expected one of {}); supply a format",
                        bytes.len(),
                        expected.join(", ")
                    ),
                )
            })?,
        };

        StoryDocument::parse_with_layout(bytes, format)
            .map(|document| Session { document })
            .map_err(|e| {
                CoreError::new(
                    CoreErrorCode::Decode,
                    format!("failed to parse as {}: {e}", format.describe()),
                )
            })
    }
}

impl Session {
    pub fn format(&self) -> StoryFormat {
        self.document.format()
    }

    pub fn story(&self) -> &StoryChapters {
        &self.document.story
    }

    pub fn snapshot(&self) -> StorySnapshot {
        let story = &self.document.story;
        let real = story.real_chapters();
        StorySnapshot {
            format: self.format(),
            file_len: self.document.layout().file_len,
            tail_len: self.document.tail().len(),
            chapters_cleared: real
                .iter()
                .filter(|c| c.cleared_stage_count() == PLAYABLE_STAGE_COUNT)
                .count(),
            stages_cleared: real.iter().map(|c| c.cleared_stage_count()).sum(),
            treasures_set: real.iter().map(|c| treasures_set(c)).sum(),
        }
    }

    pub fn chapter_summaries(&self) -> Vec<ChapterSummary> {
        (0..REAL_CHAPTER_COUNT)
            .map(|real_chapter| self.summarize(real_chapter))
            .collect()
    }

    pub fn chapter_summary(&self, real_chapter: usize) -> Result<ChapterSummary, CoreError> {
        check_chapter(real_chapter)?;
        Ok(self.summarize(real_chapter))
    }

    /// Playable stages of a chapter in display order.
    pub fn chapter_stages(&self, real_chapter: usize) -> Result<Vec<StageEntry>, CoreError> {
        check_chapter(real_chapter)?;
        let chapter = self.document.story.real_chapter(real_chapter);
        Ok((0..PLAYABLE_STAGE_COUNT)
            .map(|ui_index| {
                let stage = convert_stage_id(ui_index);
                let data = &chapter.stages[stage];
                StageEntry {
                    ui_index,
                    stage,
                    clear_times: data.clear_times,
                    treasure: data.treasure,
                    itf_timed_score: data.itf_timed_score,
                }
            })
            .collect())
    }

    pub fn to_bytes_unmodified(&self) -> Vec<u8> {
        self.document.to_bytes_unmodified()
    }

    pub fn to_bytes_modified(&self) -> Result<Vec<u8>, CoreError> {
        self.document.to_bytes_modified().map_err(|e| {
            CoreError::new(
                CoreErrorCode::Io,
                format!("failed to emit modified bytes: {e}"),
            )
        })
    }

    pub fn edit_chapter_progress(
        &mut self,
        real_chapter: usize,
        progress: usize,
    ) -> Result<bool, CoreError> {
        check_chapter(real_chapter)?;
        check_progress(progress)?;
        Ok(edits::edit_chapter_progress(
            &mut self.document.story,
            real_chapter,
            progress,
        ))
    }

    pub fn clear_chapters(
        &mut self,
        real_chapters: &[usize],
        progress: usize,
    ) -> Result<(), CoreError> {
        check_chapters(real_chapters)?;
        check_progress(progress)?;
        edits::clear_chapters(&mut self.document.story, real_chapters, progress);
        Ok(())
    }

    pub fn set_stage_clear_count(
        &mut self,
        real_chapter: usize,
        stage: usize,
        count: i32,
    ) -> Result<(), CoreError> {
        check_chapter(real_chapter)?;
        if stage >= STAGE_COUNT {
            return Err(CoreError::new(
                CoreErrorCode::InvalidInput,
                format!("invalid stage {stage}, expected 0-{}", STAGE_COUNT - 1),
            ));
        }
        if count < 0 {
            return Err(CoreError::new(
                CoreErrorCode::InvalidInput,
                format!("invalid clear count {count}, expected a non-negative value"),
            ));
        }
        edits::set_stage_clear_count(&mut self.document.story, real_chapter, stage, count);
        Ok(())
    }

    pub fn apply_treasure_to_chapters(
        &mut self,
        real_chapters: &[usize],
        level: TreasureLevel,
    ) -> Result<(), CoreError> {
        check_chapters(real_chapters)?;
        check_treasure(level)?;
        edits::apply_treasure_to_chapters(&mut self.document.story, real_chapters, level);
        Ok(())
    }

    pub fn apply_treasure_to_stages(
        &mut self,
        real_chapters: &[usize],
        ui_stages: &[usize],
        level: TreasureLevel,
    ) -> Result<(), CoreError> {
        check_chapters(real_chapters)?;
        check_treasure(level)?;
        if let Some(&stage) = ui_stages.iter().find(|&&s| s >= PLAYABLE_STAGE_COUNT) {
            return Err(CoreError::new(
                CoreErrorCode::InvalidInput,
                format!(
                    "invalid stage {}, expected 1-{PLAYABLE_STAGE_COUNT}",
                    stage + 1
                ),
            ));
        }
        edits::apply_treasure_to_stages(&mut self.document.story, real_chapters, ui_stages, level);
        Ok(())
    }

    pub fn apply_treasure_groups(
        &mut self,
        real_chapter: usize,
        groups: &TreasureGroups,
        group_ids: &[usize],
        level: TreasureLevel,
    ) -> Result<usize, CoreError> {
        check_chapter(real_chapter)?;
        check_treasure(level)?;
        if let Some(&id) = group_ids.iter().find(|&&id| id >= groups.len()) {
            return Err(CoreError::new(
                CoreErrorCode::InvalidInput,
                format!(
                    "invalid treasure group {id}, table has {} groups",
                    groups.len()
                ),
            ));
        }
        Ok(edits::apply_treasure_groups(
            &mut self.document.story,
            real_chapter,
            groups,
            group_ids,
            level,
        ))
    }

    pub fn clear_tutorial(&mut self) {
        edits::clear_tutorial(&mut self.document.story);
    }

    pub fn to_export(&self) -> StoryExport {
        StoryExport {
            format: self.format(),
            chapters: self.document.story.clone(),
        }
    }

    pub fn to_json(&self) -> Result<serde_json::Value, CoreError> {
        serde_json::to_value(self.to_export()).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Json,
                format!("failed to serialize story: {e}"),
            )
        })
    }

    /// Replaces every chapter with the imported ones. The binary layout stays the
    /// one this session was opened with.
    pub fn replace_from_json(&mut self, value: serde_json::Value) -> Result<(), CoreError> {
        let export: StoryExport = serde_json::from_value(value).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Json,
                format!("failed to read story JSON: {e}"),
            )
        })?;
        if export.format != self.format() {
            warn!(
                imported = %export.format.describe(),
                current = %self.format().describe(),
                "imported story was exported from a different layout; extra fields are ignored on write"
            );
        }
        self.document.story = export.chapters;
        Ok(())
    }

    fn summarize(&self, real_chapter: usize) -> ChapterSummary {
        let chapter = self.document.story.real_chapter(real_chapter);
        ChapterSummary {
            real_chapter,
            storage_index: StoryChapters::storage_index(real_chapter),
            label: chapter_label(real_chapter),
            era: story::Era::from_real_chapter(real_chapter),
            selected_stage: chapter.selected_stage,
            progress: chapter.progress,
            cleared_stages: chapter.cleared_stage_count(),
            treasures_set: treasures_set(chapter),
            treasure_festival_type: chapter.treasure_festival_type,
        }
    }
}

fn treasures_set(chapter: &story::Chapter) -> usize {
    chapter
        .valid_treasure_stages()
        .iter()
        .filter(|s| s.treasure != 0)
        .count()
}

fn check_chapter(real_chapter: usize) -> Result<(), CoreError> {
    if real_chapter >= REAL_CHAPTER_COUNT {
        return Err(CoreError::new(
            CoreErrorCode::InvalidInput,
            format!(
                "invalid chapter {real_chapter}, expected 0-{}",
                REAL_CHAPTER_COUNT - 1
            ),
        ));
    }
    Ok(())
}

fn check_chapters(real_chapters: &[usize]) -> Result<(), CoreError> {
    real_chapters.iter().try_for_each(|&c| check_chapter(c))
}

fn check_progress(progress: usize) -> Result<(), CoreError> {
    if progress > MAX_PROGRESS {
        return Err(CoreError::new(
            CoreErrorCode::InvalidInput,
            format!("invalid progress {progress}, expected 0-{MAX_PROGRESS}"),
        ));
    }
    Ok(())
}

fn check_treasure(level: TreasureLevel) -> Result<(), CoreError> {
    if level.raw() < 0 {
        return Err(CoreError::new(
            CoreErrorCode::InvalidInput,
            format!("invalid treasure level {}, expected 0 or more", level.raw()),
        ));
    }
    Ok(())
}
