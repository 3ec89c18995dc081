use serde::{Deserialize, Serialize};

use crate::document::StoryFormat;
use crate::story::{Era, StoryChapters};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorySnapshot {
    pub format: StoryFormat,
    pub file_len: usize,
    pub tail_len: usize,
    pub chapters_cleared: usize,
    pub stages_cleared: usize,
    pub treasures_set: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChapterSummary {
    pub real_chapter: usize,
    pub storage_index: usize,
    pub label: String,
    pub era: Era,
    pub selected_stage: i32,
    pub progress: i32,
    pub cleared_stages: usize,
    pub treasures_set: usize,
    pub treasure_festival_type: i32,
}

/// One stage as the game lists it; `ui_index` is the 0-based display position
/// and `stage` the storage slot it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageEntry {
    pub ui_index: usize,
    pub stage: usize,
    pub clear_times: i32,
    pub treasure: i32,
    pub itf_timed_score: i32,
}

/// The structured interchange form of a story block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoryExport {
    pub format: StoryFormat,
    pub chapters: StoryChapters,
}
