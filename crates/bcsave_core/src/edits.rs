use tracing::debug;

use crate::story::{STAGE_COUNT, StoryChapters, convert_stage_id};
use crate::treasure::{TreasureGroups, TreasureLevel};

/// Sets one chapter's progress and, for a non-zero progress, fully clears the
/// chapters it depends on. Returns whether any stage was cleared.
pub fn edit_chapter_progress(story: &mut StoryChapters, real_chapter: usize, progress: usize) -> bool {
    story.real_chapter_mut(real_chapter).apply_progress(progress);
    let cleared = progress != 0;
    if cleared {
        story.clear_previous_chapters(real_chapter);
    }
    debug!(real_chapter, progress, "edited chapter progress");
    cleared
}

/// Applies one progress value to every listed chapter, prerequisites first.
pub fn clear_chapters(story: &mut StoryChapters, real_chapters: &[usize], progress: usize) {
    for &real_chapter in real_chapters {
        if progress != 0 {
            story.clear_previous_chapters(real_chapter);
        }
        story.real_chapter_mut(real_chapter).apply_progress(progress);
    }
    debug!(chapters = real_chapters.len(), progress, "cleared chapters");
}

/// Overwrites a stage's clear counter. `stage` is a storage index.
pub fn set_stage_clear_count(
    story: &mut StoryChapters,
    real_chapter: usize,
    stage: usize,
    count: i32,
) {
    story.real_chapter_mut(real_chapter).stages[stage].clear_times = count;
}

pub fn apply_treasure_to_chapters(
    story: &mut StoryChapters,
    real_chapters: &[usize],
    level: TreasureLevel,
) {
    for &real_chapter in real_chapters {
        for stage in story.real_chapter_mut(real_chapter).valid_treasure_stages_mut() {
            stage.set_treasure(level.raw());
        }
    }
}

/// `ui_stages` are 0-based positions as the game lists them; each is mapped to
/// its storage slot with [`convert_stage_id`].
pub fn apply_treasure_to_stages(
    story: &mut StoryChapters,
    real_chapters: &[usize],
    ui_stages: &[usize],
    level: TreasureLevel,
) {
    for &real_chapter in real_chapters {
        let chapter = story.real_chapter_mut(real_chapter);
        for &ui_stage in ui_stages {
            chapter.set_treasure(convert_stage_id(ui_stage), level.raw());
        }
    }
}

/// Sets `level` on every stage of the selected groups. Stage ids outside the
/// chapter are skipped. Returns the number of stages written.
pub fn apply_treasure_groups(
    story: &mut StoryChapters,
    real_chapter: usize,
    groups: &TreasureGroups,
    group_ids: &[usize],
    level: TreasureLevel,
) -> usize {
    let chapter = story.real_chapter_mut(real_chapter);
    let mut written = 0;
    for group in group_ids.iter().filter_map(|&id| groups.group(id)) {
        for &stage_id in group.iter().filter(|&&id| id < STAGE_COUNT) {
            chapter.set_treasure(stage_id, level.raw());
            written += 1;
        }
    }
    written
}

pub fn clear_tutorial(story: &mut StoryChapters) {
    story.clear_stage(0, 0, false, false);
}
