use bcsave_core::edits::{
    apply_treasure_groups, apply_treasure_to_chapters, apply_treasure_to_stages, clear_chapters,
    edit_chapter_progress, set_stage_clear_count,
};
use bcsave_core::story::{Chapter, PLAYABLE_STAGE_COUNT, StoryChapters};
use bcsave_core::treasure::{TreasureGroups, TreasureLevel};

#[test]
fn editing_progress_clears_prerequisites() {
    let mut story = StoryChapters::new();
    assert!(edit_chapter_progress(&mut story, 5, 12));

    assert_eq!(story.real_chapter(5).progress, 12);
    assert_eq!(story.real_chapter(5).cleared_stage_count(), 12);
    for real in [0, 3, 4] {
        assert_eq!(story.real_chapter(real).progress, 48, "real chapter {real}");
    }
    for real in [1, 2, 6, 7, 8] {
        assert_eq!(story.real_chapter(real), &Chapter::default(), "real chapter {real}");
    }
}

#[test]
fn clearing_several_chapters_applies_one_progress() {
    let mut story = StoryChapters::new();
    clear_chapters(&mut story, &[2, 8], 30);

    assert_eq!(story.real_chapter(2).progress, 30);
    assert_eq!(story.real_chapter(8).progress, 30);
    for real in [0, 1, 3, 6, 7] {
        assert_eq!(story.real_chapter(real).progress, 48, "real chapter {real}");
    }
    assert_eq!(story.real_chapter(4).progress, 0);
    assert_eq!(story.real_chapter(5).progress, 0);
}

#[test]
fn zero_progress_resets_without_touching_other_chapters() {
    let mut story = StoryChapters::new();
    story.real_chapter_mut(7).clear_chapter();
    clear_chapters(&mut story, &[7], 0);

    assert_eq!(story.real_chapter(7).progress, 0);
    assert_eq!(story.real_chapter(7).cleared_stage_count(), 1);
    assert_eq!(story.real_chapter(0), &Chapter::default());
}

#[test]
fn later_selection_fully_clears_an_earlier_prerequisite() {
    let mut story = StoryChapters::new();
    clear_chapters(&mut story, &[0, 1], 10);

    assert_eq!(story.real_chapter(0).progress, 48);
    assert_eq!(story.real_chapter(1).progress, 10);
}

#[test]
fn stage_clear_count_is_overwritten() {
    let mut story = StoryChapters::new();
    set_stage_clear_count(&mut story, 3, 50, 7);
    assert_eq!(story.chapter(4).stages[50].clear_times, 7);
    set_stage_clear_count(&mut story, 3, 50, 0);
    assert!(!story.chapter(4).is_stage_clear(50));
}

#[test]
fn chapter_treasure_covers_the_playable_range_only() {
    let mut story = StoryChapters::new();
    apply_treasure_to_chapters(&mut story, &[0, 6], TreasureLevel::Superior);

    for real in [0, 6] {
        let chapter = story.real_chapter(real);
        assert!(chapter.valid_treasure_stages().iter().all(|s| s.treasure == 3));
        assert_eq!(chapter.stages[PLAYABLE_STAGE_COUNT].treasure, 0);
    }
    assert!(story.real_chapter(1).stages.iter().all(|s| s.treasure == 0));
}

#[test]
fn stage_treasure_converts_display_positions() {
    let mut story = StoryChapters::new();
    apply_treasure_to_stages(&mut story, &[1], &[0, 45, 47], TreasureLevel::Custom(9));

    let chapter = story.real_chapter(1);
    assert_eq!(chapter.stages[45].treasure, 9);
    assert_eq!(chapter.stages[0].treasure, 9);
    assert_eq!(chapter.stages[47].treasure, 9);
    assert_eq!(
        chapter.stages.iter().filter(|s| s.treasure != 0).count(),
        3
    );
}

#[test]
fn treasure_groups_set_every_listed_stage() {
    let mut story = StoryChapters::new();
    let groups = TreasureGroups::new(vec![vec![0, 1, 2], vec![10, 11], vec![20]]);
    let written = apply_treasure_groups(&mut story, 4, &groups, &[0, 2], TreasureLevel::Inferior);

    assert_eq!(written, 4);
    let chapter = story.real_chapter(4);
    for stage in [0, 1, 2, 20] {
        assert_eq!(chapter.stages[stage].treasure, 1, "stage {stage}");
    }
    assert_eq!(chapter.stages[10].treasure, 0);
}
