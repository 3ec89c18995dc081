use serde::{Deserialize, Serialize};

use crate::stream::{ByteStream, DecodeError};

const I32_WIDTH: usize = 4;
// selected_stage, clear_progress, chapter_unlock_state
const SCALARS_PER_CHAPTER: usize = 3;
// (groups, stars), (groups, stages, stars), (groups, stars) after the first header
const REPEATED_HEADER_INTS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventStage {
    pub clear_times: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventChapter {
    pub selected_stage: i32,
    pub clear_progress: i32,
    pub stages: Vec<EventStage>,
    pub chapter_unlock_state: i32,
}

impl EventChapter {
    pub fn new(selected_stage: i32) -> Self {
        Self {
            selected_stage,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventChapterGroup {
    pub stars: Vec<EventChapter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawEventChapters")]
pub struct EventChapters {
    groups: Vec<EventChapterGroup>,
}

#[derive(Deserialize)]
struct RawEventChapters {
    #[serde(default)]
    groups: Vec<EventChapterGroup>,
}

impl TryFrom<RawEventChapters> for EventChapters {
    type Error = String;

    fn try_from(raw: RawEventChapters) -> Result<Self, Self::Error> {
        Self::new(raw.groups)
    }
}

impl EventChapters {
    /// Every group must have the same number of stars and every chapter the
    /// same number of stages, since the file stores a single size for each.
    pub fn new(groups: Vec<EventChapterGroup>) -> Result<Self, String> {
        let star_count = groups.first().map_or(0, |g| g.stars.len());
        let stage_count = groups
            .first()
            .and_then(|g| g.stars.first())
            .map_or(0, |c| c.stages.len());

        for (gi, group) in groups.iter().enumerate() {
            if group.stars.len() != star_count {
                return Err(format!(
                    "group {gi} has {} stars, expected {star_count}",
                    group.stars.len()
                ));
            }
            for (si, chapter) in group.stars.iter().enumerate() {
                if chapter.stages.len() != stage_count {
                    return Err(format!(
                        "group {gi} star {si} has {} stages, expected {stage_count}",
                        chapter.stages.len()
                    ));
                }
            }
        }

        Ok(Self { groups })
    }

    pub fn groups(&self) -> &[EventChapterGroup] {
        &self.groups
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn star_count(&self) -> usize {
        self.groups.first().map_or(0, |g| g.stars.len())
    }

    pub fn stage_count(&self) -> usize {
        self.groups
            .first()
            .and_then(|g| g.stars.first())
            .map_or(0, |c| c.stages.len())
    }

    pub fn chapter(&self, group: usize, star: usize) -> Option<&EventChapter> {
        self.groups.get(group)?.stars.get(star)
    }

    pub fn chapter_mut(&mut self, group: usize, star: usize) -> Option<&mut EventChapter> {
        self.groups.get_mut(group)?.stars.get_mut(star)
    }

    /// Clears a stage in place; the grid shape never changes.
    pub fn clear_stage(&mut self, group: usize, star: usize, stage: usize) -> bool {
        let Some(chapter) = self.chapter_mut(group, star) else {
            return false;
        };
        let Some(slot) = chapter.stages.get_mut(stage) else {
            return false;
        };
        slot.clear_times = slot.clear_times.max(1);
        chapter.clear_progress = chapter.clear_progress.max(stage as i32 + 1);
        true
    }

    pub fn read(stream: &mut ByteStream, read_every_time: bool) -> Result<Self, DecodeError> {
        let start = stream.position();
        let group_count = stream.read_count("groups")?;
        let mut stage_count = 0;
        if !read_every_time {
            stage_count = stream.read_count("stages")?;
        }
        let star_count = stream.read_count("stars")?;

        if group_count > 0 && star_count == 0 {
            return Err(DecodeError::EmptyGroups {
                groups: group_count,
                position: start,
            });
        }
        let (per_chapter, headers) = if read_every_time {
            (SCALARS_PER_CHAPTER, REPEATED_HEADER_INTS)
        } else {
            (SCALARS_PER_CHAPTER.saturating_add(stage_count), 0)
        };
        ensure_grid_fits(stream, start, group_count, star_count, per_chapter, headers)?;

        let mut groups = Vec::new();
        for _ in 0..group_count {
            let mut stars = Vec::new();
            for _ in 0..star_count {
                stars.push(EventChapter::new(stream.read_i32()?));
            }
            groups.push(EventChapterGroup { stars });
        }
        let mut grid = Self { groups };

        if read_every_time {
            expect_count(stream, "groups", group_count)?;
            expect_count(stream, "stars", star_count)?;
        }
        for chapter in grid.chapters_mut() {
            chapter.clear_progress = stream.read_i32()?;
        }

        if read_every_time {
            let header = stream.position();
            expect_count(stream, "groups", group_count)?;
            stage_count = stream.read_count("stages")?;
            expect_count(stream, "stars", star_count)?;
            // stages, then the final (groups, stars) header and unlock states
            ensure_grid_fits(
                stream,
                header,
                group_count,
                star_count,
                stage_count.saturating_add(1),
                2,
            )?;
        }
        for chapter in grid.chapters_mut() {
            chapter.stages = stream
                .read_i32_vec(stage_count)?
                .into_iter()
                .map(|clear_times| EventStage { clear_times })
                .collect();
        }

        if read_every_time {
            expect_count(stream, "groups", group_count)?;
            expect_count(stream, "stars", star_count)?;
        }
        for chapter in grid.chapters_mut() {
            chapter.chapter_unlock_state = stream.read_i32()?;
        }

        Ok(grid)
    }

    pub fn write(&self, stream: &mut ByteStream, write_every_time: bool) {
        let groups = self.group_count() as i32;
        let stars = self.star_count() as i32;
        let stages = self.stage_count() as i32;

        stream.write_i32(groups);
        if !write_every_time {
            stream.write_i32(stages);
        }
        stream.write_i32(stars);
        for chapter in self.chapters() {
            stream.write_i32(chapter.selected_stage);
        }

        if write_every_time {
            stream.write_i32(groups);
            stream.write_i32(stars);
        }
        for chapter in self.chapters() {
            stream.write_i32(chapter.clear_progress);
        }

        if write_every_time {
            stream.write_i32(groups);
            stream.write_i32(stages);
            stream.write_i32(stars);
        }
        for chapter in self.chapters() {
            for stage in &chapter.stages {
                stream.write_i32(stage.clear_times);
            }
        }

        if write_every_time {
            stream.write_i32(groups);
            stream.write_i32(stars);
        }
        for chapter in self.chapters() {
            stream.write_i32(chapter.chapter_unlock_state);
        }
    }

    fn chapters(&self) -> impl Iterator<Item = &EventChapter> {
        self.groups.iter().flat_map(|g| g.stars.iter())
    }

    fn chapters_mut(&mut self) -> impl Iterator<Item = &mut EventChapter> {
        self.groups.iter_mut().flat_map(|g| g.stars.iter_mut())
    }
}

fn expect_count(
    stream: &mut ByteStream,
    field: &'static str,
    expected: usize,
) -> Result<(), DecodeError> {
    let position = stream.position();
    let found = stream.read_count(field)?;
    if found != expected {
        return Err(DecodeError::CountMismatch {
            field,
            expected,
            found,
            position,
        });
    }
    Ok(())
}

// Every chapter needs `ints_per_chapter` more values, plus `header_ints` header
// values, before the grid is allocated.
fn ensure_grid_fits(
    stream: &ByteStream,
    position: usize,
    groups: usize,
    stars: usize,
    ints_per_chapter: usize,
    header_ints: usize,
) -> Result<(), DecodeError> {
    let needed = groups
        .checked_mul(stars)
        .and_then(|chapters| chapters.checked_mul(ints_per_chapter))
        .and_then(|ints| ints.checked_add(header_ints))
        .and_then(|ints| ints.checked_mul(I32_WIDTH))
        .unwrap_or(usize::MAX);
    if needed > stream.remaining() {
        return Err(DecodeError::GridTooLarge {
            groups,
            stars,
            needed,
            remaining: stream.remaining(),
            position,
        });
    }
    Ok(())
}
