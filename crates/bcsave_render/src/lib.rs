use std::fmt::Write as _;

use bcsave_core::core_api::{ChapterSummary, CoreError, Session, StageEntry};
use bcsave_core::story::{ITF_TIMED_SCORE_CHAPTERS, StoryChapters};
use bcsave_core::treasure::TreasureLevel;
use serde_json::{Map as JsonMap, Value as JsonValue};

const LABEL_WIDTH: usize = 22;
const RULE_WIDTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonStyle {
    #[default]
    CanonicalV1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextStyle {
    #[default]
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextRenderOptions {
    /// List uncleared stages in chapter detail too.
    pub verbose: bool,
}

pub fn render_json_full(session: &Session, style: JsonStyle) -> JsonValue {
    match style {
        JsonStyle::CanonicalV1 => JsonValue::Object(default_json(session)),
    }
}

pub fn render_chapter_json(
    session: &Session,
    real_chapter: usize,
    style: JsonStyle,
) -> Result<JsonValue, CoreError> {
    let summary = session.chapter_summary(real_chapter)?;
    let stages = session.chapter_stages(real_chapter)?;
    let with_scores = has_timed_scores(session, real_chapter);
    match style {
        JsonStyle::CanonicalV1 => {
            let mut out = summary_to_json(&summary);
            out.insert(
                "stages".to_string(),
                JsonValue::Array(
                    stages
                        .iter()
                        .map(|s| stage_to_json(s, with_scores))
                        .collect(),
                ),
            );
            Ok(JsonValue::Object(out))
        }
    }
}

pub fn render_text(session: &Session, style: TextStyle) -> String {
    render_text_with_options(session, style, TextRenderOptions::default())
}

pub fn render_text_with_options(
    session: &Session,
    style: TextStyle,
    options: TextRenderOptions,
) -> String {
    match style {
        TextStyle::Summary => render_summary_impl(session, options),
    }
}

pub fn render_chapter_text(
    session: &Session,
    real_chapter: usize,
    options: TextRenderOptions,
) -> Result<String, CoreError> {
    let summary = session.chapter_summary(real_chapter)?;
    let stages = session.chapter_stages(real_chapter)?;
    let with_scores = has_timed_scores(session, real_chapter);

    let mut out = String::new();
    writeln!(&mut out, "{}", summary.label).expect("writing to String cannot fail");
    writeln!(&mut out, "{}", "=".repeat(RULE_WIDTH)).expect("writing to String cannot fail");
    write_field(&mut out, "Selected stage", summary.selected_stage);
    write_field(&mut out, "Progress", format!("{}/48", summary.progress));
    write_field(&mut out, "Cleared stages", summary.cleared_stages);
    write_field(&mut out, "Treasures set", summary.treasures_set);
    writeln!(&mut out).expect("writing to String cannot fail");

    let mut header = format!(" {:>5}  {:>4}  {:>7}  {:<12}", "Stage", "Slot", "Clears", "Treasure");
    if with_scores {
        header.push_str("  Timed score");
    }
    writeln!(&mut out, "{}", header.trim_end()).expect("writing to String cannot fail");

    for stage in stages
        .iter()
        .filter(|s| options.verbose || s.clear_times > 0 || s.treasure != 0)
    {
        let mut line = format!(
            " {:>5}  {:>4}  {:>7}  {:<12}",
            stage.ui_index + 1,
            stage.stage,
            stage.clear_times,
            TreasureLevel::from_raw(stage.treasure).to_string(),
        );
        if with_scores {
            line.push_str(&format!("  {}", stage.itf_timed_score));
        }
        writeln!(&mut out, "{}", line.trim_end()).expect("writing to String cannot fail");
    }

    Ok(out)
}

fn default_json(session: &Session) -> JsonMap<String, JsonValue> {
    let snapshot = session.snapshot();
    let mut out = JsonMap::new();

    let mut format = JsonMap::new();
    format.insert(
        "treasure_festival".to_string(),
        JsonValue::Bool(snapshot.format.treasure_festival),
    );
    format.insert(
        "itf_timed_scores".to_string(),
        JsonValue::Bool(snapshot.format.itf_timed_scores),
    );
    out.insert("format".to_string(), JsonValue::Object(format));
    out.insert("file_len".to_string(), JsonValue::from(snapshot.file_len));
    out.insert("tail_len".to_string(), JsonValue::from(snapshot.tail_len));
    out.insert(
        "chapters_cleared".to_string(),
        JsonValue::from(snapshot.chapters_cleared),
    );
    out.insert(
        "stages_cleared".to_string(),
        JsonValue::from(snapshot.stages_cleared),
    );
    out.insert(
        "treasures_set".to_string(),
        JsonValue::from(snapshot.treasures_set),
    );
    out.insert(
        "chapters".to_string(),
        JsonValue::Array(
            session
                .chapter_summaries()
                .iter()
                .map(|c| JsonValue::Object(summary_to_json(c)))
                .collect(),
        ),
    );

    out
}

fn summary_to_json(summary: &ChapterSummary) -> JsonMap<String, JsonValue> {
    let mut m = JsonMap::new();
    m.insert("chapter".to_string(), JsonValue::from(summary.real_chapter));
    m.insert("label".to_string(), JsonValue::String(summary.label.clone()));
    m.insert(
        "era".to_string(),
        JsonValue::String(summary.era.to_string()),
    );
    m.insert(
        "selected_stage".to_string(),
        JsonValue::from(summary.selected_stage),
    );
    m.insert("progress".to_string(), JsonValue::from(summary.progress));
    m.insert(
        "cleared_stages".to_string(),
        JsonValue::from(summary.cleared_stages),
    );
    m.insert(
        "treasures_set".to_string(),
        JsonValue::from(summary.treasures_set),
    );
    m.insert(
        "treasure_festival_type".to_string(),
        JsonValue::from(summary.treasure_festival_type),
    );
    m
}

fn stage_to_json(stage: &StageEntry, with_scores: bool) -> JsonValue {
    let mut m = JsonMap::new();
    m.insert("stage".to_string(), JsonValue::from(stage.ui_index + 1));
    m.insert("slot".to_string(), JsonValue::from(stage.stage));
    m.insert(
        "clear_times".to_string(),
        JsonValue::from(stage.clear_times),
    );
    m.insert("treasure".to_string(), JsonValue::from(stage.treasure));
    m.insert(
        "treasure_name".to_string(),
        JsonValue::String(TreasureLevel::from_raw(stage.treasure).to_string()),
    );
    if with_scores {
        m.insert(
            "itf_timed_score".to_string(),
            JsonValue::from(stage.itf_timed_score),
        );
    }
    JsonValue::Object(m)
}

fn render_summary_impl(session: &Session, options: TextRenderOptions) -> String {
    let snapshot = session.snapshot();

    let mut out = String::new();
    writeln!(&mut out, "STORY PROGRESS").expect("writing to String cannot fail");
    writeln!(&mut out, "{}", "=".repeat(RULE_WIDTH)).expect("writing to String cannot fail");
    write_field(&mut out, "Layout", snapshot.format.describe());
    write_field(&mut out, "File size", format!("{} bytes", snapshot.file_len));
    if snapshot.tail_len > 0 || options.verbose {
        write_field(&mut out, "Trailing bytes", snapshot.tail_len);
    }
    write_field(&mut out, "Chapters cleared", format!("{}/9", snapshot.chapters_cleared));
    write_field(&mut out, "Stages cleared", snapshot.stages_cleared);
    write_field(&mut out, "Treasures set", snapshot.treasures_set);
    writeln!(&mut out).expect("writing to String cannot fail");

    writeln!(
        &mut out,
        " {:<2}  {:<LABEL_WIDTH$}  {:>8}  {:>7}  {:>9}",
        "#", "Chapter", "Progress", "Cleared", "Treasures"
    )
    .expect("writing to String cannot fail");
    for chapter in session.chapter_summaries() {
        writeln!(
            &mut out,
            " {:<2}  {:<LABEL_WIDTH$}  {:>8}  {:>7}  {:>9}",
            chapter.real_chapter,
            chapter.label,
            chapter.progress,
            chapter.cleared_stages,
            chapter.treasures_set,
        )
        .expect("writing to String cannot fail");
    }

    out
}

fn write_field(out: &mut String, label: &str, value: impl std::fmt::Display) {
    writeln!(out, " {:<18}{value}", format!("{label}:")).expect("writing to String cannot fail");
}

fn has_timed_scores(session: &Session, real_chapter: usize) -> bool {
    session.format().itf_timed_scores
        && ITF_TIMED_SCORE_CHAPTERS.contains(&StoryChapters::storage_index(real_chapter))
}
