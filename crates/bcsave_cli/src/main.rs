use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use bcsave_core::core_api::{Engine, Session};
use bcsave_core::csv::{Csv, CsvOptions};
use bcsave_core::document::StoryFormat;
use bcsave_core::story::Era;
use bcsave_core::treasure::{TreasureGroups, TreasureLevel};
use bcsave_render::{
    JsonStyle, TextRenderOptions, TextStyle, render_chapter_json, render_chapter_text,
    render_json_full, render_text_with_options,
};
use clap::Parser;
use serde_json::Value as JsonValue;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StageClear {
    chapter: usize,
    stage: usize,
    count: i32,
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(value_name = "STORY.DAT")]
    path: PathBuf,
    /// Input carries the treasure festival block after the chapters.
    #[arg(long)]
    treasure_festival: bool,
    /// Input carries the timed score block.
    #[arg(long)]
    timed_scores: bool,
    #[arg(long)]
    json: bool,
    /// Show one chapter (0-8) stage by stage.
    #[arg(long, value_name = "N")]
    chapter: Option<usize>,
    #[arg(short, long)]
    verbose: bool,
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    clear_chapters: Vec<usize>,
    #[arg(
        long,
        value_name = "P",
        default_value_t = 48,
        value_parser = clap::value_parser!(u64).range(0..=48)
    )]
    progress: u64,
    #[arg(long, value_name = "CHAPTER:STAGE=COUNT", value_parser = parse_stage_clear)]
    stage_clears: Vec<StageClear>,
    #[arg(
        long,
        value_name = "none|inferior|normal|superior|N",
        value_parser = parse_treasure_level
    )]
    treasure_level: Option<TreasureLevel>,
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    treasure_chapters: Vec<usize>,
    /// 1-based stage numbers as listed in game.
    #[arg(
        long,
        value_name = "LIST",
        value_delimiter = ',',
        conflicts_with = "treasure_groups",
        requires = "treasure_level"
    )]
    treasure_stages: Vec<usize>,
    /// Treasure group table of the era the chosen chapters belong to.
    #[arg(
        long,
        value_name = "TABLE.csv",
        requires_all = ["groups", "treasure_level"]
    )]
    treasure_groups: Option<PathBuf>,
    #[arg(
        long,
        value_name = "LIST",
        value_delimiter = ',',
        requires = "treasure_groups"
    )]
    groups: Vec<usize>,
    #[arg(long)]
    clear_tutorial: bool,
    #[arg(long, value_name = "PATH")]
    import_json: Option<PathBuf>,
    #[arg(long, value_name = "PATH")]
    export_json: Option<PathBuf>,
    #[arg(long, short = 'o', value_name = "PATH")]
    output: Option<PathBuf>,
}

impl Cli {
    fn format_hint(&self) -> Option<StoryFormat> {
        if self.treasure_festival || self.timed_scores {
            Some(StoryFormat {
                treasure_festival: self.treasure_festival,
                itf_timed_scores: self.timed_scores,
            })
        } else {
            None
        }
    }

    fn has_edits(&self) -> bool {
        !self.clear_chapters.is_empty()
            || !self.stage_clears.is_empty()
            || self.treasure_level.is_some()
            || self.clear_tutorial
            || self.import_json.is_some()
    }
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let has_edits = cli.has_edits();
    if has_edits && cli.output.is_none() {
        eprintln!("edit flags require --output <PATH>");
        process::exit(2);
    }
    if !has_edits && cli.output.is_some() {
        eprintln!("--output requires at least one edit flag");
        process::exit(2);
    }
    if cli.treasure_level.is_some() != !cli.treasure_chapters.is_empty() {
        eprintln!("--treasure-level and --treasure-chapters must be given together");
        process::exit(2);
    }
    if cli.treasure_stages.contains(&0) {
        eprintln!("--treasure-stages numbers start at 1");
        process::exit(2);
    }
    if cli.treasure_groups.is_some() {
        let mut eras: Vec<Era> = cli
            .treasure_chapters
            .iter()
            .map(|&chapter| Era::from_real_chapter(chapter))
            .collect();
        eras.dedup();
        if eras.len() > 1 {
            eprintln!("--treasure-groups applies one era's table; --treasure-chapters spans several eras");
            process::exit(2);
        }
    }

    let bytes = fs::read(&cli.path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {e}", cli.path.display());
        process::exit(1);
    });

    let engine = Engine::new();
    let mut session = engine
        .open_bytes(bytes, cli.format_hint())
        .unwrap_or_else(|e| {
            eprintln!("Error parsing story data: {}", cli.path.display());
            eprintln!("  {}", e);
            process::exit(1);
        });

    apply_edits(&cli, &mut session);

    if let Some(out_path) = &cli.output {
        let edited_bytes = session.to_bytes_modified().unwrap_or_else(|e| {
            eprintln!("Error creating modified story bytes: {e}");
            process::exit(1);
        });
        fs::write(out_path, edited_bytes).unwrap_or_else(|e| {
            eprintln!("Error writing {}: {e}", out_path.display());
            process::exit(1);
        });
        info!(path = %out_path.display(), "wrote edited story");
    }

    if let Some(export_path) = &cli.export_json {
        let value = session.to_json().unwrap_or_else(|e| {
            eprintln!("Error exporting story: {e}");
            process::exit(1);
        });
        write_json(export_path, &value);
    }

    let options = TextRenderOptions {
        verbose: cli.verbose,
    };

    if cli.json {
        let json = match cli.chapter {
            Some(chapter) => render_chapter_json(&session, chapter, JsonStyle::CanonicalV1)
                .unwrap_or_else(|e| {
                    eprintln!("Error rendering chapter: {e}");
                    process::exit(1);
                }),
            None => render_json_full(&session, JsonStyle::CanonicalV1),
        };
        let rendered = serde_json::to_string_pretty(&json).unwrap_or_else(|e| {
            eprintln!("Error rendering JSON output: {e}");
            process::exit(1);
        });
        println!("{rendered}");
        return;
    }

    if let Some(chapter) = cli.chapter {
        let rendered = render_chapter_text(&session, chapter, options).unwrap_or_else(|e| {
            eprintln!("Error rendering chapter: {e}");
            process::exit(1);
        });
        print!("{rendered}");
        return;
    }

    if cli.output.is_some() || cli.export_json.is_some() {
        if let Some(out_path) = &cli.output {
            println!("Wrote edited story to {}", out_path.display());
        }
        if let Some(export_path) = &cli.export_json {
            println!("Wrote story JSON to {}", export_path.display());
        }
        return;
    }

    print!(
        "{}",
        render_text_with_options(&session, TextStyle::Summary, options)
    );
}

fn apply_edits(cli: &Cli, session: &mut Session) {
    if let Some(import_path) = &cli.import_json {
        let text = fs::read_to_string(import_path).unwrap_or_else(|e| {
            eprintln!("Error reading {}: {e}", import_path.display());
            process::exit(1);
        });
        let value: JsonValue = serde_json::from_str(&text).unwrap_or_else(|e| {
            eprintln!("Error parsing {}: {e}", import_path.display());
            process::exit(1);
        });
        session.replace_from_json(value).unwrap_or_else(|e| {
            eprintln!("Error importing story JSON: {e}");
            process::exit(1);
        });
    }

    if cli.clear_tutorial {
        session.clear_tutorial();
    }

    if !cli.clear_chapters.is_empty() {
        session
            .clear_chapters(&cli.clear_chapters, cli.progress as usize)
            .unwrap_or_else(|e| {
                eprintln!("Error clearing chapters: {e}");
                process::exit(1);
            });
    }

    for edit in &cli.stage_clears {
        session
            .set_stage_clear_count(edit.chapter, edit.stage, edit.count)
            .unwrap_or_else(|e| {
                eprintln!("Error applying stage clear edit: {e}");
                process::exit(1);
            });
    }

    let Some(level) = cli.treasure_level else {
        return;
    };

    if let Some(table_path) = &cli.treasure_groups {
        let table = fs::read(table_path).unwrap_or_else(|e| {
            eprintln!("Error reading {}: {e}", table_path.display());
            process::exit(1);
        });
        let groups = TreasureGroups::from_csv(&Csv::parse(&table, CsvOptions::default()));
        for &chapter in &cli.treasure_chapters {
            session
                .apply_treasure_groups(chapter, &groups, &cli.groups, level)
                .unwrap_or_else(|e| {
                    eprintln!("Error applying treasure groups: {e}");
                    process::exit(1);
                });
        }
    } else if !cli.treasure_stages.is_empty() {
        let ui_stages: Vec<usize> = cli.treasure_stages.iter().map(|s| s - 1).collect();
        session
            .apply_treasure_to_stages(&cli.treasure_chapters, &ui_stages, level)
            .unwrap_or_else(|e| {
                eprintln!("Error applying stage treasures: {e}");
                process::exit(1);
            });
    } else {
        session
            .apply_treasure_to_chapters(&cli.treasure_chapters, level)
            .unwrap_or_else(|e| {
                eprintln!("Error applying chapter treasures: {e}");
                process::exit(1);
            });
    }
}

fn write_json(path: &Path, value: &JsonValue) {
    let rendered = serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        eprintln!("Error rendering JSON output: {e}");
        process::exit(1);
    });
    fs::write(path, rendered).unwrap_or_else(|e| {
        eprintln!("Error writing {}: {e}", path.display());
        process::exit(1);
    });
}

fn parse_stage_clear(value: &str) -> Result<StageClear, String> {
    let invalid = || format!("invalid stage clear '{value}', expected CHAPTER:STAGE=COUNT");
    let (target, count) = value.split_once('=').ok_or_else(invalid)?;
    let (chapter, stage) = target.split_once(':').ok_or_else(invalid)?;
    Ok(StageClear {
        chapter: chapter.trim().parse().map_err(|_| invalid())?,
        stage: stage.trim().parse().map_err(|_| invalid())?,
        count: count.trim().parse().map_err(|_| invalid())?,
    })
}

fn parse_treasure_level(value: &str) -> Result<TreasureLevel, String> {
    match value.to_ascii_lowercase().as_str() {
        "none" => Ok(TreasureLevel::None),
        "inferior" => Ok(TreasureLevel::Inferior),
        "normal" => Ok(TreasureLevel::Normal),
        "superior" => Ok(TreasureLevel::Superior),
        other => other.parse::<i32>().map(TreasureLevel::from_raw).map_err(|_| {
            format!(
                "invalid treasure level '{value}', expected one of: none, inferior, normal, superior, or a number"
            )
        }),
    }
}
