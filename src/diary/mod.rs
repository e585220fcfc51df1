//! Daily evidence from local Codex and Claude session logs, optionally
//! written into an Obsidian diary page.
//!
//! - [`session`]: JSONL parsing into [`SessionRecord`](session::SessionRecord)s
//! - [`discover`]: which log files to read for a day
//! - [`summary`]: classification and per-directory grouping
//! - [`render`]: the evidence and compact Markdown sections
//! - [`section`]: seeding a diary page and replacing the generated block

pub mod config;
pub mod discover;
pub mod render;
pub mod section;
pub mod session;
pub mod summary;
pub mod text;

pub use config::DiaryConfig;
pub use discover::SessionRoots;

use crate::base::context::IoResultExt;
use crate::base::error::Result;
use crate::cookies::chromedb::expand_home;
use discover::{collect_records, CollectStats};
use render::{render_compact, render_evidence, SectionContext};
use section::{fill_template, skeleton, upsert_section, weekday_name};
use session::{SessionSource, TargetDay};
use std::fs;
use std::path::{Path, PathBuf};
use summary::DaySummary;
use time::{Date, OffsetDateTime};
use tracing::{debug, info, warn};

pub const DEFAULT_DIARY_DIR: &str = "Diary";
pub const DEFAULT_TEMPLATE_NAME: &str = "_template.md";
pub const DEFAULT_SECTION_TITLE: &str = "Session summary (auto)";
pub const DEFAULT_SOURCES: &str = "codex,claude";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputMode {
    /// Print the full evidence; write nothing.
    #[default]
    Evidence,
    /// Write the compact block into the diary page.
    WriteAuto,
}

impl OutputMode {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputMode::Evidence => "evidence",
            OutputMode::WriteAuto => "write-auto",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiaryOptions {
    /// `YYYY-MM-DD`; today in the local offset when absent.
    pub date: Option<String>,
    pub vault_root: PathBuf,
    pub diary_dir: String,
    pub template_name: String,
    pub sources: String,
    pub exclude_config: PathBuf,
    pub section_title: String,
    pub output_mode: OutputMode,
    /// Deprecated alias for `--output-mode evidence`.
    pub dry_run: bool,
}

impl Default for DiaryOptions {
    fn default() -> Self {
        Self {
            date: None,
            vault_root: default_vault_root(),
            diary_dir: DEFAULT_DIARY_DIR.to_string(),
            template_name: DEFAULT_TEMPLATE_NAME.to_string(),
            sources: DEFAULT_SOURCES.to_string(),
            exclude_config: DiaryConfig::default_path(),
            section_title: DEFAULT_SECTION_TITLE.to_string(),
            output_mode: OutputMode::Evidence,
            dry_run: false,
        }
    }
}

/// `~/Documents/Obsidian`.
pub fn default_vault_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("Obsidian")
}

/// Diary page for `date`, seeded from the template (or the skeleton) when
/// new. Returns the path and whether the file changed.
pub fn write_diary(
    diary_root: &Path,
    template_name: &str,
    date: Date,
    title: &str,
    section: &str,
) -> Result<(PathBuf, bool)> {
    fs::create_dir_all(diary_root).path_context(diary_root)?;
    let path = diary_root.join(format!("{date}.md"));

    let original = if path.exists() {
        fs::read_to_string(&path).path_context(&path)?
    } else {
        let template_path = diary_root.join(template_name);
        if template_path.is_file() {
            let template = fs::read_to_string(&template_path).path_context(&template_path)?;
            fill_template(&template, date)
        } else {
            skeleton(date)
        }
    };

    let mut merged = upsert_section(&original, title, section);
    if !merged.ends_with('\n') {
        merged.push('\n');
    }
    if merged == original && path.exists() {
        debug!(path = %path.display(), "diary unchanged");
        return Ok((path, false));
    }
    fs::write(&path, merged).path_context(&path)?;
    Ok((path, true))
}

fn render_stats(out: &mut String, stats: &CollectStats, total: usize) {
    out.push_str("Scan complete\n");
    out.push_str(&format!(
        "Candidate files: codex={} claude={}\n",
        stats.codex_candidates, stats.claude_candidates
    ));
    out.push_str(&format!(
        "Included sessions: codex={} claude={} total={total}\n",
        stats.codex_included, stats.claude_included
    ));
}

/// Scan the day's sessions and either print the evidence or update the
/// diary page. Returns the text to print.
pub fn run(
    opts: &DiaryOptions,
    roots: &SessionRoots,
    now: OffsetDateTime,
) -> Result<String> {
    let day = match opts.date.as_deref() {
        Some(raw) => TargetDay::parse(raw, now.offset())?,
        None => TargetDay::new(now.date(), now.offset()),
    };
    let sources = SessionSource::parse_list(&opts.sources)?;
    let cfg = DiaryConfig::load(&expand_home(&opts.exclude_config))?;

    let mode = if opts.dry_run {
        warn!("--dry-run is deprecated; use --output-mode evidence (the default)");
        OutputMode::Evidence
    } else {
        opts.output_mode
    };

    let (records, stats) = collect_records(roots, &day, &sources, &cfg);
    info!(sessions = records.len(), date = %day.date, "sessions collected");
    let summary = DaySummary::build(&records);
    let ctx = SectionContext {
        title: &opts.section_title,
        date: day.date,
        sources: &sources,
        generated_at: now,
    };

    let diary_root = expand_home(&opts.vault_root).join(&opts.diary_dir);
    let mut out = String::new();
    render_stats(&mut out, &stats, records.len());

    match mode {
        OutputMode::Evidence => {
            let evidence = render_evidence(&ctx, &summary, &cfg);
            let target = diary_root.join(format!("{}.md", day.date));
            out.push_str(&format!("Target diary (not written): {}\n", target.display()));
            out.push_str(&format!("Output mode: {}\n", mode.as_str()));
            out.push_str("\n===== EVIDENCE PREVIEW =====\n");
            out.push_str(&format!("Date: {} {}\n\n", day.date, weekday_name(day.date)));
            out.push_str(&evidence);
        }
        OutputMode::WriteAuto => {
            let compact = render_compact(&ctx, &summary);
            let (path, changed) = write_diary(
                &diary_root,
                &opts.template_name,
                day.date,
                &opts.section_title,
                &compact,
            )?;
            let verb = if changed { "Written" } else { "Unchanged" };
            out.push_str(&format!("{verb}: {}\n", path.display()));
            out.push_str(&format!("Output mode: {}\n", mode.as_str()));
        }
    }
    Ok(out)
}
