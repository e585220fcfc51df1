//! Markdown sections built from a [`DaySummary`].

use crate::diary::config::DiaryConfig;
use crate::diary::session::SessionSource;
use crate::diary::summary::DaySummary;
use std::path::Path;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

pub const MARK_START: &str = "<!-- SESSION_SUMMARY_AUTO_START -->";
pub const MARK_END: &str = "<!-- SESSION_SUMMARY_AUTO_END -->";

/// Share of sessions above which one directory or topic is flagged.
const DOMINANT_SHARE: f64 = 0.7;

/// What every section header shows.
#[derive(Debug, Clone, Copy)]
pub struct SectionContext<'a> {
    pub title: &'a str,
    pub date: Date,
    pub sources: &'a [SessionSource],
    pub generated_at: OffsetDateTime,
}

impl SectionContext<'_> {
    fn generated(&self) -> String {
        self.generated_at
            .format(format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second]"
            ))
            .unwrap_or_default()
    }

    fn sources(&self) -> String {
        let mut names: Vec<&str> = self.sources.iter().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names.join(", ")
    }
}

fn finish(mut lines: Vec<String>) -> String {
    lines.push(MARK_END.to_string());
    lines.join("\n") + "\n"
}

/// Directory count the body should cover.
fn required_dirs(summary: &DaySummary<'_>) -> usize {
    summary.groups.len().min(2)
}

/// Full evidence, printed for the person writing the diary.
pub fn render_evidence(ctx: &SectionContext<'_>, summary: &DaySummary<'_>, cfg: &DiaryConfig) -> String {
    let total = summary.records.len();
    let excluded = if cfg.exclude_cwd_keywords.is_empty() {
        "none".to_string()
    } else {
        cfg.exclude_cwd_keywords.join(", ")
    };
    let mut lines = vec![
        format!("## {}", ctx.title),
        MARK_START.to_string(),
        format!("> Generated: {}", ctx.generated()),
        format!("> Date: {}", ctx.date),
        format!("> Sources: {}", ctx.sources()),
        format!("> Excluded dirs: {excluded}"),
        format!("- Sessions included: {total}"),
        format!("- Directories: {}", summary.groups.len()),
    ];
    if summary.is_empty() {
        lines.push("- No matching sessions found.".to_string());
        return finish(lines);
    }

    lines.push("### Topic distribution".to_string());
    for (label, count) in summary.categories.most_common(6) {
        lines.push(format!("- {label}: {count}"));
    }

    lines.push("### Writing check (stay on topic)".to_string());
    lines.push(format!(
        "- Cover at least {} directory threads in the body",
        required_dirs(summary)
    ));
    let coverage: Vec<String> = summary
        .groups
        .iter()
        .take(3)
        .map(|g| {
            let n = g.sessions.len();
            let pct = n as f64 / total as f64 * 100.0;
            format!("`{}` {n} sessions ({pct:.0}%)", g.cwd)
        })
        .collect();
    lines.push(format!("- Directory coverage: {}", coverage.join("; ")));
    if summary.groups.len() > 1
        && summary.groups[0].sessions.len() as f64 / total as f64 >= DOMINANT_SHARE
    {
        lines.push(
            "- Off-topic warning: one directory dominates; the body must also cover the other directories' main threads."
                .to_string(),
        );
    }
    if summary.categories.len() > 1 {
        if let Some((main, count)) = summary.categories.most_common(1).first() {
            if *count as f64 / total as f64 >= DOMINANT_SHARE {
                lines.push(format!(
                    "- Off-topic warning: `{main}` dominates; the body should cover the other topics too."
                ));
            }
        }
    }

    lines.push("### Per-directory activity".to_string());
    for group in summary.groups.iter().take(cfg.max_dirs_in_report) {
        lines.push(format!("#### `{}`", group.cwd));
        lines.push(format!(
            "- Sessions: {} (codex {} / claude {})",
            group.sessions.len(),
            group.count(SessionSource::Codex),
            group.count(SessionSource::Claude)
        ));
        if !group.intents.is_empty() {
            let intents: Vec<&str> = group.intents.iter().take(3).map(String::as_str).collect();
            lines.push(format!("- Main asks: {}", intents.join("; ")));
        }
        let top: Vec<&str> = group
            .categories
            .most_common(2)
            .into_iter()
            .map(|(label, _)| label)
            .collect();
        if !top.is_empty() {
            lines.push(format!("- Topic types: {}", top.join(", ")));
        }
        if !group.commands.is_empty() {
            let items: Vec<String> = group
                .commands
                .most_common(4)
                .into_iter()
                .map(|(cmd, n)| if n > 1 { format!("`{cmd}`×{n}") } else { format!("`{cmd}`") })
                .collect();
            lines.push(format!("- Key operations: {}", items.join("; ")));
        }
    }
    if summary.groups.len() > cfg.max_dirs_in_report {
        lines.push(format!(
            "- Other directories: {} (omitted)",
            summary.groups.len() - cfg.max_dirs_in_report
        ));
    }

    let repeated: Vec<(&str, usize)> = summary
        .commands
        .most_common(cfg.max_commands_in_report)
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .collect();
    if repeated.is_empty() {
        lines.push("### Command stats".to_string());
        lines.push(format!(
            "- {} commands in total, none repeated",
            summary.commands.total()
        ));
    } else {
        lines.push("### Frequent commands".to_string());
        for (cmd, n) in repeated {
            lines.push(format!("- `{cmd}` × {n}"));
        }
    }
    finish(lines)
}

/// Short index written into the diary; the prose stays hand-written.
pub fn render_compact(ctx: &SectionContext<'_>, summary: &DaySummary<'_>) -> String {
    let mut lines = vec![
        format!("## {}", ctx.title),
        MARK_START.to_string(),
        format!("> Evidence generated: {}", ctx.generated()),
        format!("> Date: {}", ctx.date),
        format!("> Sources: {}", ctx.sources()),
        format!("- Sessions included: {}", summary.records.len()),
        format!("- Directories: {}", summary.groups.len()),
    ];
    if summary.is_empty() {
        lines.push("- No matching sessions found.".to_string());
        return finish(lines);
    }

    let topics: Vec<String> = summary
        .categories
        .most_common(6)
        .into_iter()
        .map(|(label, n)| format!("{label} {n}"))
        .collect();
    lines.push(format!("- Topics: {}", topics.join(" / ")));

    let dirs: Vec<String> = summary
        .groups
        .iter()
        .take(3)
        .map(|g| {
            Path::new(&g.cwd)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| g.cwd.clone())
        })
        .collect();
    lines.push(format!(
        "- Writing check: cover at least {} directory threads in the body (today: {})",
        required_dirs(summary),
        dirs.join(", ")
    ));
    lines.push("- Note: this block is only an index; the written summary is authoritative".to_string());
    finish(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diary::session::SessionRecord;
    use time::macros::{date, datetime};

    fn ctx(sources: &[SessionSource]) -> SectionContext<'_> {
        SectionContext {
            title: "Session summary (auto)",
            date: date!(2026 - 03 - 14),
            sources,
            generated_at: datetime!(2026-03-14 21:05:09 +8),
        }
    }

    fn record(source: SessionSource, cwd: &str, text: &str, commands: &[&str]) -> SessionRecord {
        let mut r = SessionRecord::new(source, Path::new("/s/a.jsonl"));
        r.cwd = cwd.to_string();
        r.user_texts = vec![text.to_string()];
        r.commands = commands.iter().map(|c| c.to_string()).collect();
        r
    }

    #[test]
    fn test_empty_day() {
        let sources = [SessionSource::Codex, SessionSource::Claude];
        let summary = DaySummary::build(&[]);
        let out = render_evidence(&ctx(&sources), &summary, &DiaryConfig::default());
        assert_eq!(
            out,
            "## Session summary (auto)\n<!-- SESSION_SUMMARY_AUTO_START -->\n\
             > Generated: 2026-03-14 21:05:09\n> Date: 2026-03-14\n> Sources: claude, codex\n\
             > Excluded dirs: none\n- Sessions included: 0\n- Directories: 0\n\
             - No matching sessions found.\n<!-- SESSION_SUMMARY_AUTO_END -->\n"
        );
    }

    #[test]
    fn test_evidence_sections() {
        let records = vec![
            record(SessionSource::Codex, "/work/site", "fix the login bug", &["cargo test", "git status"]),
            record(SessionSource::Claude, "/work/site", "debug the flaky test", &["cargo test"]),
            record(SessionSource::Codex, "/work/notes", "write the diary", &["ls"]),
        ];
        let sources = [SessionSource::Claude, SessionSource::Codex];
        let summary = DaySummary::build(&records);
        let out = render_evidence(&ctx(&sources), &summary, &DiaryConfig::default());

        assert!(out.contains("- Sessions included: 3\n- Directories: 2\n"));
        assert!(out.contains("### Topic distribution\n- Debugging: 2\n- Session review: 1\n"));
        assert!(out.contains("- Cover at least 2 directory threads in the body"));
        assert!(out.contains("`/work/site` 2 sessions (67%); `/work/notes` 1 sessions (33%)"));
        assert!(out.contains("#### `/work/site`\n- Sessions: 2 (codex 1 / claude 1)\n"));
        assert!(out.contains("- Key operations: `cargo test`×2; `git status`"));
        assert!(out.contains("### Frequent commands\n- `cargo test` × 2\n"));
        assert!(!out.contains("Off-topic warning"));
        assert!(out.ends_with("<!-- SESSION_SUMMARY_AUTO_END -->\n"));
    }

    #[test]
    fn test_dominant_directory_warning() {
        let records: Vec<_> = (0..4)
            .map(|i| record(SessionSource::Codex, "/a", &format!("task number {i}"), &[]))
            .chain([record(SessionSource::Codex, "/b", "other task", &[])])
            .collect();
        let sources = [SessionSource::Codex];
        let summary = DaySummary::build(&records);
        let out = render_evidence(&ctx(&sources), &summary, &DiaryConfig::default());
        assert!(out.contains("one directory dominates"));
        assert!(out.contains("### Command stats\n- 0 commands in total, none repeated\n"));
    }

    #[test]
    fn test_compact_section() {
        let records = vec![
            record(SessionSource::Codex, "/work/site", "fix the login bug", &[]),
            record(SessionSource::Claude, "/work/notes", "write the diary", &[]),
        ];
        let sources = [SessionSource::Codex];
        let summary = DaySummary::build(&records);
        let out = render_compact(&ctx(&sources), &summary);
        assert!(out.contains("- Topics: Debugging 1 / Session review 1\n"));
        assert!(out.contains("(today: notes, site)"));
        assert!(out.starts_with("## Session summary (auto)\n<!-- SESSION_SUMMARY_AUTO_START -->\n"));
    }
}
