//! Locating the session logs that may hold events for a given day.

use crate::diary::config::DiaryConfig;
use crate::diary::session::{
    parse_claude_file, parse_codex_file, SessionRecord, SessionSource, TargetDay,
};
use std::fs;
use std::path::{Path, PathBuf};
use time::{Duration, OffsetDateTime};
use tracing::debug;

/// Where each agent keeps its logs.
#[derive(Debug, Clone)]
pub struct SessionRoots {
    pub codex: PathBuf,
    pub claude: PathBuf,
}

impl SessionRoots {
    /// `~/.codex/sessions` and `~/.claude/projects`.
    pub fn from_home() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::under(&home)
    }

    pub fn under(home: &Path) -> Self {
        Self {
            codex: home.join(".codex").join("sessions"),
            claude: home.join(".claude").join("projects"),
        }
    }
}

/// Candidate and included counts per source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectStats {
    pub codex_candidates: usize,
    pub claude_candidates: usize,
    pub codex_included: usize,
    pub claude_included: usize,
}

/// Codex files live in a `YYYY/MM/DD` tree.
pub fn discover_codex_files(root: &Path, day: &TargetDay) -> Vec<PathBuf> {
    let date = day.date;
    let day_dir = root
        .join(format!("{:04}", date.year()))
        .join(format!("{:02}", u8::from(date.month())))
        .join(format!("{:02}", date.day()));
    let Ok(entries) = fs::read_dir(&day_dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_jsonl(path))
        .collect();
    files.sort();
    files
}

/// Claude files anywhere under the projects root, modified within
/// `claude_mtime_window_days` of the target day.
pub fn discover_claude_files(root: &Path, day: &TargetDay, cfg: &DiaryConfig) -> Vec<PathBuf> {
    let start = day.date.midnight().assume_offset(day.offset);
    let window = Duration::days(i64::from(cfg.claude_mtime_window_days));
    let earliest = start - window;
    let latest = start + Duration::days(1) + window;

    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.filter_map(|entry| entry.ok()) {
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                pending.push(path);
                continue;
            }
            if !is_jsonl(&path) || cfg.excludes_path(&path) {
                continue;
            }
            let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
                continue;
            };
            let modified = OffsetDateTime::from(modified);
            if modified < earliest || modified > latest {
                continue;
            }
            files.push(path);
        }
    }
    files.sort();
    files
}

fn is_jsonl(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "jsonl")
}

/// Parse every candidate of the selected sources, newest activity first.
pub fn collect_records(
    roots: &SessionRoots,
    day: &TargetDay,
    sources: &[SessionSource],
    cfg: &DiaryConfig,
) -> (Vec<SessionRecord>, CollectStats) {
    let mut records = Vec::new();
    let mut stats = CollectStats::default();

    if sources.contains(&SessionSource::Codex) {
        let files = discover_codex_files(&roots.codex, day);
        stats.codex_candidates = files.len();
        for path in &files {
            if let Some(record) = parse_codex_file(path, day, cfg) {
                records.push(record);
                stats.codex_included += 1;
            }
        }
    }
    if sources.contains(&SessionSource::Claude) {
        let files = discover_claude_files(&roots.claude, day, cfg);
        stats.claude_candidates = files.len();
        for path in &files {
            if let Some(record) = parse_claude_file(path, day, cfg) {
                records.push(record);
                stats.claude_included += 1;
            }
        }
    }
    debug!(?stats, "session logs scanned");

    // Stable: ties keep discovery order.
    records.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
    (records, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, offset};

    #[test]
    fn test_codex_day_directory() {
        let home = tempfile::tempdir().unwrap();
        let roots = SessionRoots::under(home.path());
        let dir = roots.codex.join("2026").join("03").join("04");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("b.jsonl"), "").unwrap();
        fs::write(dir.join("a.jsonl"), "").unwrap();
        fs::write(dir.join("notes.txt"), "").unwrap();

        let day = TargetDay::new(date!(2026 - 03 - 04), offset!(UTC));
        let files = discover_codex_files(&roots.codex, &day);
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jsonl", "b.jsonl"]);

        let other = TargetDay::new(date!(2026 - 03 - 05), offset!(UTC));
        assert!(discover_codex_files(&roots.codex, &other).is_empty());
    }

    #[test]
    fn test_claude_mtime_window() {
        let home = tempfile::tempdir().unwrap();
        let roots = SessionRoots::under(home.path());
        let project = roots.claude.join("-work-api");
        fs::create_dir_all(project.join("subagents")).unwrap();
        fs::write(project.join("s1.jsonl"), "").unwrap();
        fs::write(project.join("subagents").join("agent.jsonl"), "").unwrap();

        let today = OffsetDateTime::now_utc();
        let near = TargetDay::new(today.date(), offset!(UTC));
        let files = discover_claude_files(&roots.claude, &near, &DiaryConfig::default());
        assert_eq!(files, vec![project.join("s1.jsonl")]);

        let far = TargetDay::new(today.date() - Duration::days(30), offset!(UTC));
        assert!(discover_claude_files(&roots.claude, &far, &DiaryConfig::default()).is_empty());
    }
}
