use crate::base::context::IoResultExt;
use crate::base::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Exclusions and report limits, read from a JSON file.
///
/// Every key is optional; absent keys keep their default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DiaryConfig {
    pub exclude_cwd_keywords: Vec<String>,
    pub exclude_path_keywords: Vec<String>,
    pub skip_subagents: bool,
    pub max_user_messages_per_session: usize,
    pub max_commands_per_session: usize,
    pub max_dirs_in_report: usize,
    pub max_commands_in_report: usize,
    pub claude_mtime_window_days: u32,
}

impl Default for DiaryConfig {
    fn default() -> Self {
        Self {
            exclude_cwd_keywords: Vec::new(),
            exclude_path_keywords: Vec::new(),
            skip_subagents: true,
            max_user_messages_per_session: 8,
            max_commands_per_session: 12,
            max_dirs_in_report: 12,
            max_commands_in_report: 15,
            claude_mtime_window_days: 2,
        }
    }
}

impl DiaryConfig {
    /// Defaults when `path` does not exist; a malformed file is an input error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).path_context(path)?;
        Self::from_json(&raw)
            .map_err(|e| Error::InvalidInput(format!("diary config {}: {e}", path.display())))
    }

    pub fn from_json(raw: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// `~/.config/sessiontap/diary.json` (platform config dir).
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sessiontap")
            .join("diary.json")
    }

    pub fn excludes_cwd(&self, cwd: &str) -> bool {
        matches_keywords(cwd, &self.exclude_cwd_keywords)
    }

    pub fn excludes_path(&self, path: &Path) -> bool {
        let path = path.to_string_lossy();
        if self.skip_subagents && path.contains("/subagents/") {
            return true;
        }
        matches_keywords(&path, &self.exclude_path_keywords)
    }
}

/// Lowercase ASCII letters and digits only.
pub fn normalize_token(value: &str) -> String {
    value
        .chars()
        .flat_map(char::to_lowercase)
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

/// Keywords containing `/` match as path fragments; the rest match on
/// normalized tokens, so `rag-flow` also catches `RagFlow`.
pub fn matches_keywords(value: &str, keywords: &[String]) -> bool {
    if value.is_empty() {
        return false;
    }
    let lowered = value.to_lowercase();
    let normalized = normalize_token(value);
    keywords.iter().any(|keyword| {
        let kw = keyword.trim().to_lowercase();
        if kw.is_empty() {
            return false;
        }
        if kw.contains('/') {
            return lowered.contains(&kw);
        }
        let kw = normalize_token(&kw);
        !kw.is_empty() && normalized.contains(&kw)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let cfg = DiaryConfig::from_json(r#"{"max_dirs_in_report": 3, "exclude_cwd_keywords": ["secret"]}"#)
            .unwrap();
        assert_eq!(cfg.max_dirs_in_report, 3);
        assert_eq!(cfg.max_commands_in_report, 15);
        assert!(cfg.skip_subagents);
        assert_eq!(cfg.exclude_cwd_keywords, vec!["secret".to_string()]);
    }

    #[test]
    fn test_load_missing_and_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("none.json");
        assert_eq!(DiaryConfig::load(&missing).unwrap(), DiaryConfig::default());

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{not json").unwrap();
        let err = DiaryConfig::load(&bad).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_keyword_matching() {
        let kws = vec!["rag-flow".to_string(), "/private/".to_string()];
        assert!(matches_keywords("/Users/me/RagFlow", &kws));
        assert!(matches_keywords("/srv/private/x", &kws));
        assert!(!matches_keywords("/srv/privatex", &kws));
        assert!(!matches_keywords("", &kws));
        assert_eq!(normalize_token("Rag-Flow_2"), "ragflow2");
    }

    #[test]
    fn test_subagent_paths() {
        let cfg = DiaryConfig::default();
        assert!(cfg.excludes_path(Path::new("/h/.claude/projects/p/subagents/a.jsonl")));
        let keep = DiaryConfig {
            skip_subagents: false,
            ..DiaryConfig::default()
        };
        assert!(!keep.excludes_path(Path::new("/h/.claude/projects/p/subagents/a.jsonl")));
    }
}
