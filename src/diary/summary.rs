//! Topic classification and per-directory grouping.

use crate::diary::session::{SessionRecord, SessionSource, UNKNOWN_CWD};
use crate::diary::text::append_unique;

pub const OTHER_CATEGORY: &str = "Other";

/// Distinct intents kept per directory.
const INTENTS_PER_GROUP: usize = 4;

/// (label, keywords). A record goes to the label with the most keyword
/// hits; ties keep the earlier rule.
const CATEGORY_RULES: &[(&str, &[&str])] = &[
    (
        "Session review",
        &["会话", "session", "jsonl", "日记", "diary", "总结", "知识库"],
    ),
    (
        "Skill setup",
        &["skill", "技能", "setup", "配置", "mcp", "sync", "bootstrap", "proxy"],
    ),
    (
        "Debugging",
        &["debug", "bug", "报错", "错误", "修复", "test", "测试", "traceback"],
    ),
    (
        "Research",
        &[
            "twitter", "推特", "bird", "x.com", "reddit", "linuxdo", "搜索", "read", "资讯",
            "帖子", "新闻",
        ],
    ),
    (
        "Automation",
        &["python", "bash", "script", "脚本", "command", "命令", "exec_command"],
    ),
];

/// Counts in first-seen order. `most_common` is stable, so equal counts
/// keep that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    entries: Vec<(String, usize)>,
}

impl Tally {
    pub fn add(&mut self, key: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((key.to_string(), 1)),
        }
    }

    pub fn get(&self, key: &str) -> usize {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map_or(0, |(_, c)| *c)
    }

    pub fn most_common(&self, n: usize) -> Vec<(&str, usize)> {
        let mut sorted: Vec<(&str, usize)> =
            self.entries.iter().map(|(k, c)| (k.as_str(), *c)).collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted.truncate(n);
        sorted
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, c)| c).sum()
    }
}

const PROXY_VARS: &[&str] = &["https_proxy=", "http_proxy=", "all_proxy="];
const NOISY_DIRS: &[&str] = &["/skills/", "/.claude/", "/.codex/"];
const VALUE_FLAGS: &[&str] = &["--cookie-source", "--timeout"];

/// Lowercased text with proxy variables, skill/agent paths and a few
/// value flags removed, so they do not skew classification.
fn classify_haystack(record: &SessionRecord) -> String {
    let raw = record
        .user_texts
        .iter()
        .chain(&record.commands)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let mut kept: Vec<&str> = Vec::new();
    let mut tokens = raw.split_whitespace();
    while let Some(token) = tokens.next() {
        let mut token = token;
        if let Some(pos) = PROXY_VARS.iter().filter_map(|v| token.find(v)).min() {
            token = &token[..pos];
        }
        if let Some(slash) = token.find('/') {
            let rest = &token[slash + 1..];
            if NOISY_DIRS.iter().any(|d| rest.contains(d)) {
                token = &token[..slash];
            }
        }
        if let Some(flag) = VALUE_FLAGS.iter().find(|f| token.ends_with(*f)) {
            if tokens.next().is_some() {
                token = &token[..token.len() - flag.len()];
            }
        }
        if !token.is_empty() {
            kept.push(token);
        }
    }
    kept.join(" ")
}

pub fn classify(record: &SessionRecord) -> &'static str {
    let haystack = classify_haystack(record);
    let mut best = (OTHER_CATEGORY, 0);
    for (label, keywords) in CATEGORY_RULES {
        let score = keywords.iter().filter(|k| haystack.contains(**k)).count();
        if score > best.1 {
            best = (*label, score);
        }
    }
    best.0
}

/// First user message, else the first command, else a placeholder.
pub fn infer_intent(record: &SessionRecord) -> String {
    if let Some(text) = record.user_texts.iter().find(|t| !t.is_empty()) {
        return text.clone();
    }
    match record.commands.first() {
        Some(command) => format!("Ran: {command}"),
        None => "No explicit intent".to_string(),
    }
}

/// Sessions sharing one working directory.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary<'a> {
    pub cwd: String,
    pub sessions: Vec<&'a SessionRecord>,
    pub categories: Tally,
    pub intents: Vec<String>,
    pub commands: Tally,
}

impl GroupSummary<'_> {
    pub fn count(&self, source: SessionSource) -> usize {
        self.sessions.iter().filter(|s| s.source == source).count()
    }
}

/// Everything the renderers need for one day.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySummary<'a> {
    pub records: &'a [SessionRecord],
    /// Most sessions first, then by directory.
    pub groups: Vec<GroupSummary<'a>>,
    pub categories: Tally,
    pub commands: Tally,
}

impl<'a> DaySummary<'a> {
    pub fn build(records: &'a [SessionRecord]) -> Self {
        let mut groups: Vec<GroupSummary<'a>> = Vec::new();
        let mut categories = Tally::default();
        let mut commands = Tally::default();

        for record in records {
            let cwd = if record.cwd.is_empty() {
                UNKNOWN_CWD
            } else {
                record.cwd.as_str()
            };
            let idx = match groups.iter().position(|g| g.cwd == cwd) {
                Some(idx) => idx,
                None => {
                    groups.push(GroupSummary {
                        cwd: cwd.to_string(),
                        sessions: Vec::new(),
                        categories: Tally::default(),
                        intents: Vec::new(),
                        commands: Tally::default(),
                    });
                    groups.len() - 1
                }
            };
            let group = &mut groups[idx];
            group.sessions.push(record);

            let category = classify(record);
            group.categories.add(category);
            categories.add(category);

            append_unique(&mut group.intents, infer_intent(record), INTENTS_PER_GROUP);

            for command in record.commands.iter().filter(|c| !c.is_empty()) {
                group.commands.add(command);
                commands.add(command);
            }
        }

        groups.sort_by(|a, b| {
            b.sessions
                .len()
                .cmp(&a.sessions.len())
                .then_with(|| a.cwd.cmp(&b.cwd))
        });

        Self {
            records,
            groups,
            categories,
            commands,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
