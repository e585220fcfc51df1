//! Per-file parsing of Codex and Claude JSONL session logs.

use crate::base::error::{Error, Result};
use crate::diary::config::DiaryConfig;
use crate::diary::text::{append_unique, sanitize_command, sanitize_user_text};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};
use tracing::debug;

/// Lines longer than this (in characters) are skipped unparsed.
pub const MAX_LINE_CHARS: usize = 500_000;

pub const UNKNOWN_CWD: &str = "(unknown-cwd)";

/// Claude tools that only read; they are not worth listing as operations.
const CLAUDE_READONLY_TOOLS: &[&str] = &[
    "read",
    "glob",
    "grep",
    "webfetch",
    "websearch",
    "taskoutput",
    "tasklist",
    "taskget",
    "listmcpresourcestool",
    "readmcpresourcetool",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SessionSource {
    Claude,
    Codex,
}

impl SessionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionSource::Claude => "claude",
            SessionSource::Codex => "codex",
        }
    }

    /// Comma-separated source list; unknown names and an empty list are
    /// input errors.
    pub fn parse_list(raw: &str) -> Result<Vec<SessionSource>> {
        let mut sources = Vec::new();
        let mut unsupported = Vec::new();
        for item in raw.split(',').map(|s| s.trim().to_lowercase()) {
            let source = match item.as_str() {
                "" => continue,
                "claude" => SessionSource::Claude,
                "codex" => SessionSource::Codex,
                _ => {
                    unsupported.push(item);
                    continue;
                }
            };
            if !sources.contains(&source) {
                sources.push(source);
            }
        }
        if !unsupported.is_empty() {
            unsupported.sort();
            return Err(Error::InvalidInput(format!(
                "unsupported session source: {}",
                unsupported.join(", ")
            )));
        }
        if sources.is_empty() {
            return Err(Error::InvalidInput("--sources must not be empty".to_string()));
        }
        sources.sort();
        Ok(sources)
    }
}

/// The calendar day being summarized, in the local offset.
#[derive(Debug, Clone, Copy)]
pub struct TargetDay {
    pub date: Date,
    pub offset: UtcOffset,
}

impl TargetDay {
    pub fn new(date: Date, offset: UtcOffset) -> Self {
        Self { date, offset }
    }

    /// `YYYY-MM-DD`.
    pub fn parse(raw: &str, offset: UtcOffset) -> Result<Self> {
        let date = Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
            .map_err(|_| Error::InvalidInput(format!("invalid date (expected YYYY-MM-DD): {raw}")))?;
        Ok(Self::new(date, offset))
    }

    /// Timestamp of a log line when it falls on this day.
    pub fn timestamp(&self, value: Option<&Value>) -> Option<OffsetDateTime> {
        parse_timestamp(value?, self.offset).filter(|ts| ts.date() == self.date)
    }
}

/// RFC 3339 timestamps are moved into `offset`; naive ones are taken as
/// already local.
pub fn parse_timestamp(value: &Value, offset: UtcOffset) -> Option<OffsetDateTime> {
    let raw = value.as_str()?.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(ts.to_offset(offset));
    }
    let naive = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
    );
    PrimitiveDateTime::parse(raw, naive)
        .ok()
        .map(|ts| ts.assume_offset(offset))
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub source: SessionSource,
    pub session_id: String,
    pub file_path: PathBuf,
    pub cwd: String,
    pub first_ts: Option<OffsetDateTime>,
    pub last_ts: Option<OffsetDateTime>,
    pub user_texts: Vec<String>,
    pub commands: Vec<String>,
}

impl SessionRecord {
    pub fn new(source: SessionSource, file_path: &Path) -> Self {
        let session_id = file_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            source,
            session_id,
            file_path: file_path.to_path_buf(),
            cwd: String::new(),
            first_ts: None,
            last_ts: None,
            user_texts: Vec::new(),
            commands: Vec::new(),
        }
    }

    fn mark(&mut self, ts: OffsetDateTime) {
        if self.first_ts.map_or(true, |first| ts < first) {
            self.first_ts = Some(ts);
        }
        if self.last_ts.map_or(true, |last| ts > last) {
            self.last_ts = Some(ts);
        }
    }

    /// Latest activity, for newest-first ordering.
    pub fn sort_key(&self) -> Option<OffsetDateTime> {
        self.last_ts.or(self.first_ts)
    }

    /// Final checks shared by both sources.
    fn finish(mut self, saw_target_event: bool, cfg: &DiaryConfig) -> Option<Self> {
        if !saw_target_event || cfg.excludes_cwd(&self.cwd) {
            return None;
        }
        if self.cwd.is_empty() {
            self.cwd = UNKNOWN_CWD.to_string();
        }
        if self.user_texts.is_empty() && self.commands.is_empty() {
            return None;
        }
        Some(self)
    }
}

/// Lines decoded lossily; a read error ends the file.
struct LossyLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> Iterator for LossyLines<R> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => Some(String::from_utf8_lossy(&self.buf).into_owned()),
            Err(e) => {
                debug!(error = %e, "stopped reading session log");
                None
            }
        }
    }
}

fn lines<R: BufRead>(reader: R) -> LossyLines<R> {
    LossyLines {
        reader,
        buf: Vec::new(),
    }
}

fn too_long(line: &str) -> bool {
    line.len() > MAX_LINE_CHARS && line.chars().count() > MAX_LINE_CHARS
}

/// A JSON object, or nothing.
fn parse_object(line: &str) -> Option<Value> {
    serde_json::from_str::<Value>(line)
        .ok()
        .filter(Value::is_object)
}

fn non_empty_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Strings under `text`/`content`, recursively, skipping tool results.
pub fn extract_texts(node: &Value, out: &mut Vec<String>) {
    match node {
        Value::String(s) => out.push(s.clone()),
        Value::Array(items) => items.iter().for_each(|item| extract_texts(item, out)),
        Value::Object(map) => {
            if map.get("type").and_then(Value::as_str) == Some("tool_result") {
                return;
            }
            if let Some(text) = map.get("text").and_then(Value::as_str) {
                out.push(text.to_string());
            }
            if let Some(content) = map.get("content") {
                extract_texts(content, out);
            }
        }
        _ => {}
    }
}

/// Function-call arguments arrive as an object or as a JSON string.
fn call_arguments(arguments: Option<&Value>) -> Value {
    match arguments {
        Some(v @ Value::Object(_)) => v.clone(),
        Some(Value::String(s)) => parse_object(s.trim()).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// Shell commands issued by one Codex function call.
pub fn commands_from_function_call(name: &str, arguments: Option<&Value>) -> Vec<String> {
    let args = call_arguments(arguments);
    let lowered = name.to_lowercase();

    if lowered.ends_with("exec_command") {
        return args
            .get("cmd")
            .and_then(Value::as_str)
            .map(|cmd| vec![cmd.to_string()])
            .unwrap_or_default();
    }
    if lowered.ends_with("parallel") {
        let Some(uses) = args.get("tool_uses").and_then(Value::as_array) else {
            return Vec::new();
        };
        return uses
            .iter()
            .filter(|u| {
                u.get("recipient_name")
                    .and_then(Value::as_str)
                    .is_some_and(|r| r.to_lowercase().ends_with("exec_command"))
            })
            .filter_map(|u| u.get("parameters")?.get("cmd")?.as_str())
            .map(str::to_string)
            .collect();
    }
    if lowered == "apply_patch" || lowered == "functions.apply_patch" {
        return vec!["apply_patch".to_string()];
    }
    Vec::new()
}

/// One line per Claude `tool_use`: the bash command itself, or the tool
/// with its main argument. Read-only tools give nothing.
pub fn command_from_tool_use(tool_name: &str, input: Option<&Value>) -> String {
    let lowered = tool_name.to_lowercase();
    if CLAUDE_READONLY_TOOLS.contains(&lowered.as_str()) {
        return String::new();
    }
    let Some(input) = input.filter(|v| v.is_object()) else {
        return tool_name.to_string();
    };
    if lowered == "bash" {
        if let Some(command) = input.get("command").and_then(Value::as_str) {
            return command.to_string();
        }
    }
    ["file_path", "path", "command", "pattern"]
        .iter()
        .find_map(|key| non_empty_str(input, key))
        .map(|value| format!("{tool_name} {value}"))
        .unwrap_or_else(|| tool_name.to_string())
}

fn open(path: &Path) -> Option<BufReader<File>> {
    match File::open(path) {
        Ok(file) => Some(BufReader::new(file)),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "cannot open session log");
            None
        }
    }
}

pub fn parse_codex_file(path: &Path, day: &TargetDay, cfg: &DiaryConfig) -> Option<SessionRecord> {
    if cfg.excludes_path(path) {
        return None;
    }
    parse_codex(open(path)?, path, day, cfg)
}

pub fn parse_claude_file(path: &Path, day: &TargetDay, cfg: &DiaryConfig) -> Option<SessionRecord> {
    if cfg.excludes_path(path) {
        return None;
    }
    parse_claude(open(path)?, path, day, cfg)
}

/// Codex rollout log: a `session_meta` header, then `response_item` and
/// `function_call` events.
pub fn parse_codex<R: BufRead>(
    reader: R,
    path: &Path,
    day: &TargetDay,
    cfg: &DiaryConfig,
) -> Option<SessionRecord> {
    let mut record = SessionRecord::new(SessionSource::Codex, path);
    let mut saw_target_event = false;

    for line in lines(reader) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.contains(r#""type":"session_meta""#) {
            let payload = parse_object(line).and_then(|d| d.get("payload").cloned());
            if let Some(payload) = payload.filter(Value::is_object) {
                if let Some(id) = non_empty_str(&payload, "id") {
                    record.session_id = id.to_string();
                }
                if let Some(cwd) = non_empty_str(&payload, "cwd") {
                    if cfg.excludes_cwd(cwd) {
                        return None;
                    }
                    record.cwd = cwd.to_string();
                }
            }
            continue;
        }
        if too_long(line) {
            continue;
        }
        let Some(data) = parse_object(line) else {
            continue;
        };
        let Some(ts) = day.timestamp(data.get("timestamp")) else {
            continue;
        };
        saw_target_event = true;
        record.mark(ts);

        let call = match data.get("type").and_then(Value::as_str) {
            Some("response_item") => {
                let Some(payload) = data.get("payload").filter(|p| p.is_object()) else {
                    continue;
                };
                match payload.get("type").and_then(Value::as_str) {
                    Some("message")
                        if payload.get("role").and_then(Value::as_str) == Some("user") =>
                    {
                        let mut texts = Vec::new();
                        if let Some(content) = payload.get("content") {
                            extract_texts(content, &mut texts);
                        }
                        for text in texts {
                            append_unique(
                                &mut record.user_texts,
                                sanitize_user_text(&text),
                                cfg.max_user_messages_per_session,
                            );
                        }
                        continue;
                    }
                    Some("function_call") => payload,
                    _ => continue,
                }
            }
            Some("function_call") => &data,
            _ => continue,
        };

        let name = call.get("name").map(call_name).unwrap_or_default();
        for command in commands_from_function_call(&name, call.get("arguments")) {
            append_unique(
                &mut record.commands,
                sanitize_command(&command),
                cfg.max_commands_per_session,
            );
        }
    }

    record.finish(saw_target_event, cfg)
}

fn call_name(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Claude project log: `user` messages and `assistant` tool uses.
pub fn parse_claude<R: BufRead>(
    reader: R,
    path: &Path,
    day: &TargetDay,
    cfg: &DiaryConfig,
) -> Option<SessionRecord> {
    let mut record = SessionRecord::new(SessionSource::Claude, path);
    let mut saw_target_event = false;

    for line in lines(reader) {
        let line = line.trim();
        if line.is_empty() || too_long(line) {
            continue;
        }
        let Some(data) = parse_object(line) else {
            continue;
        };
        let Some(ts) = day.timestamp(data.get("timestamp")) else {
            continue;
        };
        saw_target_event = true;
        record.mark(ts);

        if let Some(cwd) = non_empty_str(&data, "cwd") {
            if record.cwd.is_empty() {
                record.cwd = cwd.to_string();
            }
            if cfg.excludes_cwd(cwd) {
                return None;
            }
        }
        if let Some(id) = non_empty_str(&data, "sessionId") {
            record.session_id = id.to_string();
        }

        let Some(message) = data.get("message").filter(|m| m.is_object()) else {
            continue;
        };
        match data.get("type").and_then(Value::as_str) {
            Some("user") => {
                let mut texts = Vec::new();
                if let Some(content) = message.get("content") {
                    extract_texts(content, &mut texts);
                }
                for text in texts {
                    append_unique(
                        &mut record.user_texts,
                        sanitize_user_text(&text),
                        cfg.max_user_messages_per_session,
                    );
                }
            }
            Some("assistant") => {
                let Some(content) = message.get("content").and_then(Value::as_array) else {
                    continue;
                };
                for item in content {
                    if item.get("type").and_then(Value::as_str) != Some("tool_use") {
                        continue;
                    }
                    let name = item.get("name").map(call_name).unwrap_or_default();
                    let command = command_from_tool_use(&name, item.get("input"));
                    append_unique(
                        &mut record.commands,
                        sanitize_command(&command),
                        cfg.max_commands_per_session,
                    );
                }
            }
            _ => {}
        }
    }

    record.finish(saw_target_event, cfg)
}
