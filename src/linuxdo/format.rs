//! Text formatting for Discourse JSON.

use crate::base::error::{Error, Result};
use crate::json::access::{scalar_text, ValueExt};
use scraper::Html;
use serde_json::Value;

pub const BASE_URL: &str = "https://linux.do";

/// Built-in categories: (slug, id, display name).
pub const KNOWN_CATEGORIES: &[(&str, u64, &str)] = &[
    ("develop", 4, "开发调优"),
    ("domestic", 98, "国产替代"),
    ("resource", 14, "资源荟萃"),
    ("wiki", 42, "文档共建"),
    ("job", 27, "非我莫属"),
    ("reading", 32, "读书成诗"),
    ("news", 34, "前沿快讯"),
    ("feeds", 92, "网络记忆"),
    ("welfare", 36, "福利羊毛"),
    ("gossip", 11, "搞七捻三"),
    ("square", 110, "虫洞广场"),
    ("feedback", 2, "运营反馈"),
];

pub fn category_name(id: u64) -> Option<&'static str> {
    KNOWN_CATEGORIES
        .iter()
        .find(|(_, cid, _)| *cid == id)
        .map(|(_, _, name)| *name)
}

/// Category selected by slug or numeric id; unknown refs pass through as
/// a bare slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTarget {
    pub slug: String,
    pub id: Option<u64>,
    pub display: String,
}

impl CategoryTarget {
    pub fn resolve(reference: &str) -> Self {
        let reference = reference.trim();
        let numeric = reference.parse::<u64>().ok();
        KNOWN_CATEGORIES
            .iter()
            .find(|(slug, id, _)| *slug == reference || numeric == Some(*id))
            .map(|(slug, id, name)| Self {
                slug: slug.to_string(),
                id: Some(*id),
                display: format!("{name} ({slug})"),
            })
            .unwrap_or_else(|| Self {
                slug: reference.to_string(),
                id: None,
                display: reference.to_string(),
            })
    }

    /// `/c/<slug>[/<id>]`
    pub fn path(&self) -> String {
        match self.id {
            Some(id) => format!("/c/{}/{id}", self.slug),
            None => format!("/c/{}", self.slug),
        }
    }
}

/// Tags removed, entities decoded, whitespace collapsed.
pub fn strip_html(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    let text: Vec<&str> = fragment.root_element().text().collect();
    text.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trimmed, and cut to `max` characters with a trailing `...`.
pub fn truncate(raw: &str, max: usize) -> String {
    let text = raw.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}...", head.trim_end())
}

/// Topic id from a URL, `slug/id`, or a bare id.
pub fn parse_topic_ref(reference: &str) -> Result<u64> {
    let reference = reference.trim();

    let mut rest = reference;
    while let Some(pos) = rest.find("/t/") {
        let after = &rest[pos + 3..];
        if let Some((slug, tail)) = after.split_once('/') {
            let digits: String = tail.chars().take_while(char::is_ascii_digit).collect();
            if !slug.is_empty() && !digits.is_empty() {
                return parse_id(&digits);
            }
        }
        rest = after;
    }

    if let Some((slug, id)) = reference.split_once('/') {
        if !slug.is_empty() && is_digits(id) {
            return parse_id(id);
        }
    }
    if is_digits(reference) {
        return parse_id(reference);
    }
    Err(Error::InvalidInput(
        "cannot parse topic reference; expected a URL, slug/id or id".to_string(),
    ))
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_id(digits: &str) -> Result<u64> {
    digits
        .parse()
        .map_err(|_| Error::InvalidInput(format!("topic id out of range: {digits}")))
}

/// Display value of a scalar field, `-` when absent.
pub fn field_or_dash(value: &Value, key: &str) -> String {
    let text = value.get(key).map(scalar_text).unwrap_or_default();
    if text.is_empty() {
        "-".to_string()
    } else {
        text
    }
}

fn topic_author<'a>(topic: &Value, users: &'a [Value]) -> Option<&'a str> {
    let poster = topic.list("posters").first()?;
    let user_id = poster.get("user_id")?;
    users
        .iter()
        .find(|u| u.get("id") == Some(user_id))
        .and_then(|u| u.get("username"))
        .and_then(Value::as_str)
}

/// `Category: .. | Author: .. | Replies: .. | Views: ..`
fn topic_meta(topic: &Value, author: Option<&str>) -> String {
    let mut meta = Vec::new();
    if let Some(cat) = topic.int("category_id").and_then(|id| category_name(id as u64)) {
        meta.push(format!("Category: {cat}"));
    }
    if let Some(author) = author.filter(|a| !a.is_empty()) {
        meta.push(format!("Author: {author}"));
    }
    let replies = topic.int("posts_count").unwrap_or(1) - 1;
    meta.push(format!("Replies: {replies}"));
    meta.push(format!("Views: {}", topic.count("views")));
    meta.join(" | ")
}

/// One topic-list entry.
pub fn format_topic(topic: &Value, users: &[Value], chars: usize) -> String {
    let id = field_or_dash(topic, "id");
    let title = topic.first_text(&["title", "fancy_title"]);
    let mut lines = vec![
        format!("[{id}] {title}"),
        format!("  {}", topic_meta(topic, topic_author(topic, users))),
    ];
    let excerpt = strip_html(&topic.text("excerpt"));
    if !excerpt.is_empty() {
        lines.push(format!("  Excerpt: {}", truncate(&excerpt, chars)));
    }
    lines.push(format!("  Link: {BASE_URL}/t/{id}"));
    lines.join("\n")
}

/// Search-result topic: no author, no excerpt.
pub fn format_search_topic(topic: &Value) -> String {
    let id = field_or_dash(topic, "id");
    format!(
        "[{id}] {}\n  {}\n  Link: {BASE_URL}/t/{id}",
        topic.text("title"),
        topic_meta(topic, None)
    )
}

/// Likes of a post: the `actions_summary` entry with id 2.
pub fn post_likes(post: &Value) -> u64 {
    post.list("actions_summary")
        .iter()
        .find(|a| a.int("id") == Some(2))
        .map(|a| a.count("count"))
        .unwrap_or(0)
}
