//! Flattening of the `device_follow` payload into display records.

use crate::base::error::{Error, Result};
use crate::json::access::{scalar_text, ValueExt};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub username: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Media {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tweet {
    pub id: String,
    pub author: Author,
    pub text: String,
    pub created_at: String,
    pub like_count: u64,
    pub retweet_count: u64,
    pub reply_count: u64,
    pub url: String,
    pub media: Vec<Media>,
}

/// Entry content paths that may carry the tweet id.
const ENTRY_ID_PATHS: &[&[&str]] = &[
    &["content", "item", "content", "tweet", "id"],
    &["content", "itemContent", "tweet", "id"],
    &["content", "itemContent", "tweet_results", "result", "rest_id"],
];

const ENTRY_ID_PREFIXES: &[&str] = &["tweet-", "sq-I-t-"];

static EMPTY_MAP: std::sync::OnceLock<Map<String, Value>> = std::sync::OnceLock::new();

fn empty_map() -> &'static Map<String, Value> {
    EMPTY_MAP.get_or_init(Map::new)
}

/// Normalize at most `count` tweets, in display order.
pub fn parse_timeline(payload: &Value, count: usize) -> Result<Vec<Tweet>> {
    if !payload.is_object() {
        return Err(Error::UnexpectedShape(
            "timeline payload is not a JSON object".to_string(),
        ));
    }

    let globals = payload.get("globalObjects");
    let users = globals
        .and_then(|g| g.object("users"))
        .unwrap_or_else(|| empty_map());
    let tweets = globals
        .and_then(|g| g.object("tweets"))
        .unwrap_or_else(|| empty_map());

    let mut out = Vec::new();
    for id in ordered_tweet_ids(payload, tweets) {
        if out.len() >= count {
            break;
        }
        let Some(raw) = tweets.get(&id).filter(|t| t.is_object()) else {
            continue;
        };
        out.push(build_tweet(id, raw, users));
    }
    Ok(out)
}

fn build_tweet(id: String, raw: &Value, users: &Map<String, Value>) -> Tweet {
    let user_id = raw.first_text(&["user_id_str", "user_id"]);
    let user = users.get(&user_id).filter(|u| u.is_object());
    let user_text = |key: &str| user.map(|u| u.text(key)).unwrap_or_default();

    let mut username = user_text("screen_name");
    if username.is_empty() {
        username = "unknown".to_string();
    }
    let mut name = user_text("name");
    if name.is_empty() {
        name = username.clone();
    }

    Tweet {
        url: format!("https://x.com/{username}/status/{id}"),
        text: normalize_text(raw),
        created_at: raw.text("created_at"),
        like_count: raw.count("favorite_count"),
        retweet_count: raw.count("retweet_count"),
        reply_count: raw.count("reply_count"),
        media: pick_media(raw),
        author: Author { username, name },
        id,
    }
}

/// Ranked ids from the timeline instructions, else all tweet ids by
/// numeric id descending.
pub fn ordered_tweet_ids(payload: &Value, tweets: &Map<String, Value>) -> Vec<String> {
    let mut ranked: Vec<(u64, String)> = Vec::new();
    let instructions = payload
        .get("timeline")
        .map(|t| t.list("instructions"))
        .unwrap_or_default();

    for instruction in instructions {
        let entries = instruction
            .get("addEntries")
            .filter(|a| a.is_object())
            .and_then(|a| a.get("entries"))
            .or_else(|| instruction.get("entries"))
            .and_then(Value::as_array);
        let Some(entries) = entries else {
            continue;
        };
        for entry in entries.iter().filter(|e| e.is_object()) {
            let Some(id) = tweet_id_from_entry(entry) else {
                continue;
            };
            if !tweets.contains_key(&id) {
                continue;
            }
            let rank = match entry.get("sortIndex") {
                Some(Value::String(s)) if is_digits(s) => s.parse().unwrap_or(0),
                _ => 0,
            };
            ranked.push((rank, id));
        }
    }

    if ranked.is_empty() {
        let mut ids: Vec<(u128, &String)> = tweets
            .keys()
            .map(|k| (k.parse().unwrap_or(0), k))
            .collect();
        ids.sort_by(|a, b| b.0.cmp(&a.0));
        return ids.into_iter().map(|(_, k)| k.clone()).collect();
    }

    // Stable: equal ranks keep their first-seen order.
    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    let mut seen = HashSet::new();
    ranked
        .into_iter()
        .filter_map(|(_, id)| seen.insert(id.clone()).then_some(id))
        .collect()
}

pub fn tweet_id_from_entry(entry: &Value) -> Option<String> {
    let entry_id = entry.first_text(&["entryId", "entry_id"]);
    if let Some(id) = id_after_prefix(&entry_id) {
        return Some(id);
    }
    ENTRY_ID_PATHS.iter().find_map(|path| {
        let id = entry.at(path).map(scalar_text)?;
        is_digits(&id).then_some(id)
    })
}

/// Digits following the leftmost `tweet-`/`sq-I-t-` marker that has any.
fn id_after_prefix(entry_id: &str) -> Option<String> {
    (0..entry_id.len())
        .filter(|&i| entry_id.is_char_boundary(i))
        .find_map(|i| {
            let rest = &entry_id[i..];
            let prefix = ENTRY_ID_PREFIXES.iter().find(|p| rest.starts_with(**p))?;
            let digits: String = rest[prefix.len()..]
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            (!digits.is_empty()).then_some(digits)
        })
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Media of a tweet: best MP4 variant for video/GIF, else the image URL.
pub fn pick_media(tweet: &Value) -> Vec<Media> {
    let entities = ["extended_entities", "entities"]
        .iter()
        .filter_map(|k| tweet.get(*k))
        .find(|e| e.as_object().is_some_and(|o| !o.is_empty()));
    let Some(items) = entities.and_then(|e| e.get("media")).and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for item in items.iter().filter(|i| i.is_object()) {
        let mut kind = item.text("type");
        if kind.is_empty() {
            kind = "media".to_string();
        }

        if kind == "video" || kind == "animated_gif" {
            if let Some(url) = best_mp4_variant(item) {
                out.push(Media { kind, url });
                continue;
            }
        }

        let url = item.first_text(&["media_url_https", "media_url"]);
        if !url.is_empty() {
            out.push(Media { kind, url });
        }
    }
    out
}

fn best_mp4_variant(item: &Value) -> Option<String> {
    let variants = item.get("video_info").map(|v| v.list("variants"))?;
    let mut best: Option<(i64, String)> = None;
    for variant in variants {
        if variant.get("content_type").and_then(Value::as_str) != Some("video/mp4") {
            continue;
        }
        let url = variant.text("url");
        if url.is_empty() {
            continue;
        }
        let bitrate = variant
            .int("bitrate")
            .or_else(|| variant.get("bitrate").and_then(Value::as_f64).map(|f| f as i64))
            .unwrap_or(0);
        // Strictly greater: ties keep the first variant.
        if best.as_ref().map_or(true, |(b, _)| bitrate > *b) {
            best = Some((bitrate, url));
        }
    }
    best.map(|(_, url)| url)
}

/// Tweet text, trimmed, with HTML entities decoded. Markup-like text is
/// kept as written.
pub fn normalize_text(tweet: &Value) -> String {
    let text = tweet.first_text(&["full_text", "text"]);
    html_escape::decode_html_entities(text.trim()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_id_forms() {
        assert_eq!(
            tweet_id_from_entry(&json!({"entryId": "tweet-123"})),
            Some("123".into())
        );
        assert_eq!(
            tweet_id_from_entry(&json!({"entry_id": "sq-I-t-456"})),
            Some("456".into())
        );
        assert_eq!(
            tweet_id_from_entry(&json!({"entryId": "tweet-x tweet-789"})),
            Some("789".into())
        );
        assert_eq!(
            tweet_id_from_entry(&json!({
                "entryId": "cursor-top",
                "content": {"itemContent": {"tweet_results": {"result": {"rest_id": "42"}}}}
            })),
            Some("42".into())
        );
        assert_eq!(
            tweet_id_from_entry(&json!({"content": {"item": {"content": {"tweet": {"id": 7}}}}})),
            Some("7".into())
        );
        assert_eq!(tweet_id_from_entry(&json!({"entryId": "cursor-1"})), None);
    }

    #[test]
    fn test_best_variant_ties_keep_first() {
        let item = json!({
            "type": "video",
            "video_info": {"variants": [
                {"content_type": "application/x-mpegURL", "url": "https://v/hls", "bitrate": 9000},
                {"content_type": "video/mp4", "url": "https://v/a", "bitrate": 832000},
                {"content_type": "video/mp4", "url": "https://v/b", "bitrate": 832000},
                {"content_type": "video/mp4", "url": "https://v/low", "bitrate": 256000}
            ]}
        });
        assert_eq!(best_mp4_variant(&item), Some("https://v/a".into()));
    }

    #[test]
    fn test_float_bitrates_are_ranked() {
        let item = json!({
            "video_info": {"variants": [
                {"content_type": "video/mp4", "url": "https://v/low", "bitrate": 256000},
                {"content_type": "video/mp4", "url": "https://v/high", "bitrate": 832000.0},
                {"content_type": "video/mp4", "url": "https://v/mid", "bitrate": "512000"}
            ]}
        });
        assert_eq!(best_mp4_variant(&item), Some("https://v/high".into()));
    }

    #[test]
    fn test_text_keeps_markup_and_decodes_entities() {
        let tweet = json!({"full_text": "  use <b>bold</b> &amp; <T> generics &lt;3  "});
        assert_eq!(normalize_text(&tweet), "use <b>bold</b> & <T> generics <3");

        let tweet = json!({"full_text": "", "text": "fish &amp; chips &#39;n&#x27; more"});
        assert_eq!(normalize_text(&tweet), "fish & chips 'n' more");
    }

    #[test]
    fn test_media_falls_back_to_entities() {
        let tweet = json!({
            "extended_entities": {},
            "entities": {"media": [{"type": "photo", "media_url_https": "https://p/1.jpg"}]}
        });
        assert_eq!(
            pick_media(&tweet),
            vec![Media {
                kind: "photo".into(),
                url: "https://p/1.jpg".into()
            }]
        );
    }

    #[test]
    fn test_video_without_mp4_uses_image() {
        let tweet = json!({"extended_entities": {"media": [
            {"type": "animated_gif", "media_url": "http://p/g.jpg", "video_info": {"variants": []}}
        ]}});
        let media = pick_media(&tweet);
        assert_eq!(media[0].kind, "animated_gif");
        assert_eq!(media[0].url, "http://p/g.jpg");
    }

    #[test]
    fn test_text_entities_decoded() {
        let tweet = json!({"full_text": "  a &amp; b &lt;3 &quot;ok&quot; "});
        assert_eq!(normalize_text(&tweet), "a & b <3 \"ok\"");
        assert_eq!(normalize_text(&json!({"text": "plain"})), "plain");
    }

    #[test]
    fn test_author_defaults() {
        let payload = json!({"globalObjects": {
            "tweets": {"1": {"full_text": "hi", "user_id_str": "9"}},
            "users": {}
        }});
        let tweets = parse_timeline(&payload, 10).unwrap();
        assert_eq!(tweets[0].author.username, "unknown");
        assert_eq!(tweets[0].author.name, "unknown");
        assert_eq!(tweets[0].url, "https://x.com/unknown/status/1");
    }

    #[test]
    fn test_non_object_payload() {
        assert!(matches!(
            parse_timeline(&json!([1, 2]), 5),
            Err(Error::UnexpectedShape(_))
        ));
    }
}
