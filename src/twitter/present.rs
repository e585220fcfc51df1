use crate::base::error::{Error, Result};
use crate::twitter::normalize::Tweet;
use serde::Serialize;
use std::fmt;

pub const EMPTY_TIMELINE_MESSAGE: &str = "No tweets found in device_follow timeline.";

/// How the timeline is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    RawJson,
}

pub fn media_label(kind: &str) -> &'static str {
    match kind {
        "video" => "VIDEO",
        "animated_gif" => "GIF",
        _ => "PHOTO",
    }
}

/// Human-readable listing, one block per tweet.
pub fn render_text(tweets: &[Tweet]) -> String {
    if tweets.is_empty() {
        return format!("{EMPTY_TIMELINE_MESSAGE}\n");
    }
    tweets.iter().map(|t| TweetBlock(t).to_string()).collect()
}

struct TweetBlock<'a>(&'a Tweet);

impl fmt::Display for TweetBlock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tweet = self.0;
        writeln!(f, "\n@{} ({}):", tweet.author.username, tweet.author.name)?;
        writeln!(f, "{}", tweet.text)?;
        for media in &tweet.media {
            writeln!(f, "{}: {}", media_label(&media.kind), media.url)?;
        }
        if !tweet.created_at.is_empty() {
            writeln!(f, "date: {}", tweet.created_at)?;
        }
        writeln!(
            f,
            "likes: {}  retweets: {}  replies: {}",
            tweet.like_count, tweet.retweet_count, tweet.reply_count
        )?;
        writeln!(f, "url: {}", tweet.url)?;
        writeln!(f, "{}", "-".repeat(50))
    }
}

/// Pretty JSON, non-ASCII kept as-is.
pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map(|s| s + "\n")
        .map_err(|e| Error::UnexpectedShape(format!("cannot serialize output: {e}")))
}
