//! linux.do subcommands. Each returns the text to print.

use crate::base::error::{Error, Result};
use crate::json::access::ValueExt;
use crate::linuxdo::client::LinuxDoClient;
use crate::linuxdo::format::{
    category_name, field_or_dash, format_search_topic, format_topic, parse_topic_ref, post_likes,
    strip_html, truncate, CategoryTarget, BASE_URL, KNOWN_CATEGORIES,
};
use serde_json::Value;
use tracing::debug;

/// Posts per page of a topic's post stream.
pub const POSTS_PER_PAGE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Period {
    Daily,
    #[default]
    Weekly,
    Monthly,
    Yearly,
    All,
}

impl Period {
    pub fn as_str(self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
            Period::Yearly => "yearly",
            Period::All => "all",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ListOptions {
    pub limit: usize,
    pub page: u32,
    pub chars: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct TopicOptions {
    pub posts: usize,
    pub chars: usize,
    pub page: usize,
}

pub async fn whoami(client: &LinuxDoClient) -> Result<String> {
    let data = client.get_json("/session/current.json").await?;
    let user = data
        .get("current_user")
        .filter(|u| u.as_object().is_some_and(|o| !o.is_empty()))
        .ok_or_else(|| {
            Error::credentials_unavailable(
                "not logged in (cookie missing, invalid or expired); pass --cookie or --cookie-file",
            )
        })?;

    let username = user.text("username");
    Ok(format!(
        "Username: {}\n  Name: {}\n  Trust level: {}\n  Unread notifications: {}\n  Link: {BASE_URL}/u/{username}\n",
        field_or_dash(user, "username"),
        field_or_dash(user, "name"),
        field_or_dash(user, "trust_level"),
        user.count("unread_notifications"),
    ))
}

/// Topic list of a `topic_list` response, or `empty_message`.
fn render_topic_list(data: &Value, limit: usize, chars: usize, empty_message: &str) -> String {
    let topics = data
        .get("topic_list")
        .map(|t| t.list("topics"))
        .unwrap_or_default();
    if topics.is_empty() {
        return format!("{empty_message}\n");
    }
    let users = data.list("users");
    let mut out = String::new();
    for topic in topics.iter().take(limit) {
        out.push_str(&format!("{}\n\n", format_topic(topic, users, chars)));
    }
    out
}

pub async fn latest(client: &LinuxDoClient, opts: ListOptions) -> Result<String> {
    let data = client
        .get_json(&format!("/latest.json?page={}", opts.page))
        .await?;
    Ok(render_topic_list(&data, opts.limit, opts.chars, "No topics found."))
}

pub async fn top(client: &LinuxDoClient, period: Period, opts: ListOptions) -> Result<String> {
    let data = client
        .get_json(&format!("/top.json?period={}", period.as_str()))
        .await?;
    let empty = format!("No {} top topics found.", period.as_str());
    Ok(render_topic_list(&data, opts.limit, opts.chars, &empty))
}

pub async fn search(client: &LinuxDoClient, query: &str, opts: ListOptions) -> Result<String> {
    let query = query.trim();
    if query.is_empty() {
        return Err(Error::InvalidInput(
            "search query must not be empty".to_string(),
        ));
    }
    let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    let data = client
        .get_json(&format!("/search.json?q={}", encoded.replace('+', "%20")))
        .await?;

    let topics = data.list("topics");
    let posts = data.list("posts");
    if topics.is_empty() && posts.is_empty() {
        return Ok(format!("No results for \"{query}\".\n"));
    }

    let mut out = String::new();
    if !topics.is_empty() {
        out.push_str(&format!("=== Topics ({}) ===\n", topics.len()));
        for topic in topics.iter().take(opts.limit) {
            out.push_str(&format!("{}\n\n", format_search_topic(topic)));
        }
    }
    if !posts.is_empty() {
        out.push_str(&format!("=== Posts ({}) ===\n", posts.len()));
        for post in posts.iter().take(opts.limit) {
            let tid = field_or_dash(post, "topic_id");
            out.push_str(&format!("[topic:{tid}] @{}\n", field_or_dash(post, "username")));
            let blurb = strip_html(&post.text("blurb"));
            if !blurb.is_empty() {
                out.push_str(&format!("  Content: {}\n", truncate(&blurb, opts.chars)));
            }
            let post_number = post.int("post_number").unwrap_or(1);
            out.push_str(&format!("  Link: {BASE_URL}/t/{tid}/{post_number}\n\n"));
        }
    }
    Ok(out)
}

pub async fn topic(client: &LinuxDoClient, reference: &str, opts: TopicOptions) -> Result<String> {
    let topic_id = parse_topic_ref(reference)?;
    let data = client.get_json(&format!("/t/{topic_id}.json")).await?;

    let mut meta = Vec::new();
    if let Some(cat) = data.int("category_id").and_then(|id| category_name(id as u64)) {
        meta.push(format!("Category: {cat}"));
    }
    meta.push(format!("Replies: {}", data.count("reply_count")));
    meta.push(format!("Views: {}", data.count("views")));
    meta.push(format!("Likes: {}", data.count("like_count")));
    meta.push(format!("Created: {}", field_or_dash(&data, "created_at")));

    let mut out = String::new();
    out.push_str(&format!("Topic: {}\n", data.first_text(&["title", "fancy_title"])));
    out.push_str(&format!("  {}\n", meta.join(" | ")));
    out.push_str(&format!("  Link: {BASE_URL}/t/{topic_id}\n\n"));

    let stream = data.get("post_stream");
    let mut posts: Vec<Value> = stream
        .map(|s| s.list("posts").to_vec())
        .unwrap_or_default();

    if opts.page > 0 {
        let ids = stream.map(|s| s.list("stream")).unwrap_or_default();
        let start = opts.page.saturating_mul(POSTS_PER_PAGE);
        let chunk: Vec<String> = ids
            .iter()
            .skip(start)
            .take(POSTS_PER_PAGE)
            .map(crate::json::access::scalar_text)
            .collect();
        debug!(page = opts.page, posts = chunk.len(), "fetching topic page");
        if !chunk.is_empty() {
            let query = chunk
                .iter()
                .map(|id| format!("post_ids[]={id}"))
                .collect::<Vec<_>>()
                .join("&");
            let extra = client
                .get_json(&format!("/t/{topic_id}/posts.json?{query}"))
                .await?;
            posts = extra
                .get("post_stream")
                .map(|s| s.list("posts").to_vec())
                .unwrap_or_default();
        }
    }

    if posts.is_empty() {
        out.push_str("No posts found.\n");
        return Ok(out);
    }

    for (idx, post) in posts.iter().take(opts.posts).enumerate() {
        let number = post
            .int("post_number")
            .unwrap_or(idx as i64 + 1);
        out.push_str(&format!(
            "[#{number}] @{} | Time: {} | Likes: {}\n",
            field_or_dash(post, "username"),
            field_or_dash(post, "created_at"),
            post_likes(post)
        ));
        let content = strip_html(&post.text("cooked"));
        if !content.is_empty() {
            out.push_str(&format!("  {}\n", truncate(&content, opts.chars)));
        }
        out.push('\n');
    }
    Ok(out)
}

pub async fn category(
    client: &LinuxDoClient,
    reference: Option<&str>,
    opts: ListOptions,
) -> Result<String> {
    let Some(reference) = reference.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(list_categories(client, opts.chars).await);
    };

    let target = CategoryTarget::resolve(reference);
    let data = client
        .get_json(&format!("{}/l/latest.json?page={}", target.path(), opts.page))
        .await?;

    let mut out = String::new();
    out.push_str(&format!("Category: {}\n", target.display));
    out.push_str(&format!("Link: {BASE_URL}{}\n\n", target.path()));
    out.push_str(&render_topic_list(&data, opts.limit, opts.chars, "No topics found."));
    Ok(out)
}

/// Live category list by topic count, or the built-in table when the
/// request fails.
async fn list_categories(client: &LinuxDoClient, chars: usize) -> String {
    let mut categories = match client.get_json("/categories.json").await {
        Ok(data) => data
            .get("category_list")
            .map(|c| c.list("categories").to_vec())
            .unwrap_or_default(),
        Err(e) => {
            debug!(error = %e, "category list unavailable, using built-in table");
            Vec::new()
        }
    };

    let mut out = String::new();
    if categories.is_empty() {
        for (slug, id, name) in KNOWN_CATEGORIES {
            out.push_str(&format!("[{id}] {name} ({slug})\n"));
        }
        return out;
    }

    // Stable: equal counts keep the server's order.
    categories.sort_by(|a, b| b.count("topic_count").cmp(&a.count("topic_count")));
    for c in &categories {
        out.push_str(&format!(
            "[{}] {} ({}) | Topics: {}\n",
            field_or_dash(c, "id"),
            c.text("name"),
            c.text("slug"),
            c.count("topic_count")
        ));
        let desc = strip_html(&c.first_text(&["description_text", "description"]));
        if !desc.is_empty() {
            out.push_str(&format!("  About: {}\n", truncate(&desc, chars)));
        }
    }
    out
}
