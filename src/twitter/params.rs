use crate::base::error::{Error, Result};
use crate::urlrequest::request::QueryParams;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://x.com/i/api/2/notifications/device_follow.json";

/// Public web-client bearer token.
pub const DEFAULT_BEARER_TOKEN: &str = "AAAAAAAAAAAAAAAAAAAAANRILgAAAAAAnNwIzUejRCOuH5E6I8xnZz4puTs%3D1Zv7ttfk8LF81IUq16cHjhLTvJu4FA33AGWWjCpTnA";

pub const DEFAULT_REFERER: &str = "https://x.com/i/timeline";

/// Query sent by the web client for this endpoint. A captured
/// `--request-url` replaces it entirely.
pub const DEFAULT_QUERY_PARAMS: &[(&str, &str)] = &[
    ("count", "20"),
    ("include_profile_interstitial_type", "1"),
    ("include_blocking", "1"),
    ("include_blocked_by", "1"),
    ("include_followed_by", "1"),
    ("include_want_retweets", "1"),
    ("include_mute_edge", "1"),
    ("include_can_dm", "1"),
    ("include_can_media_tag", "1"),
    ("include_ext_has_nft_avatar", "1"),
    ("include_ext_is_blue_verified", "1"),
    ("include_ext_verified_type", "1"),
    ("include_ext_profile_image_shape", "1"),
    ("include_cards", "1"),
    ("cards_platform", "Web-12"),
    ("tweet_mode", "extended"),
    ("include_entities", "true"),
    ("include_user_entities", "true"),
    ("include_ext_alt_text", "true"),
    ("include_ext_media_color", "true"),
    ("include_ext_media_availability", "true"),
    ("include_ext_sensitive_media_warning", "true"),
    ("include_ext_trusted_friends_metadata", "true"),
    ("include_quote_count", "true"),
    ("include_reply_count", "1"),
    ("simple_quoted_tweet", "true"),
    ("send_error_codes", "true"),
    (
        "ext",
        "mediaStats,highlightedLabel,hasNftAvatar,voiceInfo,superFollowMetadata",
    ),
];

/// The final request URL and whether the built-in query was used.
#[derive(Debug, Clone)]
pub struct TimelineUrl {
    pub url: Url,
    pub used_default_query: bool,
}

impl TimelineUrl {
    pub fn param_count(&self) -> usize {
        QueryParams::from_url(&self.url).len()
    }
}

/// Build the request URL: captured or default query, then overrides in
/// order, then `count` last so no override can shadow it.
pub fn build_request_url(
    request_url: Option<&str>,
    overrides: &[(String, String)],
    count: u32,
) -> Result<TimelineUrl> {
    let (mut url, mut query, used_default_query) = match request_url {
        Some(raw) => {
            let url = Url::parse(raw.trim()).map_err(|e| {
                Error::InvalidUrl(format!("invalid --request-url, expected absolute URL: {e}"))
            })?;
            if !url.has_host() {
                return Err(Error::InvalidUrl(
                    "invalid --request-url, expected absolute URL with a host".to_string(),
                ));
            }
            let query = QueryParams::from_url(&url);
            (url, query, false)
        }
        None => {
            let url = Url::parse(DEFAULT_ENDPOINT)
                .map_err(|e| Error::InvalidUrl(format!("{DEFAULT_ENDPOINT}: {e}")))?;
            let query = QueryParams::from_pairs(DEFAULT_QUERY_PARAMS.iter().copied());
            (url, query, true)
        }
    };

    query.extend(overrides);
    if count > 0 {
        query.set("count", &count.to_string());
    }
    query.apply_to(&mut url);

    Ok(TimelineUrl {
        url,
        used_default_query,
    })
}

/// `Bearer <token>`, unless the value already carries the scheme.
pub fn normalize_bearer_token(value: &str) -> String {
    let token = value.trim();
    if token
        .get(..7)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("bearer "))
    {
        token.to_string()
    } else {
        format!("Bearer {token}")
    }
}
