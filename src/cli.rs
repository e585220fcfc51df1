//! Command-line definitions and dispatch.

use crate::base::error::{Error, Result};
use crate::base::platform::Platform;
use crate::base::runtime::run_blocking;
use crate::cookies::browser::ChromeCookieReader;
use crate::cookies::chromedb::CookieDbLocation;
use crate::cookies::credentials::{process_env, CredentialResolver, CredentialSpec, PartialCredential};
use crate::diary::{self, DiaryConfig, DiaryOptions, OutputMode, SessionRoots};
use crate::http::fetcher::Fetcher;
use crate::linuxdo::commands::{self as linuxdo_cmd, ListOptions, Period, TopicOptions};
use crate::linuxdo::cookie::{resolve_cookie, CookieOptions, COOKIE_FILE_ENV};
use crate::linuxdo::ua::resolve_user_agent;
use crate::linuxdo::{LinuxDoClient, DEFAULT_TIMEOUT_SECS};
use crate::statusline;
use crate::twitter::params::{DEFAULT_BEARER_TOKEN, DEFAULT_REFERER};
use crate::twitter::present::OutputFormat;
use crate::twitter::{self, TimelineOptions};
use crate::urlrequest::context::FetchConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use time::{OffsetDateTime, UtcOffset};
use tokio::io::AsyncReadExt;
use tracing::level_filters::LevelFilter;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "sessiontap", version)]
#[command(
    about = "Read X and linux.do with your Chrome session, and turn agent session logs into diary notes"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log level (error, warn, info, debug, trace). Overrides RUST_LOG.
    #[arg(long, global = true)]
    pub log_level: Option<LevelFilter>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the X/Twitter notified (device_follow) timeline
    Timeline(TimelineArgs),
    /// Read-only linux.do client
    Linuxdo(LinuxDoArgs),
    /// Aggregate today's Codex/Claude sessions into diary evidence
    Diary(DiaryArgs),
    /// Print a context-window gauge from the JSON on stdin
    Statusline,
}

#[derive(Args, Debug)]
pub struct TimelineArgs {
    /// Number of tweets to fetch
    #[arg(long, default_value_t = 20)]
    pub count: u32,
    /// HTTP timeout in milliseconds
    #[arg(long, default_value_t = 15_000)]
    pub timeout_ms: u64,
    /// auth_token cookie
    #[arg(long)]
    pub auth_token: Option<String>,
    /// ct0 cookie
    #[arg(long)]
    pub ct0: Option<String>,
    /// Chrome profile name
    #[arg(long, default_value = "Default")]
    pub chrome_profile: String,
    /// Chrome profile directory or a direct Cookies DB path
    #[arg(long)]
    pub chrome_profile_dir: Option<PathBuf>,
    /// Full captured request URL, for exact query parity
    #[arg(long)]
    pub request_url: Option<String>,
    /// Query parameter override, repeatable
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,
    /// Bearer token for the Authorization header
    #[arg(long, default_value = DEFAULT_BEARER_TOKEN, hide_default_value = true)]
    pub bearer_token: String,
    #[arg(long, default_value = DEFAULT_REFERER)]
    pub referer: String,
    /// Print parsed tweets as JSON
    #[arg(long, conflicts_with = "json_raw")]
    pub json: bool,
    /// Print the raw API response
    #[arg(long)]
    pub json_raw: bool,
}

#[derive(Args, Debug)]
pub struct LinuxDoArgs {
    /// Request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,
    /// Cookie header value
    #[arg(long)]
    pub cookie: Option<String>,
    /// Cookie file (Netscape format or a raw header)
    #[arg(long)]
    pub cookie_file: Option<PathBuf>,
    #[command(subcommand)]
    pub command: LinuxDoCommand,
}

#[derive(Subcommand, Debug)]
pub enum LinuxDoCommand {
    /// Show the logged-in user
    Whoami,
    /// Latest topics
    Latest {
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 140)]
        chars: usize,
    },
    /// Top topics for a period
    Top {
        #[arg(long, value_enum, default_value_t = Period::Weekly)]
        period: Period,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long, default_value_t = 140)]
        chars: usize,
    },
    /// Full-text search
    Search {
        query: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long, default_value_t = 140)]
        chars: usize,
    },
    /// One topic with its posts
    Topic {
        /// URL, slug/id or id
        topic: String,
        #[arg(long, default_value_t = 5)]
        posts: usize,
        #[arg(long, default_value_t = 300)]
        chars: usize,
        #[arg(long, default_value_t = 0)]
        page: usize,
    },
    /// Category list, or the latest topics of one category
    Category {
        category: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 140)]
        chars: usize,
    },
}

#[derive(Args, Debug)]
pub struct DiaryArgs {
    /// Day to summarize, YYYY-MM-DD (default: today)
    #[arg(long)]
    pub date: Option<String>,
    /// Obsidian vault root
    #[arg(long)]
    pub vault_root: Option<PathBuf>,
    #[arg(long, default_value = diary::DEFAULT_DIARY_DIR)]
    pub diary_dir: String,
    #[arg(long, default_value = diary::DEFAULT_TEMPLATE_NAME)]
    pub template_name: String,
    /// Comma-separated: codex,claude
    #[arg(long, default_value = diary::DEFAULT_SOURCES)]
    pub sources: String,
    /// Exclusion and limit config (JSON)
    #[arg(long)]
    pub exclude_config: Option<PathBuf>,
    #[arg(long, default_value = diary::DEFAULT_SECTION_TITLE)]
    pub section_title: String,
    #[arg(long, value_enum, default_value_t = OutputMode::Evidence)]
    pub output_mode: OutputMode,
    /// Deprecated: same as --output-mode evidence
    #[arg(long)]
    pub dry_run: bool,
}

impl TimelineArgs {
    fn options(&self) -> TimelineOptions {
        let format = if self.json_raw {
            OutputFormat::RawJson
        } else if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        };
        TimelineOptions {
            count: self.count,
            request_url: self.request_url.clone(),
            params: self.params.clone(),
            bearer_token: self.bearer_token.clone(),
            referer: self.referer.clone(),
            format,
        }
    }

    fn cookie_location(&self) -> CookieDbLocation {
        let location = CookieDbLocation::new().with_profile(self.chrome_profile.as_str());
        match &self.chrome_profile_dir {
            Some(dir) => location.with_profile_dir(dir.clone()),
            None => location,
        }
    }
}

impl From<DiaryArgs> for DiaryOptions {
    fn from(args: DiaryArgs) -> Self {
        let defaults = DiaryOptions::default();
        Self {
            date: args.date,
            vault_root: args.vault_root.unwrap_or(defaults.vault_root),
            diary_dir: args.diary_dir,
            template_name: args.template_name,
            sources: args.sources,
            exclude_config: args.exclude_config.unwrap_or_else(DiaryConfig::default_path),
            section_title: args.section_title,
            output_mode: args.output_mode,
            dry_run: args.dry_run,
        }
    }
}

async fn run_timeline(args: TimelineArgs) -> Result<String> {
    if args.timeout_ms == 0 {
        return Err(Error::InvalidInput(
            "--timeout-ms must be a positive integer".to_string(),
        ));
    }
    let config = FetchConfig::from_env().with_timeout(Duration::from_millis(args.timeout_ms));
    let fetcher = Fetcher::direct(&config);
    let opts = args.options();

    let location = args.cookie_location();
    let explicit = PartialCredential::new(args.auth_token.as_deref(), args.ct0.as_deref());
    let resolve = move || {
        run_blocking(move || {
            let spec = CredentialSpec::twitter();
            let store = ChromeCookieReader::new(location);
            CredentialResolver::new(&spec, Platform::current(), process_env)
                .resolve(explicit, &store)
        })
    };

    twitter::run_timeline(&opts, resolve, &fetcher).await
}

async fn run_linuxdo(args: LinuxDoArgs) -> Result<String> {
    let user_agent = resolve_user_agent(process_env).await;
    let config = FetchConfig::from_env()
        .with_timeout_secs(args.timeout)
        .with_user_agent(user_agent);

    let cookie_opts = CookieOptions {
        cookie: args.cookie,
        cookie_file: args
            .cookie_file
            .or_else(|| process_env(COOKIE_FILE_ENV).map(PathBuf::from)),
    };
    let (cookie, origin) = run_blocking(move || {
        let store = ChromeCookieReader::new(CookieDbLocation::new());
        resolve_cookie(&cookie_opts, process_env, Platform::current(), &store)
    })
    .await?;
    info!("cookie source: {origin}");

    let client = LinuxDoClient::new(&config, cookie.as_deref())?;
    match args.command {
        LinuxDoCommand::Whoami => linuxdo_cmd::whoami(&client).await,
        LinuxDoCommand::Latest { limit, page, chars } => {
            linuxdo_cmd::latest(&client, ListOptions { limit, page, chars }).await
        }
        LinuxDoCommand::Top {
            period,
            limit,
            chars,
        } => {
            let opts = ListOptions {
                limit,
                page: 0,
                chars,
            };
            linuxdo_cmd::top(&client, period, opts).await
        }
        LinuxDoCommand::Search {
            query,
            limit,
            chars,
        } => {
            let opts = ListOptions {
                limit,
                page: 0,
                chars,
            };
            linuxdo_cmd::search(&client, &query, opts).await
        }
        LinuxDoCommand::Topic {
            topic,
            posts,
            chars,
            page,
        } => linuxdo_cmd::topic(&client, &topic, TopicOptions { posts, chars, page }).await,
        LinuxDoCommand::Category {
            category,
            limit,
            page,
            chars,
        } => {
            let opts = ListOptions { limit, page, chars };
            linuxdo_cmd::category(&client, category.as_deref(), opts).await
        }
    }
}

/// Never fails: unreadable input renders as the unknown gauge.
async fn run_statusline() -> String {
    let mut input = String::new();
    if let Err(e) = tokio::io::stdin().read_to_string(&mut input).await {
        debug!(error = %e, "cannot read statusline input");
        return format!("{}\n", statusline::UNKNOWN);
    }
    format!("{}\n", statusline::render(&input))
}

/// Run one command and return what it prints on stdout.
///
/// `offset` is the local UTC offset, resolved before the runtime started.
pub async fn run(cli: Cli, offset: UtcOffset) -> Result<String> {
    match cli.command {
        Command::Timeline(args) => run_timeline(args).await,
        Command::Linuxdo(args) => run_linuxdo(args).await,
        Command::Diary(args) => {
            let now = OffsetDateTime::now_utc().to_offset(offset);
            let opts: DiaryOptions = args.into();
            run_blocking(move || diary::run(&opts, &SessionRoots::from_home(), now)).await
        }
        Command::Statusline => Ok(run_statusline().await),
    }
}
