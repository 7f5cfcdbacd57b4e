//! Comment and like-count ingestion.
//!
//! [`Source::Graph`] pages through `/{post_id}/comments` on the Instagram Graph API.
//! [`Source::Demo`] stands in when no credentials are configured so the dashboard has
//! something to show.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use log::{debug, info, warn};
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use tagdraw::Comment;
use tokio::time::MissedTickBehavior;

use crate::config::ServerConfig;
use crate::storage::{Store, StoreError};

const COMMENT_FIELDS: &str = "id,text,username,timestamp";
const PAGE_LIMIT: &str = "100";
const MAX_PAGES: usize = 500;
const GRAPH_TIMESTAMP: &str = "%Y-%m-%dT%H:%M:%S%z";

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("http status {0}")]
    Http(u16),
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error("unexpected response: {0}")]
    Payload(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
    #[serde(default)]
    paging: Option<Paging>,
}

#[derive(Deserialize)]
struct Paging {
    next: Option<String>,
}

#[derive(Deserialize)]
struct GraphComment {
    id: String,
    /// Null for media-only comments.
    #[serde(default)]
    text: Option<String>,
    username: Option<String>,
    timestamp: Option<String>,
}

#[derive(Deserialize)]
struct LikeCount {
    like_count: Option<u64>,
}

/// Graph API timestamps look like `2024-05-01T08:30:00+0000`.
pub fn parse_graph_timestamp(raw: &str) -> Option<i64> {
    DateTime::parse_from_str(raw, GRAPH_TIMESTAMP).ok().map(|dt| dt.timestamp_millis())
}

impl GraphComment {
    fn into_comment(self) -> Option<Comment> {
        let Some(author) = self.username.filter(|u| !u.is_empty()) else {
            debug!("skipping comment {} without username", self.id);
            return None;
        };
        let timestamp = self.timestamp.as_deref().and_then(parse_graph_timestamp);
        Some(Comment { id: self.id, author, text: self.text.unwrap_or_default(), timestamp, verified: false })
    }
}

pub struct GraphClient {
    http: Client,
    base: String,
    post_id: String,
    token: String,
}

impl GraphClient {
    pub fn new(base: &str, post_id: &str, token: &str) -> Result<Self, SyncError> {
        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self { http, base: base.trim_end_matches('/').to_string(), post_id: post_id.to_string(), token: token.to_string() })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, req: reqwest::RequestBuilder) -> Result<T, SyncError> {
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SyncError::Http(status.as_u16()));
        }
        Ok(resp.json::<T>().await?)
    }

    /// Follows `paging.next` until the last page.
    pub async fn fetch_comments(&self) -> Result<Vec<Comment>, SyncError> {
        let first = self.http.get(format!("{}/{}/comments", self.base, self.post_id)).query(&[
            ("fields", COMMENT_FIELDS),
            ("limit", PAGE_LIMIT),
            ("access_token", self.token.as_str()),
        ]);
        let mut page: Page<GraphComment> = self.get_json(first).await?;
        let mut out = Vec::new();
        for n in 1.. {
            debug!("graph page {n}: {} comments", page.data.len());
            out.extend(page.data.into_iter().filter_map(GraphComment::into_comment));
            let Some(next) = page.paging.and_then(|p| p.next) else { break };
            if n >= MAX_PAGES {
                warn!("stopping after {MAX_PAGES} comment pages");
                break;
            }
            page = self.get_json(self.http.get(next)).await?;
        }
        Ok(out)
    }

    pub async fn fetch_like_count(&self) -> Result<u64, SyncError> {
        let req = self
            .http
            .get(format!("{}/{}", self.base, self.post_id))
            .query(&[("fields", "like_count"), ("access_token", self.token.as_str())]);
        let body: LikeCount = self.get_json(req).await?;
        body.like_count.ok_or_else(|| SyncError::Payload("like_count missing".into()))
    }
}

/// Offline stand-in with a fixed set of comments and a like count that grows with time.
#[derive(Default)]
pub struct DemoSource;

const DEMO_TEXTS: [&str; 25] = [
    "lovely bottle #P",
    "go green #S",
    "the whale is adorable #K",
    "count me in #p",
    "nice! #s #k",
    "hope I win #P #S",
    "protect the ocean",
    "#k dolphins matter",
    "great #P",
    "fingers crossed #S",
    "want it #P",
    "support #S",
    "save the whales #K",
    "joining the draw #p",
    "sustainability first #s",
    "dolphins are cute #k",
    "love this campaign #P",
    "ocean care #S",
    "whales are my favourite #K",
    "let me win #p",
    "support #s #k",
    "in #P #S",
    "baby whale #K",
    "draw #p",
    "eco #s",
];

/// Likes started accruing on this date for the demo campaign.
const DEMO_EPOCH: (i32, u32, u32) = (2023, 7, 1);

impl DemoSource {
    pub fn comments(&self, now_ms: i64) -> Vec<Comment> {
        DEMO_TEXTS
            .iter()
            .enumerate()
            .map(|(i, text)| Comment::new(format!("comment{}", i + 1), format!("user{}", i + 1), *text).with_timestamp(now_ms))
            .collect()
    }

    /// 100 likes at the start, then about 10 an hour with a random 0.75-1.25 factor.
    pub fn like_count<R: Rng + ?Sized>(&self, now: DateTime<Utc>, rng: &mut R) -> u64 {
        let (y, m, d) = DEMO_EPOCH;
        let start = Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).single().unwrap_or(now);
        let elapsed_hours = ((now - start).num_seconds() as f64 / 3600.0).max(1.0);
        let factor: f64 = rng.gen_range(0.75..1.25);
        (100.0 + elapsed_hours * 10.0 * factor).floor() as u64
    }

    fn current_like_count(&self) -> u64 {
        self.like_count(Utc::now(), &mut rand::thread_rng())
    }
}

pub enum Source {
    Graph(GraphClient),
    Demo(DemoSource),
}

impl Source {
    pub fn from_config(cfg: &ServerConfig) -> Result<Self, SyncError> {
        match cfg.graph_credentials() {
            Some((token, post_id)) => Ok(Source::Graph(GraphClient::new(&cfg.graph_api_base, post_id, token)?)),
            None => Ok(Source::Demo(DemoSource)),
        }
    }

    pub fn is_demo(&self) -> bool {
        matches!(self, Source::Demo(_))
    }

    pub async fn fetch_comments(&self) -> Result<Vec<Comment>, SyncError> {
        match self {
            Source::Graph(client) => client.fetch_comments().await,
            Source::Demo(demo) => Ok(demo.comments(Utc::now().timestamp_millis())),
        }
    }

    pub async fn fetch_like_count(&self) -> Result<u64, SyncError> {
        match self {
            Source::Graph(client) => client.fetch_like_count().await,
            Source::Demo(demo) => Ok(demo.current_like_count()),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub fetched: usize,
    pub inserted: usize,
}

pub async fn sync_once(store: &Store, source: &Source) -> Result<SyncReport, SyncError> {
    let comments = source.fetch_comments().await?;
    let mut report = SyncReport { fetched: comments.len(), inserted: 0 };
    for comment in comments {
        if store.upsert(comment)? {
            report.inserted += 1;
        }
    }
    info!("sync: fetched {} comments, {} new", report.fetched, report.inserted);
    Ok(report)
}

/// Syncs immediately, then every `interval`, until `exit` is set. A failed pass is logged and
/// retried on the next tick.
pub async fn run_periodic(store: Store, source: Arc<Source>, interval: Duration, exit: Arc<AtomicBool>) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if exit.load(Ordering::Relaxed) {
            break;
        }
        if let Err(e) = sync_once(&store, &source).await {
            warn!("sync failed: {e}");
        }
    }
    info!("sync loop stopped");
}
