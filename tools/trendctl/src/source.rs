//! Event feed loading
//!
//! A feed is either a local JSON file or an HTTP endpoint serving the same
//! `{ "events": [...] }` document.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{FixedOffset, NaiveDateTime};
use errors::{RolloutError, RolloutResult};
use reqwest::Client;
use rollout_trends::{Event, EventFeed};
use tracing::{debug, info};

/// Where events come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventSource {
    File(PathBuf),
    Http(String),
}

impl EventSource {
    /// `http://` and `https://` mean a URL, anything else is a path
    pub fn parse(raw: &str) -> RolloutResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(RolloutError::invalid_parameter(
                "events",
                "event source must not be empty",
            ));
        }
        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Ok(Self::Http(raw.to_string()))
        } else {
            Ok(Self::File(PathBuf::from(raw)))
        }
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Http(url) => f.write_str(url),
        }
    }
}

/// Events as of one fetch
#[derive(Debug, Clone)]
pub struct EventSnapshot {
    pub events: Vec<Event>,
    pub fetched_at: NaiveDateTime,
}

impl EventSnapshot {
    pub fn new(events: Vec<Event>, fetched_at: NaiveDateTime) -> Self {
        Self { events, fetched_at }
    }

    /// Older than `max_age` at `now`
    pub fn is_stale(&self, now: NaiveDateTime, max_age: Duration) -> bool {
        match chrono::Duration::from_std(max_age) {
            Ok(max_age) => now - self.fetched_at > max_age,
            Err(_) => false,
        }
    }
}

/// Fetches snapshots from one source
pub struct FeedLoader {
    source: EventSource,
    client: Client,
    token: Option<String>,
    /// Wall-clock offset that feed stamps are dated in
    offset: FixedOffset,
}

impl FeedLoader {
    pub fn new(source: EventSource, timeout: Duration, offset: FixedOffset) -> RolloutResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            source,
            client,
            token: None,
            offset,
        })
    }

    /// Bearer token sent with HTTP requests
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn source(&self) -> &EventSource {
        &self.source
    }

    /// Fetch the feed and stamp it with `now`
    pub async fn load(&self, now: NaiveDateTime) -> RolloutResult<EventSnapshot> {
        let (origin, body) = match &self.source {
            EventSource::File(path) => (path.display().to_string(), read_file(path).await?),
            EventSource::Http(url) => (url.clone(), self.fetch(url).await?),
        };
        let events = parse_feed(&origin, &body, self.offset)?;
        info!(source = %self.source, events = events.len(), "Feed loaded");
        Ok(EventSnapshot::new(events, now))
    }

    async fn fetch(&self, url: &str) -> RolloutResult<String> {
        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        debug!(url, "Fetching feed");

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RolloutError::FeedStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

async fn read_file(path: &Path) -> RolloutResult<String> {
    if !path.exists() {
        return Err(RolloutError::FileNotFound(path.display().to_string()));
    }
    Ok(tokio::fs::read_to_string(path).await?)
}

/// Parse a `{ "events": [...] }` document into events dated in `offset`
pub fn parse_feed(origin: &str, body: &str, offset: FixedOffset) -> RolloutResult<Vec<Event>> {
    let feed: EventFeed =
        serde_json::from_str(body).map_err(|e| RolloutError::parse_error(origin, e))?;
    feed.into_events(offset).map_err(|e| RolloutError::parse_error(origin, e))
}
