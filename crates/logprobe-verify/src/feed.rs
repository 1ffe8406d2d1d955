//! Capacity-bounded feed query interface.
//!
//! The feed destination answers any request on its TCP port with a complete
//! HTTP response holding an Atom document of its current backlog:
//!
//! ```text
//! HTTP/1.1 200 OK
//! Content-Type:application/atom+xml
//!
//! <?xml version="1.0"?>
//! <feed xmlns="http://www.w3.org/2005/Atom">
//! <title>syslog-ng</title><link>localhost:8081</link><entry>
//!  <title>MESSAGE</title>
//!  <description>MESSAGE</description>
//!  <id>0</id>
//! </entry>
//! </feed>
//! ```
//!
//! Entry ids are arrival ordinals; eviction removes the lowest ids first.

use std::sync::LazyLock;

use regex::Regex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::{Result, VerifyError};

/// Request line sent to the feed port.
pub const FEED_REQUEST: &str = "GET / HTTP/1.1\n\n";

/// Read chunk size for feed responses.
pub const BUFFER_SIZE: usize = 4096;

const STATUS_OK: &str = "HTTP/1.1 200 OK";
const CONTENT_TYPE: &str = "Content-Type:application/atom+xml";

static ENTRY_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?s)<entry>\s*<title>(.*?)</title>\s*<description>(.*?)</description>\s*<id>(\d+)</id>\s*</entry>",
    )
    .ok()
});

static HEAD_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?s)<feed[^>]*>\s*<title>(.*?)</title>\s*<link>(.*?)</link>").ok()
});

fn pattern(re: &'static LazyLock<Option<Regex>>) -> Result<&'static Regex> {
    re.as_ref()
        .ok_or_else(|| VerifyError::malformed("feed pattern failed to compile"))
}

/// One feed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    /// Entry title (the message text).
    pub title: String,
    /// Entry description (the message text).
    pub description: String,
    /// Arrival ordinal.
    pub id: u64,
}

/// A decoded feed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedDocument {
    /// Feed title.
    pub title: String,
    /// Feed link.
    pub link: String,
    /// Entries, oldest first.
    pub entries: Vec<FeedEntry>,
}

impl FeedDocument {
    /// Creates an empty feed.
    #[must_use]
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            entries: Vec::new(),
        }
    }

    /// Appends an entry whose title and description are `message`.
    pub fn push(&mut self, message: impl Into<String>, id: u64) {
        let message = message.into();
        self.entries.push(FeedEntry {
            title: message.clone(),
            description: message,
            id,
        });
    }

    /// Decodes a full HTTP response.
    ///
    /// # Errors
    /// Returns an error if the status line, content type or feed head is missing.
    pub fn parse(response: &str) -> Result<Self> {
        let (head, body) = response
            .split_once("\n\n")
            .ok_or_else(|| VerifyError::malformed("no header/body separator"))?;
        let mut head_lines = head.lines();
        if head_lines.next().map(str::trim_end) != Some(STATUS_OK) {
            return Err(VerifyError::malformed(format!(
                "unexpected status line in {:?}",
                head.lines().next().unwrap_or_default()
            )));
        }
        if !head_lines.any(|l| l.trim_end() == CONTENT_TYPE) {
            return Err(VerifyError::malformed("missing atom content type"));
        }

        let captures = pattern(&HEAD_RE)?
            .captures(body)
            .ok_or_else(|| VerifyError::malformed("missing feed title/link"))?;
        let mut doc = Self::new(&captures[1], &captures[2]);

        for entry in pattern(&ENTRY_RE)?.captures_iter(body) {
            let id = entry[3]
                .parse()
                .map_err(|e| VerifyError::malformed(format!("bad entry id {:?}: {e}", &entry[3])))?;
            doc.entries.push(FeedEntry {
                title: entry[1].to_string(),
                description: entry[2].to_string(),
                id,
            });
        }
        if !body.trim_end().ends_with("</feed>") {
            return Err(VerifyError::malformed("feed is not terminated"));
        }
        Ok(doc)
    }

    /// Renders the full HTTP response the feed destination produces.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!(
            "{STATUS_OK}\n{CONTENT_TYPE}\n\n<?xml version=\"1.0\"?>\n<feed xmlns=\"http://www.w3.org/2005/Atom\">\n<title>{}</title><link>{}</link>",
            self.title, self.link
        );
        for entry in &self.entries {
            out.push_str(&format!(
                "<entry>\n <title>{}</title>\n <description>{}</description>\n <id>{}</id>\n</entry>\n",
                entry.title, entry.description, entry.id
            ));
        }
        out.push_str("</feed>\n");
        out
    }

    /// Ids present in the feed, in document order.
    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.iter().map(|e| e.id)
    }

    /// Returns true if an entry with `id` is present.
    #[must_use]
    pub fn contains_id(&self, id: u64) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Looks up an entry by id.
    #[must_use]
    pub fn entry(&self, id: u64) -> Option<&FeedEntry> {
        self.entries.iter().find(|e| e.id == id)
    }
}

/// Client for the feed query interface.
#[derive(Debug, Clone)]
pub struct FeedClient {
    host: String,
    port: u16,
}

impl FeedClient {
    /// Creates a client for `host:port`.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// `host:port` of the interface.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Sends the request and reads the raw response until the peer closes.
    ///
    /// # Errors
    /// Returns an error if the connection or the exchange fails.
    pub async fn fetch(&self) -> Result<String> {
        let connect_err = |source| VerifyError::Connect {
            endpoint: self.endpoint(),
            source,
        };
        let mut stream = tokio::net::TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(connect_err)?;
        stream.write_all(FEED_REQUEST.as_bytes()).await?;

        let mut raw = Vec::new();
        let mut buf = vec![0u8; BUFFER_SIZE];
        loop {
            let n = stream.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
        }
        tracing::debug!(endpoint = %self.endpoint(), bytes = raw.len(), "fetched feed");
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }

    /// Fetches and decodes the feed.
    ///
    /// # Errors
    /// Returns an error if fetching fails or the response is malformed.
    pub async fn query(&self) -> Result<FeedDocument> {
        FeedDocument::parse(&self.fetch().await?)
    }
}
