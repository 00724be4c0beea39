//! arXiv search client.
//!
//! Uses reqwest for fetching and quick-xml for reading the Atom feed.

use crate::config::ArxivConfig;
use crate::paper::PaperRecord;
use lazy_static::lazy_static;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

lazy_static! {
    /// Permissive markup pattern; not an HTML parser
    static ref TAG_PATTERN: Regex = Regex::new(r"<[^>]+>").expect("valid tag pattern");
    static ref ENTITY_PATTERN: Regex = Regex::new(r"&[^&;\s]+;").expect("valid entity pattern");
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid search URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("failed to fetch feed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("malformed feed: {0}")]
    Malformed(String),
}

/// Client for the arXiv query API
pub struct ArxivClient {
    http: Client,
    base_url: String,
}

impl ArxivClient {
    /// Create a client with the configured user agent and timeout
    pub fn new(config: &ArxivConfig) -> Result<Self, FetchError> {
        let http = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    /// Build the query URL: newest submissions first, capped at `max_results`
    pub fn search_url(&self, topic: &str, max_results: usize) -> Result<Url, FetchError> {
        let url = Url::parse_with_params(
            &self.base_url,
            &[
                ("search_query", format!("all:{}", topic)),
                ("sortBy", "submittedDate".to_string()),
                ("sortOrder", "descending".to_string()),
                ("max_results", max_results.to_string()),
            ],
        )?;
        Ok(url)
    }

    /// Search for papers on `topic`, reporting why a search failed
    pub async fn search(
        &self,
        topic: &str,
        max_results: usize,
    ) -> Result<Vec<PaperRecord>, FetchError> {
        let url = self.search_url(topic, max_results)?;
        debug!(%url, "querying arXiv");

        let response = self.http.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;

        let mut papers = parse_feed(&body)?;
        papers.truncate(max_results);
        Ok(papers)
    }

    /// Search for papers on `topic`; any failure yields an empty list
    pub async fn fetch_papers(&self, topic: &str, max_results: usize) -> Vec<PaperRecord> {
        match self.search(topic, max_results).await {
            Ok(papers) => {
                info!(count = papers.len(), topic, "fetched papers");
                papers
            }
            Err(e) => {
                warn!(error = %e, topic, "arXiv search failed, continuing without papers");
                Vec::new()
            }
        }
    }
}

/// Fetch up to `max_results` recent papers for `topic`.
///
/// Never fails: a client that cannot be built, a network error, a bad status
/// or an unreadable feed all produce an empty list.
pub async fn fetch_papers(
    config: &ArxivConfig,
    topic: &str,
    max_results: usize,
) -> Vec<PaperRecord> {
    match ArxivClient::new(config) {
        Ok(client) => client.fetch_papers(topic, max_results).await,
        Err(e) => {
            warn!(error = %e, "could not build arXiv client");
            Vec::new()
        }
    }
}

/// Entry elements whose text we keep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Summary,
    Published,
    Id,
    AuthorName,
}

impl Field {
    fn from_tag(local_name: &[u8]) -> Option<Self> {
        match local_name {
            b"title" => Some(Field::Title),
            b"summary" => Some(Field::Summary),
            b"published" => Some(Field::Published),
            b"id" => Some(Field::Id),
            b"name" => Some(Field::AuthorName),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct EntryBuilder {
    title: String,
    summary: String,
    published: String,
    id: String,
    authors: Vec<String>,
    alternate_link: Option<String>,
    other_link: Option<String>,
}

impl EntryBuilder {
    fn set(&mut self, field: Field, text: String) {
        match field {
            Field::Title => self.title = text.trim().to_string(),
            Field::Summary => self.summary = clean_summary(&text),
            Field::Published => self.published = text.trim().to_string(),
            Field::Id => self.id = text.trim().to_string(),
            Field::AuthorName => self.authors.push(text.trim().to_string()),
        }
    }

    /// Record a `<link>`; `rel` defaults to "alternate" as in Atom
    fn add_link(&mut self, tag: &BytesStart) {
        let mut href = None;
        let mut rel = None;
        for attr in tag.attributes().flatten() {
            let value = unescape_xml(&String::from_utf8_lossy(&attr.value));
            match attr.key.local_name().as_ref() {
                b"href" => href = Some(value),
                b"rel" => rel = Some(value),
                _ => {}
            }
        }

        let Some(href) = href else { return };
        if rel.as_deref().unwrap_or("alternate") == "alternate" {
            self.alternate_link.get_or_insert(href);
        } else {
            self.other_link.get_or_insert(href);
        }
    }

    fn finish(self) -> PaperRecord {
        PaperRecord {
            title: self.title,
            summary: self.summary,
            link: self.alternate_link.or(self.other_link).unwrap_or_default(),
            authors: self.authors.join(", "),
            published: self.published,
            id: self.id,
        }
    }
}

/// Parse an Atom feed into paper records, one per `<entry>`, in feed order
pub fn parse_feed(xml: &str) -> Result<Vec<PaperRecord>, FetchError> {
    let mut reader = Reader::from_str(xml);
    let mut papers = Vec::new();
    let mut entry: Option<EntryBuilder> = None;
    let mut field: Option<Field> = None;
    // Raw (still escaped) text of the current field
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"entry" => {
                    entry = Some(EntryBuilder::default());
                    field = None;
                }
                b"link" => {
                    if let Some(entry) = entry.as_mut() {
                        entry.add_link(&e);
                    }
                }
                name => {
                    if entry.is_some() && field.is_none() {
                        if let Some(next) = Field::from_tag(name) {
                            field = Some(next);
                            text.clear();
                        }
                    }
                }
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"link" {
                    if let Some(entry) = entry.as_mut() {
                        entry.add_link(&e);
                    }
                }
            }
            Ok(Event::Text(t)) if field.is_some() => {
                text.push_str(&String::from_utf8_lossy(&t));
            }
            Ok(Event::CData(c)) if field.is_some() => {
                let raw = String::from_utf8_lossy(&c);
                text.push_str(&quick_xml::escape::escape(&*raw));
            }
            Ok(Event::GeneralRef(r)) if field.is_some() => {
                text.push('&');
                text.push_str(&String::from_utf8_lossy(&r));
                text.push(';');
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"entry" => {
                    if let Some(done) = entry.take() {
                        papers.push(done.finish());
                    }
                    field = None;
                }
                name => {
                    if let (Some(current), Some(entry)) = (field, entry.as_mut()) {
                        if Field::from_tag(name) == Some(current) {
                            entry.set(current, unescape_xml(&text));
                            field = None;
                        }
                    }
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(FetchError::Malformed(format!(
                    "at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            Ok(_) => {}
        }
    }

    Ok(papers)
}

/// Resolve XML entities one at a time; unknown ones stay as literal text
fn unescape_xml(raw: &str) -> String {
    ENTITY_PATTERN
        .replace_all(raw, |caps: &regex::Captures| {
            let entity = &caps[0];
            quick_xml::escape::unescape(entity)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| entity.to_string())
        })
        .into_owned()
}

/// Decode HTML entities and drop simple tags from an abstract.
///
/// Nested or malformed markup can leave stray characters behind.
pub fn clean_summary(text: &str) -> String {
    let decoded = html_escape::decode_html_entities(text);
    TAG_PATTERN.replace_all(decoded.trim(), "").into_owned()
}
