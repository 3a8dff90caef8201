//! Social trends lookup: pull recent posts about a profession and count
//! which skills from a fixed vocabulary they mention.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Posts requested per lookup.
pub const MAX_POSTS: usize = 50;
/// Topics returned per report.
pub const TOP_TOPICS: usize = 5;

pub const SKILL_VOCABULARY: &[&str] = &[
    "AI",
    "AWS",
    "Cloud",
    "Communication",
    "Cybersecurity",
    "Data Analysis",
    "DevOps",
    "Docker",
    "Excel",
    "Figma",
    "Java",
    "JavaScript",
    "Kubernetes",
    "Leadership",
    "Machine Learning",
    "Marketing",
    "Photoshop",
    "Project Management",
    "Python",
    "React",
    "Rust",
    "SEO",
    "SQL",
    "Statistics",
    "UX",
];

#[derive(Debug, Error)]
pub enum TrendsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("trends API error (status {status})")]
    Api { status: u16 },
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrendSource {
    Live,
    Sample,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrendingTopic {
    pub keyword: String,
    pub mentions: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrendReport {
    pub source: TrendSource,
    pub posts_scanned: usize,
    pub topics: Vec<TrendingTopic>,
}

impl TrendReport {
    /// Shown when no search credentials are configured.
    pub fn sample() -> Self {
        Self {
            source: TrendSource::Sample,
            posts_scanned: 0,
            topics: ["Python tutorials", "AI workshops"]
                .into_iter()
                .map(|keyword| TrendingTopic {
                    keyword: keyword.to_string(),
                    mentions: 0,
                })
                .collect(),
        }
    }

    pub fn empty_live() -> Self {
        Self {
            source: TrendSource::Live,
            posts_scanned: 0,
            topics: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Post>,
}

#[derive(Debug, Deserialize)]
struct Post {
    text: String,
}

#[derive(Clone)]
pub struct TrendsClient {
    client: Client,
    api_url: String,
    bearer_token: Option<String>,
}

impl TrendsClient {
    pub fn new(
        api_url: String,
        bearer_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, TrendsError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url,
            bearer_token,
        })
    }

    pub fn is_live(&self) -> bool {
        self.bearer_token.is_some()
    }

    /// Recent posts matching `query`, at most `MAX_POSTS`.
    pub async fn fetch_posts(&self, token: &str, query: &str) -> Result<Vec<String>, TrendsError> {
        let response = self
            .client
            .get(&self.api_url)
            .bearer_auth(token)
            .query(&[
                ("query", format!("{query} -is:retweet")),
                ("max_results", MAX_POSTS.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrendsError::Api {
                status: status.as_u16(),
            });
        }

        let body: SearchResponse = response.json().await?;
        let posts: Vec<String> = body.data.into_iter().take(MAX_POSTS).map(|p| p.text).collect();
        debug!("Fetched {} posts", posts.len());
        Ok(posts)
    }

    /// Trend report for a profession; the sample report when not configured.
    #[instrument(level = "info", skip(self))]
    pub async fn lookup(&self, profession: &str) -> Result<TrendReport, TrendsError> {
        let Some(token) = self.bearer_token.as_deref() else {
            info!("No trends credentials configured, serving sample trends");
            return Ok(TrendReport::sample());
        };
        let posts = self.fetch_posts(token, profession).await?;
        Ok(TrendReport {
            source: TrendSource::Live,
            posts_scanned: posts.len(),
            topics: count_keywords(&posts),
        })
    }
}

fn vocabulary_patterns() -> &'static [(&'static str, Regex)] {
    static PATTERNS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        SKILL_VOCABULARY
            .iter()
            .map(|kw| {
                let pattern = format!(r"(?i)\b{}\b", regex::escape(kw));
                (*kw, Regex::new(&pattern).expect("vocabulary keyword regex"))
            })
            .collect()
    })
}

/// Counts posts mentioning each vocabulary keyword as a whole word, ignoring
/// case. Returns the most mentioned first, ties by keyword.
pub fn count_keywords(posts: &[String]) -> Vec<TrendingTopic> {
    let mut topics: Vec<TrendingTopic> = vocabulary_patterns()
        .iter()
        .map(|(keyword, pattern)| TrendingTopic {
            keyword: keyword.to_string(),
            mentions: posts.iter().filter(|post| pattern.is_match(post)).count(),
        })
        .filter(|t| t.mentions > 0)
        .collect();

    topics.sort_by(|a, b| b.mentions.cmp(&a.mentions).then_with(|| a.keyword.cmp(&b.keyword)));
    topics.truncate(TOP_TOPICS);
    topics
}
