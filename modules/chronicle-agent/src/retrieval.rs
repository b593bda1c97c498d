//! Article retrieval: news search plus fetch-and-clean.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use spider_transformations::transformation::content::{
    transform_content_input, ReturnFormat, TransformConfig, TransformInput,
};
use tracing::{info, warn};

use chronicle_common::{dates, ChronicleError, SourceDocument};

use crate::traits::{ArticleFetcher, ArticleRef, NewsSearcher};

// --- GNews search ---

pub struct GNewsSearcher {
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, serde::Deserialize)]
struct GNewsResponse {
    #[serde(default)]
    articles: Vec<GNewsArticle>,
}

#[derive(Debug, serde::Deserialize)]
struct GNewsArticle {
    #[serde(default)]
    url: String,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
}

impl GNewsSearcher {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

#[async_trait]
impl NewsSearcher for GNewsSearcher {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<ArticleRef>> {
        info!(query, max_results, "GNews search");

        // Quote the query for exact-phrase matching
        let resp = self
            .client
            .get("https://gnews.io/api/v4/search")
            .query(&[
                ("q", format!("\"{query}\"")),
                ("lang", "en".to_string()),
                ("max", max_results.to_string()),
                ("token", self.api_key.clone()),
            ])
            .send()
            .await
            .context("GNews API request failed")?;

        let data: GNewsResponse = resp.json().await.context("Failed to parse GNews response")?;

        let results: Vec<ArticleRef> = data
            .articles
            .into_iter()
            .filter(|a| !a.url.is_empty())
            .map(|a| ArticleRef {
                url: a.url,
                published_at: a.published_at,
            })
            .collect();

        info!(query, count = results.len(), "GNews search complete");
        Ok(results)
    }
}

// --- Page fetch + Readability ---

/// Fetches article HTML over plain HTTP and reduces it to readable
/// markdown via Readability extraction.
pub struct PageFetcher {
    client: reqwest::Client,
}

impl PageFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .user_agent("Mozilla/5.0 (compatible; chronicle/0.1)")
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

impl Default for PageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArticleFetcher for PageFetcher {
    async fn fetch(&self, article: &ArticleRef) -> Result<SourceDocument> {
        info!(url = %article.url, "Fetching article");

        let resp = self
            .client
            .get(&article.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ChronicleError::TransientFetch {
                url: article.url.clone(),
                reason: e.to_string(),
            })?;

        let html = resp.text().await.map_err(|e| ChronicleError::TransientFetch {
            url: article.url.clone(),
            reason: e.to_string(),
        })?;

        let title = extract_title(&html).unwrap_or_else(|| article.url.clone());

        let parsed_url = url::Url::parse(&article.url).ok();
        let publisher = parsed_url
            .as_ref()
            .and_then(|u| u.host_str())
            .map(|h| h.trim_start_matches("www.").to_string())
            .unwrap_or_default();

        let config = TransformConfig {
            readability: true,
            main_content: true,
            return_format: ReturnFormat::Markdown,
            filter_images: true,
            filter_svg: true,
            clean_html: true,
        };
        let input = TransformInput {
            url: parsed_url.as_ref(),
            content: html.as_bytes(),
            screenshot_bytes: None,
            encoding: None,
            selector_config: None,
            ignore_tags: None,
        };
        let text = transform_content_input(input, &config);

        if text.trim().is_empty() {
            warn!(url = %article.url, "Empty content after Readability extraction");
        }

        let published_date = article
            .published_at
            .as_deref()
            .and_then(dates::parse_flexible);

        Ok(SourceDocument {
            url: article.url.clone(),
            title,
            publisher,
            published_date,
            raw_text: text,
        })
    }
}

/// Pull the contents of the first `<title>` tag, entity-light.
fn extract_title(html: &str) -> Option<String> {
    let lower = html.to_lowercase();
    let open = lower.find("<title")?;
    let start = lower[open..].find('>')? + open + 1;
    let end = lower[start..].find("</title>")? + start;
    let title = html[start..end].trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}
