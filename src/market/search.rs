//! Keyword search over the paginated CLOB market listing.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Deserializer};
use tracing::{debug, instrument};

use super::client::PolymarketClient;
use super::types::{null_as_empty, OutcomeToken};
use crate::error::MarketError;
use crate::trading::clob::next_cursor;

/// Listing entry as returned by `GET /markets`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListedMarket {
    /// Market question.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub question: String,
    /// Market slug.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub market_slug: String,
    /// Condition ID.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub condition_id: String,
    /// Outcome tokens.
    #[serde(default, deserialize_with = "null_or_seq")]
    pub tokens: Vec<OutcomeToken>,
}

fn null_or_seq<'de, D>(deserializer: D) -> Result<Vec<OutcomeToken>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<OutcomeToken>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
struct MarketsPage {
    #[serde(default)]
    data: Vec<ListedMarket>,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// Case-insensitive keyword matcher for question text and slugs.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    pattern: Regex,
}

impl KeywordMatcher {
    /// Build a matcher for a literal keyword.
    pub fn new(keyword: &str) -> Result<Self, MarketError> {
        let pattern = RegexBuilder::new(&regex::escape(keyword.trim()))
            .case_insensitive(true)
            .build()
            .map_err(|e| MarketError::ParseError(format!("bad keyword: {}", e)))?;
        Ok(Self { pattern })
    }

    /// Whether the market's question or slug contains the keyword.
    pub fn matches(&self, market: &ListedMarket) -> bool {
        self.pattern.is_match(&market.question) || self.pattern.is_match(&market.market_slug)
    }
}

/// Walk every page of the market listing and collect keyword matches.
#[instrument(skip(client))]
pub async fn search_markets(
    client: &PolymarketClient,
    keyword: &str,
) -> Result<Vec<ListedMarket>, MarketError> {
    let matcher = KeywordMatcher::new(keyword)?;
    let url = format!("{}/markets", client.clob_url());

    let mut found = Vec::new();
    let mut cursor = String::new();
    let mut pages = 0u32;

    loop {
        let response = client
            .http()
            .get(&url)
            .query(&[("next_cursor", cursor.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MarketError::FetchFailed {
                slug: "markets".to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let page: MarketsPage = response
            .json()
            .await
            .map_err(|e| MarketError::ParseError(format!("Failed to parse market page: {}", e)))?;
        pages += 1;

        found.extend(page.data.into_iter().filter(|m| matcher.matches(m)));

        match next_cursor(page.next_cursor) {
            Some(next) => cursor = next,
            None => break,
        }
    }

    debug!(pages, matches = found.len(), "Market search complete");
    Ok(found)
}
