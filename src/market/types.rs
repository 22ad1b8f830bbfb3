//! Market-related types for binary prediction markets.

use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::error::MarketError;

/// Side of a binary market, by its position in the token list.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// First token (YES / UP).
    #[strum(serialize = "yes", serialize = "up", serialize = "YES", serialize = "UP")]
    Yes,
    /// Second token (NO / DOWN).
    #[strum(serialize = "no", serialize = "down", serialize = "NO", serialize = "DOWN")]
    #[default]
    No,
}

impl Outcome {
    /// Index of this outcome in the market's token list.
    pub fn index(&self) -> usize {
        match self {
            Outcome::Yes => 0,
            Outcome::No => 1,
        }
    }
}

/// Parse an outcome given either as an index ("1") or a name ("down").
pub fn parse_outcome_index(s: &str) -> Result<usize, String> {
    if let Ok(index) = s.trim().parse::<usize>() {
        return Ok(index);
    }
    s.trim()
        .parse::<Outcome>()
        .map(|o| o.index())
        .map_err(|_| format!("unknown outcome '{}': use an index or yes/no/up/down", s))
}

/// One tradeable side of a market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeToken {
    /// CLOB token ID.
    pub token_id: String,
    /// Outcome label ("Yes", "Down", ...).
    #[serde(default, deserialize_with = "null_as_empty")]
    pub outcome: String,
}

/// Resolved market metadata. Read-only once fetched.
#[derive(Debug, Clone)]
pub struct Market {
    /// Market slug (e.g., "btc-updown-15m-1766699100").
    pub slug: String,
    /// Condition ID.
    pub condition_id: String,
    /// Market question text.
    pub question: Option<String>,
    /// Granular close time (Gamma `endDate`).
    pub end_date: Option<OffsetDateTime>,
    /// Coarse close time (CLOB `end_date_iso`).
    pub end_date_iso: Option<OffsetDateTime>,
    /// Outcome tokens in venue order.
    pub tokens: Vec<OutcomeToken>,
    /// Whether the market uses the neg-risk exchange.
    pub neg_risk: bool,
}

impl Market {
    /// Best known close time: Gamma's granular field, else the CLOB field.
    pub fn close_time(&self) -> Option<OffsetDateTime> {
        self.end_date.or(self.end_date_iso)
    }

    /// Token at `index`.
    pub fn token(&self, index: usize) -> Result<&OutcomeToken, MarketError> {
        if self.tokens.is_empty() {
            return Err(MarketError::MissingTokens {
                slug: self.slug.clone(),
            });
        }
        self.tokens
            .get(index)
            .ok_or(MarketError::OutcomeOutOfRange {
                index,
                available: self.tokens.len(),
            })
    }

    /// Get remaining time until the market closes, relative to `now`.
    pub fn time_remaining_at(&self, now: OffsetDateTime) -> Option<time::Duration> {
        self.close_time().map(|close| close - now)
    }

    /// Format remaining time as "Xm Ys" string.
    pub fn time_remaining_str(&self) -> String {
        match self.time_remaining_at(OffsetDateTime::now_utc()) {
            Some(remaining) if remaining.is_positive() => {
                let secs = remaining.whole_seconds();
                format!("{}m {}s", secs / 60, secs % 60)
            }
            Some(_) => "CLOSED".to_string(),
            None => "UNKNOWN".to_string(),
        }
    }
}

/// Market record from the Gamma API.
#[derive(Debug, Clone, Deserialize)]
pub struct GammaMarket {
    /// Market slug.
    pub slug: Option<String>,
    /// Condition ID.
    #[serde(rename = "conditionId")]
    pub condition_id: Option<String>,
    /// Market question.
    pub question: Option<String>,
    /// End date (ISO format).
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    /// JSON-encoded array of CLOB token IDs.
    #[serde(rename = "clobTokenIds", default, deserialize_with = "string_or_seq")]
    pub clob_token_ids: Option<Vec<String>>,
    /// JSON-encoded array of outcome labels.
    #[serde(default, deserialize_with = "string_or_seq")]
    pub outcomes: Option<Vec<String>>,
    /// Neg risk flag.
    #[serde(rename = "negRisk", default)]
    pub neg_risk: Option<bool>,
}

impl GammaMarket {
    /// Outcome tokens paired with their labels.
    pub fn tokens(&self) -> Vec<OutcomeToken> {
        let labels = self.outcomes.clone().unwrap_or_default();
        self.clob_token_ids
            .iter()
            .flatten()
            .enumerate()
            .map(|(i, token_id)| OutcomeToken {
                token_id: token_id.clone(),
                outcome: labels.get(i).cloned().unwrap_or_default(),
            })
            .collect()
    }
}

/// Market record from the CLOB API.
#[derive(Debug, Clone, Deserialize)]
pub struct ClobMarket {
    /// Condition ID.
    pub condition_id: Option<String>,
    /// Market slug.
    pub market_slug: Option<String>,
    /// Market question.
    pub question: Option<String>,
    /// End date (ISO format).
    pub end_date_iso: Option<String>,
    /// Outcome tokens.
    #[serde(default)]
    pub tokens: Vec<OutcomeToken>,
    /// Neg risk flag.
    #[serde(default)]
    pub neg_risk: bool,
}

impl ClobMarket {
    /// Convert to a [`Market`], merging Gamma fields over CLOB fields when present.
    pub fn into_market(self, gamma: Option<&GammaMarket>, identifier: &str) -> Market {
        let tokens = if self.tokens.is_empty() {
            gamma.map(GammaMarket::tokens).unwrap_or_default()
        } else {
            self.tokens
        };

        Market {
            slug: gamma
                .and_then(|g| g.slug.clone())
                .or(self.market_slug)
                .unwrap_or_else(|| identifier.to_string()),
            condition_id: self
                .condition_id
                .or_else(|| gamma.and_then(|g| g.condition_id.clone()))
                .unwrap_or_default(),
            question: gamma.and_then(|g| g.question.clone()).or(self.question),
            end_date: gamma.and_then(|g| g.end_date.as_deref()).and_then(parse_timestamp),
            end_date_iso: self.end_date_iso.as_deref().and_then(parse_timestamp),
            tokens,
            neg_risk: self.neg_risk || gamma.and_then(|g| g.neg_risk).unwrap_or(false),
        }
    }
}

/// Parse an RFC 3339 timestamp, or a bare date taken as midnight UTC.
pub fn parse_timestamp(s: &str) -> Option<OffsetDateTime> {
    if let Ok(ts) = OffsetDateTime::parse(s, &Rfc3339) {
        return Some(ts);
    }
    Date::parse(s, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|d| d.midnight().assume_utc())
}

/// Missing and null strings both read as empty.
pub(crate) fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Gamma encodes some arrays as JSON strings; accept either form.
fn string_or_seq<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Encoded(String),
        List(Vec<String>),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::List(v)) => Ok(Some(v)),
        Some(Raw::Encoded(s)) => serde_json::from_str(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn market(tokens: Vec<OutcomeToken>) -> Market {
        Market {
            slug: "btc-updown-15m-1766699100".to_string(),
            condition_id: "0xcond".to_string(),
            question: None,
            end_date: None,
            end_date_iso: None,
            tokens,
            neg_risk: false,
        }
    }

    fn token(id: &str, outcome: &str) -> OutcomeToken {
        OutcomeToken {
            token_id: id.to_string(),
            outcome: outcome.to_string(),
        }
    }

    #[test]
    fn outcome_from_string_works() {
        use std::str::FromStr;
        assert_eq!(Outcome::from_str("up").unwrap(), Outcome::Yes);
        assert_eq!(Outcome::from_str("DOWN").unwrap(), Outcome::No);
        assert_eq!(Outcome::No.index(), 1);
    }

    #[test]
    fn parse_outcome_accepts_index_or_name() {
        assert_eq!(parse_outcome_index("0"), Ok(0));
        assert_eq!(parse_outcome_index("down"), Ok(1));
        assert_eq!(parse_outcome_index(" yes "), Ok(0));
        assert!(parse_outcome_index("maybe").is_err());
    }

    #[test]
    fn token_selection() {
        let m = market(vec![token("up-token", "Up"), token("down-token", "Down")]);
        assert_eq!(m.token(1).unwrap().token_id, "down-token");
        assert!(matches!(
            m.token(2),
            Err(MarketError::OutcomeOutOfRange { index: 2, available: 2 })
        ));
        assert!(matches!(market(vec![]).token(0), Err(MarketError::MissingTokens { .. })));
    }

    #[test]
    fn close_time_prefers_granular_field() {
        let mut m = market(vec![]);
        m.end_date_iso = Some(datetime!(2025-12-26 0:00 UTC));
        assert_eq!(m.close_time(), Some(datetime!(2025-12-26 0:00 UTC)));

        m.end_date = Some(datetime!(2025-12-25 22:00 UTC));
        assert_eq!(m.close_time(), Some(datetime!(2025-12-25 22:00 UTC)));
    }

    #[test]
    fn parse_timestamp_handles_both_forms() {
        assert_eq!(
            parse_timestamp("2025-12-25T22:00:00Z"),
            Some(datetime!(2025-12-25 22:00 UTC))
        );
        assert_eq!(parse_timestamp("2025-12-25"), Some(datetime!(2025-12-25 0:00 UTC)));
        assert_eq!(parse_timestamp("soon"), None);
    }

    #[test]
    fn gamma_market_decodes_encoded_arrays() {
        let gamma: GammaMarket = serde_json::from_value(serde_json::json!({
            "slug": "btc-updown-15m-1",
            "conditionId": "0xcond",
            "endDate": "2025-12-25T22:00:00Z",
            "clobTokenIds": "[\"111\", \"222\"]",
            "outcomes": "[\"Up\", \"Down\"]"
        }))
        .unwrap();

        let tokens = gamma.tokens();
        assert_eq!(tokens, vec![token("111", "Up"), token("222", "Down")]);
    }

    #[test]
    fn clob_market_merges_gamma_fields() {
        let gamma: GammaMarket = serde_json::from_value(serde_json::json!({
            "slug": "btc-updown-15m-1",
            "conditionId": "0xcond",
            "endDate": "2025-12-25T22:15:00Z",
            "clobTokenIds": "[\"111\", \"222\"]"
        }))
        .unwrap();
        let clob: ClobMarket = serde_json::from_value(serde_json::json!({
            "condition_id": "0xcond",
            "market_slug": "btc-updown-15m-1",
            "end_date_iso": "2025-12-25T00:00:00Z",
            "tokens": []
        }))
        .unwrap();

        let m = clob.into_market(Some(&gamma), "btc-updown-15m-1");
        assert_eq!(m.close_time(), Some(datetime!(2025-12-25 22:15 UTC)));
        assert_eq!(m.token(1).unwrap().token_id, "222");
    }
}
