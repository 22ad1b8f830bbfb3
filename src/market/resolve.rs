//! Market resolution: slug or condition id to merged market metadata.

use tracing::{debug, info, instrument, warn};
use url::Url;

use super::client::PolymarketClient;
use super::types::{ClobMarket, GammaMarket, Market};
use crate::error::MarketError;

/// Extract the market slug from a Polymarket URL.
///
/// `https://polymarket.com/event/btc-updown-15m-1766699100?tid=1` gives
/// `btc-updown-15m-1766699100`. Input that is not a URL is taken as a slug.
pub fn slug_from_url(input: &str) -> Result<String, MarketError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(MarketError::InvalidUrl("empty input".to_string()));
    }

    let slug = match Url::parse(input) {
        Ok(url) => url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(str::to_string),
        Err(_) => input
            .split(['?', '#'])
            .next()
            .and_then(|path| path.split('/').filter(|s| !s.is_empty()).last())
            .map(str::to_string),
    };

    slug.ok_or_else(|| MarketError::InvalidUrl(input.to_string()))
}

/// Resolve a slug (or condition id) to a [`Market`].
///
/// Gamma is asked first because it carries the granular close time; its
/// condition id is then used for the CLOB lookup and the two are merged.
/// Without a Gamma match the identifier goes to the CLOB directly.
#[instrument(skip(client))]
pub async fn resolve_market(
    client: &PolymarketClient,
    identifier: &str,
) -> Result<Market, MarketError> {
    match fetch_gamma_market(client, identifier).await {
        Ok(Some(gamma)) => {
            if let Some(condition_id) = gamma.condition_id.clone() {
                info!(slug = %identifier, condition_id = %condition_id, "Resolved slug via Gamma");
                return match fetch_clob_market(client, &condition_id).await {
                    Ok(Some(clob)) => Ok(clob.into_market(Some(&gamma), identifier)),
                    Ok(None) => {
                        warn!(condition_id = %condition_id, "CLOB has no record, using Gamma data only");
                        Ok(gamma_only(&gamma, identifier))
                    }
                    Err(e) => Err(e),
                };
            }
            debug!("Gamma market has no condition id");
        }
        Ok(None) => debug!("Slug not known to Gamma"),
        Err(e) => warn!(error = %e, "Gamma lookup failed, falling back to CLOB"),
    }

    match fetch_clob_market(client, identifier).await? {
        Some(clob) => Ok(clob.into_market(None, identifier)),
        None => Err(MarketError::NotFound {
            identifier: identifier.to_string(),
        }),
    }
}

fn gamma_only(gamma: &GammaMarket, identifier: &str) -> Market {
    let clob = ClobMarket {
        condition_id: gamma.condition_id.clone(),
        market_slug: gamma.slug.clone(),
        question: None,
        end_date_iso: None,
        tokens: Vec::new(),
        neg_risk: false,
    };
    clob.into_market(Some(gamma), identifier)
}

/// Look up a market by slug on the Gamma API.
async fn fetch_gamma_market(
    client: &PolymarketClient,
    slug: &str,
) -> Result<Option<GammaMarket>, MarketError> {
    let url = format!("{}/markets", client.gamma_url());
    let response = client.http().get(&url).query(&[("slug", slug)]).send().await?;

    if !response.status().is_success() {
        return Err(MarketError::FetchFailed {
            slug: slug.to_string(),
            reason: format!("Gamma HTTP {}", response.status()),
        });
    }

    let markets: Vec<GammaMarket> = response.json().await.map_err(|e| {
        MarketError::ParseError(format!("Failed to parse Gamma API response: {}", e))
    })?;

    Ok(markets.into_iter().next())
}

/// Look up a market by condition id (or slug) on the CLOB API.
async fn fetch_clob_market(
    client: &PolymarketClient,
    id: &str,
) -> Result<Option<ClobMarket>, MarketError> {
    let url = format!("{}/markets/{}", client.clob_url(), id);
    let response = client.http().get(&url).send().await?;

    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !response.status().is_success() {
        return Err(MarketError::FetchFailed {
            slug: id.to_string(),
            reason: format!("CLOB HTTP {}", response.status()),
        });
    }

    let market: ClobMarket = response
        .json()
        .await
        .map_err(|e| MarketError::ParseError(format!("Failed to parse CLOB market: {}", e)))?;

    // The CLOB answers unknown ids with an empty record rather than a 404
    if market.condition_id.as_deref().unwrap_or_default().is_empty() && market.tokens.is_empty() {
        return Ok(None);
    }

    Ok(Some(market))
}
