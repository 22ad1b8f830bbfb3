//! Integration tests for the Polymarket ladder bot.
//!
//! Session tests run against the in-memory mock venue. Tests marked
//! `#[ignore]` talk to the real Polymarket API; the wallet tests also need a
//! valid POLYMARKET_PRIVATE_KEY. Run them with:
//! cargo test --test integration -- --ignored

use std::time::Duration;

use polymarket_ladder::bot::{LadderBot, SessionOptions, Strategy};
use polymarket_ladder::config::Config;
use polymarket_ladder::error::{BotError, MonitorError};
use polymarket_ladder::gateway::mock::{BookBuilder, MockGateway, SubmitBehavior};
use polymarket_ladder::gateway::{MarketSource, OrderBookReader, OrderGateway};
use polymarket_ladder::market::{search_markets, slug_from_url, Market, OutcomeToken, PolymarketClient};
use polymarket_ladder::monitor::{MonitorOutcome, MonitorSettings};
use polymarket_ladder::trading::Side;
use rust_decimal_macros::dec;
use time::OffsetDateTime;

const SLUG: &str = "btc-updown-15m-1766699100";

fn market(minutes_left: i64) -> Market {
    Market {
        slug: SLUG.to_string(),
        condition_id: "0xfeed".to_string(),
        question: Some("Bitcoin Up or Down - December 25, 4:45PM-5:00PM ET".to_string()),
        end_date: Some(OffsetDateTime::now_utc() + time::Duration::minutes(minutes_left)),
        end_date_iso: None,
        tokens: vec![
            OutcomeToken {
                token_id: "tok-up".to_string(),
                outcome: "Up".to_string(),
            },
            OutcomeToken {
                token_id: "tok-down".to_string(),
                outcome: "Down".to_string(),
            },
        ],
        neg_risk: false,
    }
}

fn strategy() -> Strategy {
    Strategy {
        ladder_prices: vec![dec!(0.10), dec!(0.20), dec!(0.30)],
        size_per_step: dec!(10),
        profit_multiple: dec!(1.3),
        exit_price: dec!(0.01),
        monitor: MonitorSettings {
            poll_interval: Duration::ZERO,
            wait_interval: Duration::ZERO,
            max_consecutive_errors: None,
            max_duration: None,
        },
    }
}

fn options() -> SessionOptions {
    SessionOptions {
        time_threshold_minutes: 13,
        outcome_index: 1,
    }
}

fn bot(minutes_left: i64) -> LadderBot<MockGateway> {
    let gateway = MockGateway::new();
    gateway.add_market(market(minutes_left));
    LadderBot::new(gateway, strategy())
}

#[tokio::test]
async fn session_waits_for_fills_holds_then_takes_profit() {
    let bot = bot(30);
    let gateway = bot.gateway();
    // two polls with nothing filled, then a partial fill below target
    gateway.push_balance(dec!(0));
    gateway.push_balance(dec!(0));
    gateway.push_order_book(
        BookBuilder::new("tok-down")
            .with_spread(dec!(0.20), dec!(0.22), dec!(100))
            .build(),
    );
    gateway.set_balance(dec!(30));
    gateway.set_order_book(
        BookBuilder::new("tok-down")
            .with_spread(dec!(0.35), dec!(0.36), dec!(100))
            .build(),
    );

    let report = bot.run(SLUG, options()).await.unwrap();

    assert!(report.time_gate_passed);
    let outcome = report.outcome.unwrap();
    assert_eq!(outcome.polls(), 4);
    match outcome {
        MonitorOutcome::Exited {
            amount,
            value,
            target,
            liquidation,
            ..
        } => {
            assert_eq!(amount, dec!(30));
            assert_eq!(value, dec!(10.5));
            assert_eq!(target, dec!(7.8));
            assert_eq!(liquidation.cancelled.len(), 3);
            assert!(liquidation.is_clean());
        }
        other => panic!("expected exit, got {:?}", other),
    }

    let sells = gateway.submitted_on(Side::Sell);
    assert_eq!(sells.len(), 1);
    assert_eq!(sells[0].size, dec!(30));
    assert_eq!(sells[0].price, dec!(0.01));
}

#[tokio::test]
async fn session_with_every_rung_refused_finishes_flat() {
    let bot = bot(30);
    bot.gateway().script_submissions(vec![
        SubmitBehavior::Reject("not enough balance / allowance".to_string());
        3
    ]);

    let report = bot.run(SLUG, options()).await.unwrap();

    assert_eq!(report.execution.map(|e| e.placed.len()), Some(0));
    assert_eq!(report.outcome, Some(MonitorOutcome::Finished { polls: 1 }));
    assert!(bot.gateway().submitted_on(Side::Sell).is_empty());
}

#[tokio::test]
async fn closing_market_is_skipped() {
    let bot = bot(5);

    let report = bot.run(SLUG, options()).await.unwrap();

    assert!(report.skipped());
    assert!(bot.gateway().submitted().is_empty());
}

#[tokio::test]
async fn stuck_venue_hits_retry_bound() {
    let gateway = MockGateway::new();
    gateway.add_market(market(30));
    for _ in 0..10 {
        gateway.push_balance_error("503 Service Unavailable");
    }
    let bot = LadderBot::new(
        gateway,
        Strategy {
            monitor: MonitorSettings {
                max_consecutive_errors: Some(4),
                ..strategy().monitor
            },
            ..strategy()
        },
    );

    let err = bot.run(SLUG, options()).await.unwrap_err();

    assert!(matches!(
        err,
        BotError::Monitor(MonitorError::RetryLimitExceeded { attempts: 4 })
    ));
    assert_eq!(bot.gateway().balance_calls(), 4);
}

#[test]
fn market_urls_reduce_to_slugs() {
    assert_eq!(
        slug_from_url("https://polymarket.com/event/btc-updown-15m-1766699100?tid=1").unwrap(),
        SLUG
    );
    assert_eq!(slug_from_url(SLUG).unwrap(), SLUG);
}

// === Live API tests ===

fn live_config() -> Option<Config> {
    dotenvy::dotenv().ok();
    let config = Config::load().ok()?;

    // Skip if using placeholder key
    if config.polymarket_private_key.starts_with("0x1234")
        || config.polymarket_private_key.len() < 64
    {
        return None;
    }
    Some(config)
}

fn public_config() -> Config {
    dotenvy::dotenv().ok();
    Config::load().expect("config loads without a private key")
}

/// Test that we can derive the wallet address.
#[tokio::test]
#[ignore = "requires POLYMARKET_PRIVATE_KEY"]
async fn test_get_address() {
    let Some(config) = live_config() else {
        println!("Skipping: POLYMARKET_PRIVATE_KEY not set or invalid");
        return;
    };
    let client = PolymarketClient::new(&config).unwrap();

    let address = client.get_address().unwrap();
    assert!(address.starts_with("0x"), "Invalid address format");
    assert_eq!(address.len(), 42, "Address should be 42 characters");
}

/// Test keyword search over the live listing.
#[tokio::test]
#[ignore = "requires network access"]
async fn test_search_markets() {
    let client = PolymarketClient::new(&public_config()).unwrap();

    let markets = search_markets(&client, "bitcoin").await.unwrap();
    for market in &markets {
        let haystack = format!("{} {}", market.question, market.market_slug).to_lowercase();
        assert!(haystack.contains("bitcoin"));
    }
}

/// Test resolving a market and reading its book. Needs TEST_MARKET_SLUG.
#[tokio::test]
#[ignore = "requires network access and TEST_MARKET_SLUG"]
async fn test_resolve_and_read_book() {
    let Ok(slug) = std::env::var("TEST_MARKET_SLUG") else {
        println!("Skipping: TEST_MARKET_SLUG not set");
        return;
    };
    let client = PolymarketClient::new(&public_config()).unwrap();

    let market = client.resolve_market(&slug).await.unwrap();
    assert!(!market.tokens.is_empty(), "market has no tokens");

    let book = client.order_book(&market.tokens[0].token_id).await.unwrap();
    if let (Some(bid), Some(ask)) = (book.best_bid(), book.best_ask()) {
        assert!(bid <= ask, "crossed book: {} > {}", bid, ask);
    }
}

/// Test that the wallet authenticates and can read its own orders and balance.
#[tokio::test]
#[ignore = "requires POLYMARKET_PRIVATE_KEY and TEST_TOKEN_ID"]
async fn test_authenticated_session_reads_account() {
    let Some(config) = live_config() else {
        println!("Skipping: POLYMARKET_PRIVATE_KEY not set or invalid");
        return;
    };
    let Ok(token_id) = std::env::var("TEST_TOKEN_ID") else {
        println!("Skipping: TEST_TOKEN_ID not set");
        return;
    };
    let client = PolymarketClient::connect(&config).await.unwrap();
    assert!(client.is_authenticated());

    let balance = client.balance(&token_id).await.unwrap();
    assert!(balance >= rust_decimal::Decimal::ZERO);
    client.open_orders(&token_id).await.unwrap();
}
