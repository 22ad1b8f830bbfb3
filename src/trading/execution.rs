//! Order submission, listing and cancellation on the authenticated CLOB.

use polymarket_client_sdk::clob::types::request::OrdersRequest;
use tracing::{debug, info, instrument, warn};

use super::clob::{clob_order_type, clob_side, next_cursor, order_ack, token_id_from_str};
use super::order::{OpenOrder, OrderAck, OrderParams};
use crate::error::TradingError;
use crate::market::PolymarketClient;
use crate::metrics;

/// Build, sign and post a single limit order.
///
/// Transport, build and signing failures are returned as `Err`; an order
/// the venue answered but refused comes back as a non-success [`OrderAck`].
#[instrument(skip(client, params), fields(token = %params.token_id, side = %params.side))]
pub async fn submit_order(
    client: &PolymarketClient,
    params: &OrderParams,
) -> Result<OrderAck, TradingError> {
    params.validate().map_err(TradingError::InvalidParams)?;
    let session = client.session()?;
    let token_id = token_id_from_str(&params.token_id)?;

    debug!(
        price = %params.price,
        size = %params.size,
        order_type = %params.order_type,
        "Submitting order"
    );

    let _timer = metrics::timer_order_submit();

    let order = session
        .client()
        .limit_order()
        .token_id(token_id)
        .side(clob_side(params.side))
        .price(params.price)
        .size(params.size)
        .order_type(clob_order_type(params.order_type))
        .build()
        .await
        .map_err(|e| TradingError::SubmissionFailed(format!("failed to build order: {}", e)))?;

    let signed = session
        .client()
        .sign(session.signer(), order)
        .await
        .map_err(|e| TradingError::SigningError(e.to_string()))?;

    let response = session
        .client()
        .post_order(signed)
        .await
        .map_err(|e| TradingError::SubmissionFailed(e.to_string()))?;

    let ack = order_ack(response.success, response.order_id, response.error_msg);
    if let Some(order_id) = ack.accepted_id() {
        info!(
            order_id = %order_id,
            side = %params.side,
            price = %params.price,
            size = %params.size,
            "Order accepted"
        );
    } else {
        warn!(error = ?ack.error_msg, "Order not accepted");
    }

    Ok(ack)
}

/// List resting orders for a token, following pagination.
#[instrument(skip(client))]
pub async fn get_open_orders(
    client: &PolymarketClient,
    token_id: &str,
) -> Result<Vec<OpenOrder>, TradingError> {
    let session = client.session()?;
    let request = OrdersRequest::builder()
        .asset_id(token_id_from_str(token_id)?)
        .build();

    let mut orders = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = session
            .client()
            .orders(&request, cursor.take())
            .await
            .map_err(|e| TradingError::gateway("open_orders", e))?;

        orders.extend(page.data.into_iter().map(|order| OpenOrder {
            token_id: Some(token_id.to_string()),
            ..OpenOrder::with_id(order.id)
        }));

        match next_cursor(page.next_cursor) {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    debug!(count = orders.len(), "Retrieved open orders");
    Ok(orders)
}

/// Cancel a single order. An id the venue lists as not cancelled is an error.
#[instrument(skip(client))]
pub async fn cancel_order(client: &PolymarketClient, order_id: &str) -> Result<(), TradingError> {
    let session = client.session()?;

    let response = session
        .client()
        .cancel_order(order_id)
        .await
        .map_err(|e| TradingError::CancelFailed {
            order_id: order_id.to_string(),
            reason: e.to_string(),
        })?;

    if let Some(reason) = response.not_canceled.get(order_id) {
        return Err(TradingError::CancelFailed {
            order_id: order_id.to_string(),
            reason: reason.to_string(),
        });
    }

    debug!("Cancel acknowledged");
    Ok(())
}
