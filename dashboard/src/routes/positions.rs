use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use super::ALL_TRADES_LIMIT;
use crate::store::{self, SharedStore};
use crate::types::{PricePoint, Side, Trade, TradeFilter, TradeStatus};
use crate::AppState;

#[derive(Serialize)]
struct Position {
    #[serde(flatten)]
    trade: Trade,
    #[serde(with = "rust_decimal::serde::float_option")]
    current_price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    unrealized_pnl: Option<Decimal>,
}

/// Attach the latest snapshot price to an open trade. Both derived fields are
/// null when the market has no recorded history yet.
fn enrich(trade: Trade, latest: Option<&PricePoint>) -> Position {
    let current_price = latest.map(|p| match trade.side {
        Side::Yes => p.yes_price,
        Side::No => p.no_price,
    });
    let unrealized_pnl = current_price.map(|price| (price - trade.entry_price) * trade.size);
    Position { trade, current_price, unrealized_pnl }
}

/// GET /api/positions
///
/// Open trades enriched with current price and unrealized pnl from the most
/// recent snapshot per market.
pub async fn get_positions(State(state): State<AppState>) -> Response {
    match build_positions(&state.store).await {
        Ok(positions) => {
            (StatusCode::OK, Json(json!({ "positions": positions }))).into_response()
        }
        Err(e) => {
            warn!("Failed to build positions: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch positions" })),
            )
                .into_response()
        }
    }
}

async fn build_positions(store: &SharedStore) -> store::Result<Vec<Position>> {
    let open = TradeFilter::by_status(TradeStatus::Open);
    let positions = store.trades(&open, ALL_TRADES_LIMIT, 0).await?;

    let market_ids: Vec<String> = positions.iter().map(|t| t.market_id.clone()).collect();
    let latest = store.latest_prices(&market_ids).await?;

    Ok(positions
        .into_iter()
        .map(|trade| {
            let point = latest.get(&trade.market_id);
            enrich(trade, point)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn open_trade(side: Side, entry_price: Decimal, size: Decimal) -> Trade {
        Trade {
            id: 1,
            strategy: "arb".to_string(),
            market_id: "mkt-1".to_string(),
            condition_id: None,
            market_question: "Question?".to_string(),
            side,
            entry_price,
            size,
            cost_usd: entry_price * size,
            fair_value_estimate: dec!(0.50),
            edge: dec!(0.10),
            kelly_fraction: dec!(0.25),
            status: TradeStatus::Open,
            exit_price: None,
            pnl: None,
            order_id: None,
            created_at: "2026-08-01T10:00:00+00:00".parse().unwrap(),
            closed_at: None,
        }
    }

    fn snapshot(yes: Decimal, no: Decimal) -> PricePoint {
        PricePoint {
            id: 1,
            market_id: "mkt-1".to_string(),
            condition_id: None,
            market_question: "Question?".to_string(),
            yes_price: yes,
            no_price: no,
            volume: None,
            liquidity: None,
            recorded_at: "2026-08-01T12:00:00+00:00".parse().unwrap(),
        }
    }

    #[test]
    fn test_enrich_yes_side_uses_yes_price() {
        let pos = enrich(
            open_trade(Side::Yes, dec!(0.40), dec!(100)),
            Some(&snapshot(dec!(0.45), dec!(0.55))),
        );
        assert_eq!(pos.current_price, Some(dec!(0.45)));
        // (0.45 - 0.40) * 100
        assert_eq!(pos.unrealized_pnl, Some(dec!(5.00)));
    }

    #[test]
    fn test_enrich_no_side_uses_no_price() {
        let pos = enrich(
            open_trade(Side::No, dec!(0.60), dec!(50)),
            Some(&snapshot(dec!(0.45), dec!(0.55))),
        );
        assert_eq!(pos.current_price, Some(dec!(0.55)));
        // (0.55 - 0.60) * 50
        assert_eq!(pos.unrealized_pnl, Some(dec!(-2.50)));
    }

    #[test]
    fn test_enrich_without_snapshot_is_null() {
        let pos = enrich(open_trade(Side::Yes, dec!(0.40), dec!(100)), None);
        assert!(pos.current_price.is_none());
        assert!(pos.unrealized_pnl.is_none());
    }
}
