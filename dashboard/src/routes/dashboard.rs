use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use super::ALL_TRADES_LIMIT;
use crate::aggregate::{self, StrategyExposure};
use crate::store::{self, SharedStore};
use crate::types::{AgentState, Trade, TradeFilter, TradeStatus};
use crate::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DashboardSummary {
    state: Option<AgentState>,
    #[serde(with = "rust_decimal::serde::float")]
    exposure: Decimal,
    open_count: u64,
    /// Resolved trades fold into "closed" for display.
    closed_count: u64,
    exposure_by_strategy: Vec<StrategyExposure>,
    recent_trades: Vec<Trade>,
    strategies: Vec<String>,
}

/// GET /api/dashboard
///
/// The overview composite: agent state plus exposure, counts, recent trades
/// and strategy list in one payload.
pub async fn get_dashboard(State(state): State<AppState>) -> Response {
    match build_summary(&state.store).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => {
            warn!("Failed to build dashboard summary: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch dashboard data" })),
            )
                .into_response()
        }
    }
}

async fn build_summary(store: &SharedStore) -> store::Result<DashboardSummary> {
    let open = TradeFilter::by_status(TradeStatus::Open);
    let closed = TradeFilter::by_status(TradeStatus::Closed);
    let resolved = TradeFilter::by_status(TradeStatus::Resolved);
    let all = TradeFilter::default();

    // Seven independent reads with no ordering dependency between them.
    let (state, open_trades, open_count, closed_count, resolved_count, recent_trades, strategies) =
        futures::try_join!(
            store.agent_state(),
            store.trades(&open, ALL_TRADES_LIMIT, 0),
            store.trade_count(&open),
            store.trade_count(&closed),
            store.trade_count(&resolved),
            store.trades(&all, 10, 0),
            store.strategies(),
        )?;

    Ok(DashboardSummary {
        state,
        exposure: aggregate::total_exposure(&open_trades),
        open_count,
        closed_count: closed_count + resolved_count,
        exposure_by_strategy: aggregate::exposure_by_strategy(&open_trades),
        recent_trades,
        strategies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::sqlite::tests::{insert_trade, FixtureDb};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_summary_payload_shape() {
        let fx = FixtureDb::new();
        let conn = fx.conn();
        insert_trade(&conn, 1, "arb", "open", "100", None, "2026-08-01T10:00:00+00:00", None);
        insert_trade(&conn, 2, "arb", "open", "50", None, "2026-08-02T10:00:00+00:00", None);
        insert_trade(&conn, 3, "news", "closed", "20", Some("5"), "2026-08-03T10:00:00+00:00", Some("2026-08-04T10:00:00+00:00"));
        insert_trade(&conn, 4, "news", "resolved", "30", Some("-3"), "2026-08-05T10:00:00+00:00", Some("2026-08-06T10:00:00+00:00"));
        let state = AppState { store: Arc::new(fx.store()) };

        let response = get_dashboard(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["exposure"], 150.0);
        assert_eq!(json["openCount"], 2);
        // Resolved folds into closed for display.
        assert_eq!(json["closedCount"], 2);
        assert_eq!(json["exposureByStrategy"][0]["strategy"], "arb");
        assert_eq!(json["exposureByStrategy"][0]["exposure"], 150.0);
        assert_eq!(json["recentTrades"].as_array().unwrap().len(), 4);
        assert_eq!(json["recentTrades"][0]["id"], 4); // newest first
        assert_eq!(json["strategies"], serde_json::json!(["arb", "news"]));
        // No state row written yet.
        assert!(json["state"].is_null());
    }
}
