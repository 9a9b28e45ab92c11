use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use super::ALL_TRADES_LIMIT;
use crate::aggregate::{self, PnlPoint, StrategyWinRate};
use crate::store::{self, SharedStore};
use crate::types::{AgentState, Trade, TradeFilter, TradeStatus};
use crate::AppState;

const BEST_WORST_LIMIT: usize = 5;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyticsPayload {
    pnl_over_time: Vec<PnlPoint>,
    win_rate_by_strategy: Vec<StrategyWinRate>,
    best_trades: Vec<Trade>,
    worst_trades: Vec<Trade>,
    state: Option<AgentState>,
    total_trades: u64,
    closed_trades: u64,
}

/// GET /api/analytics
pub async fn get_analytics(State(state): State<AppState>) -> Response {
    match build_analytics(&state.store).await {
        Ok(payload) => (StatusCode::OK, Json(payload)).into_response(),
        Err(e) => {
            warn!("Failed to build analytics: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch analytics" })),
            )
                .into_response()
        }
    }
}

async fn build_analytics(store: &SharedStore) -> store::Result<AnalyticsPayload> {
    let closed = TradeFilter::by_status(TradeStatus::Closed);
    let resolved = TradeFilter::by_status(TradeStatus::Resolved);
    let all = TradeFilter::default();

    let (trades, state, total_trades, closed_count, resolved_count) = futures::try_join!(
        store.trades(&all, ALL_TRADES_LIMIT, 0),
        store.agent_state(),
        store.trade_count(&all),
        store.trade_count(&closed),
        store.trade_count(&resolved),
    )?;

    let (best_trades, worst_trades) = aggregate::best_worst_trades(&trades, BEST_WORST_LIMIT);

    Ok(AnalyticsPayload {
        pnl_over_time: aggregate::pnl_over_time(&trades),
        win_rate_by_strategy: aggregate::win_rate_by_strategy(&trades),
        best_trades,
        worst_trades,
        state,
        total_trades,
        closed_trades: closed_count + resolved_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::sqlite::tests::{insert_trade, FixtureDb};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_analytics_payload_shape() {
        let fx = FixtureDb::new();
        let conn = fx.conn();
        insert_trade(&conn, 1, "arb", "closed", "10", Some("10"), "2026-08-01T10:00:00+00:00", Some("2026-08-02T10:00:00+00:00"));
        insert_trade(&conn, 2, "arb", "closed", "10", Some("-5"), "2026-08-02T10:00:00+00:00", Some("2026-08-03T10:00:00+00:00"));
        insert_trade(&conn, 3, "news", "resolved", "10", Some("3"), "2026-08-03T10:00:00+00:00", Some("2026-08-03T18:00:00+00:00"));
        insert_trade(&conn, 4, "news", "open", "10", None, "2026-08-04T10:00:00+00:00", None);
        let state = AppState { store: Arc::new(fx.store()) };

        let response = get_analytics(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["totalTrades"], 4);
        assert_eq!(json["closedTrades"], 3);

        // Daily buckets ascending with running cumulative sum.
        let pnl = json["pnlOverTime"].as_array().unwrap();
        assert_eq!(pnl[0]["date"], "2026-08-02");
        assert_eq!(pnl[0]["cumulative_pnl"], 10.0);
        assert_eq!(pnl.last().unwrap()["cumulative_pnl"], 8.0);

        let rates = json["winRateByStrategy"].as_array().unwrap();
        assert_eq!(rates[0]["strategy"], "arb");
        assert_eq!(rates[0]["win_rate"], 50.0);
        assert_eq!(rates[1]["strategy"], "news");
        assert_eq!(rates[1]["win_rate"], 100.0);

        assert_eq!(json["bestTrades"][0]["id"], 1);
        assert_eq!(json["worstTrades"][0]["id"], 2);
    }
}
