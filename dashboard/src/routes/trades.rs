use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::store::{self, SharedStore};
use crate::types::{Trade, TradeFilter, TradeStatus};
use crate::AppState;

const DEFAULT_LIMIT: u32 = 50;

#[derive(Deserialize)]
pub struct TradesQuery {
    pub status: Option<String>,
    pub strategy: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Serialize)]
struct TradesPayload {
    trades: Vec<Trade>,
    total: u64,
    strategies: Vec<String>,
}

/// GET /api/trades?status=open&strategy=arb&limit=50&offset=0
///
/// Paginated trade listing. `status` and `strategy` are ANDed when both are
/// given; each parameter is validated independently. An empty parameter value
/// means "no filter", same as an absent one.
pub async fn get_trades(
    State(state): State<AppState>,
    Query(params): Query<TradesQuery>,
) -> Response {
    let status = match params.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => match raw.parse::<TradeStatus>() {
            Ok(status) => Some(status),
            Err(e) => {
                return (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() })))
                    .into_response();
            }
        },
        None => None,
    };
    let strategy = params.strategy.filter(|s| !s.is_empty());

    let filter = TradeFilter { status, strategy };
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    let offset = params.offset.unwrap_or(0);

    match list_trades(&state.store, &filter, limit, offset).await {
        Ok(payload) => (StatusCode::OK, Json(payload)).into_response(),
        Err(e) => {
            warn!("Failed to list trades: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch trades" })),
            )
                .into_response()
        }
    }
}

async fn list_trades(
    store: &SharedStore,
    filter: &TradeFilter,
    limit: u32,
    offset: u32,
) -> store::Result<TradesPayload> {
    let (trades, total, strategies) = futures::try_join!(
        store.trades(filter, limit, offset),
        store.trade_count(filter),
        store.strategies(),
    )?;
    Ok(TradesPayload { trades, total, strategies })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::sqlite::tests::{insert_trade, FixtureDb};
    use std::sync::Arc;

    fn query(status: Option<&str>) -> Query<TradesQuery> {
        Query(TradesQuery {
            status: status.map(str::to_string),
            strategy: None,
            limit: None,
            offset: None,
        })
    }

    #[tokio::test]
    async fn test_invalid_status_is_bad_request() {
        let fx = FixtureDb::new();
        let state = AppState { store: Arc::new(fx.store()) };

        let response = get_trades(State(state), query(Some("cancelled"))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_empty_filter_values_mean_no_filter() {
        let fx = FixtureDb::new();
        let conn = fx.conn();
        insert_trade(&conn, 1, "arb", "open", "10", None, "2026-08-01T10:00:00+00:00", None);
        insert_trade(&conn, 2, "news", "closed", "20", Some("5"), "2026-08-02T10:00:00+00:00", Some("2026-08-03T10:00:00+00:00"));
        let state = AppState { store: Arc::new(fx.store()) };

        // ?status=&strategy= lists everything, same as omitting both.
        let query = Query(TradesQuery {
            status: Some(String::new()),
            strategy: Some(String::new()),
            limit: None,
            offset: None,
        });
        let response = get_trades(State(state), query).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["total"], 2);
    }

    #[tokio::test]
    async fn test_listing_with_filter() {
        let fx = FixtureDb::new();
        let conn = fx.conn();
        insert_trade(&conn, 1, "arb", "open", "10", None, "2026-08-01T10:00:00+00:00", None);
        insert_trade(&conn, 2, "arb", "closed", "20", Some("5"), "2026-08-02T10:00:00+00:00", Some("2026-08-03T10:00:00+00:00"));
        let state = AppState { store: Arc::new(fx.store()) };

        let response = get_trades(State(state), query(Some("open"))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
