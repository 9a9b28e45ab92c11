use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::AppState;

const DEFAULT_LIMIT: u32 = 200;

#[derive(Deserialize)]
pub struct PricesQuery {
    #[serde(rename = "marketId")]
    pub market_id: Option<String>,
    pub limit: Option<u32>,
}

/// GET /api/prices?marketId=...&limit=200
///
/// Price snapshots for one market, newest first. A missing marketId is
/// rejected before any store access.
pub async fn get_prices(
    State(state): State<AppState>,
    Query(params): Query<PricesQuery>,
) -> Response {
    let Some(market_id) = params.market_id else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "marketId is required" })),
        )
            .into_response();
    };
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);

    match state.store.price_history(&market_id, limit).await {
        Ok(prices) => (StatusCode::OK, Json(json!({ "prices": prices }))).into_response(),
        Err(e) => {
            warn!("Failed to fetch prices for {market_id}: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch prices" })),
            )
                .into_response()
        }
    }
}
