//! Read-only access to the record store the trading agent owns.
//!
//! The agent process is the only writer; this side never creates schema,
//! never migrates, and never updates a row. Both backends expose the same
//! accessor surface through [`RecordStore`], so the aggregation and route
//! layers are written once against the trait.

pub mod sqlite;
pub mod supabase;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::types::{AgentState, ApiCost, PricePoint, ScanLog, Trade, TradeFilter};

/// Failure talking to the backing store. Queries fail closed: callers get an
/// error, never an empty result that could be mistaken for "no data exists".
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    #[error("query failed: {0}")]
    Query(#[from] rusqlite::Error),
    #[error("backend request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed record: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// The five read capabilities the dashboard needs, plus the append-only logs.
///
/// Ordering contracts: `trades` is `created_at` descending, `price_history`
/// and `api_costs` are `recorded_at`/`created_at` descending, `strategies`
/// is sorted ascending. `offset` skips that many rows of the ordered result.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// The singleton state row, or None if the agent has not written it yet.
    async fn agent_state(&self) -> Result<Option<AgentState>>;

    async fn trades(&self, filter: &TradeFilter, limit: u32, offset: u32) -> Result<Vec<Trade>>;

    async fn trade_count(&self, filter: &TradeFilter) -> Result<u64>;

    /// Distinct strategy tags seen across all trades, sorted.
    async fn strategies(&self) -> Result<Vec<String>>;

    async fn price_history(&self, market_id: &str, limit: u32) -> Result<Vec<PricePoint>>;

    /// Most recent snapshot per market. Markets with no history are omitted
    /// from the map rather than mapped to a placeholder.
    async fn latest_prices(&self, market_ids: &[String]) -> Result<HashMap<String, PricePoint>>;

    /// API spend log, newest first. Part of the store contract; the overview
    /// tab reads the running total from `AgentState` instead.
    #[allow(dead_code)]
    async fn api_costs(&self, limit: u32) -> Result<Vec<ApiCost>>;

    /// Scan-cycle log. Part of the store contract but not surfaced by any
    /// dashboard view yet.
    #[allow(dead_code)]
    async fn scan_logs(&self, limit: u32) -> Result<Vec<ScanLog>>;
}

pub type SharedStore = Arc<dyn RecordStore>;
