pub mod analytics;
pub mod dashboard;
pub mod health;
pub mod positions;
pub mod prices;
pub mod trades;

/// One bounded fetch covering every trade the aggregates need. The agent's
/// store stays small (hundreds of trades, not millions), so aggregation runs
/// over a single ordered page rather than a streaming cursor.
pub(crate) const ALL_TRADES_LIMIT: u32 = 10_000;
