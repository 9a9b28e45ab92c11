//! Embedded SQLite backend. Opens the agent's database file strictly
//! read-only; the agent writes decimals as TEXT and timestamps as RFC 3339.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, ToSql};
use rust_decimal::Decimal;

use super::{RecordStore, Result, StoreError};
use crate::types::{AgentState, ApiCost, PricePoint, ScanLog, Trade, TradeFilter};

pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Open the store at `path`. The file must already exist and be readable;
    /// this system never creates it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Err(StoreError::Unavailable(format!(
                "database not found: {} (is the agent configured to write there?)",
                path.display()
            )));
        }
        let store = Self { path };
        // Probe once so a corrupt or unreadable file fails at startup
        // instead of on the first poll.
        store.conn()?;
        Ok(store)
    }

    fn conn(&self) -> Result<Connection> {
        Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(Into::into)
    }
}

/// Translate a [`TradeFilter`] into a WHERE clause and its bound parameters.
/// This is the only place filter predicates are assembled.
fn filter_sql(filter: &TradeFilter) -> (String, Vec<Box<dyn ToSql>>) {
    let mut conds: Vec<&str> = Vec::new();
    let mut params: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(status) = filter.status {
        conds.push("status = ?");
        params.push(Box::new(status.to_string()));
    }
    if let Some(ref strategy) = filter.strategy {
        conds.push("strategy = ?");
        params.push(Box::new(strategy.clone()));
    }

    let clause = if conds.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conds.join(" AND "))
    };
    (clause, params)
}

fn decimal(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn decimal_opt(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) => Decimal::from_str(&raw)
            .map(Some)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
        None => Ok(None),
    }
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn timestamp_opt(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) => DateTime::parse_from_rfc3339(&raw)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
        None => Ok(None),
    }
}

fn tag<T: FromStr<Err = crate::types::InvalidTag>>(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

const TRADE_COLUMNS: &str = "id, strategy, market_id, condition_id, market_question, side, \
     entry_price, size, cost_usd, fair_value_estimate, edge, kelly_fraction, \
     status, exit_price, pnl, order_id, created_at, closed_at";

fn trade_from_row(row: &Row<'_>) -> rusqlite::Result<Trade> {
    Ok(Trade {
        id: row.get(0)?,
        strategy: row.get(1)?,
        market_id: row.get(2)?,
        condition_id: row.get(3)?,
        market_question: row.get(4)?,
        side: tag(row, 5)?,
        entry_price: decimal(row, 6)?,
        size: decimal(row, 7)?,
        cost_usd: decimal(row, 8)?,
        fair_value_estimate: decimal(row, 9)?,
        edge: decimal(row, 10)?,
        kelly_fraction: decimal(row, 11)?,
        status: tag(row, 12)?,
        exit_price: decimal_opt(row, 13)?,
        pnl: decimal_opt(row, 14)?,
        order_id: row.get(15)?,
        created_at: timestamp(row, 16)?,
        closed_at: timestamp_opt(row, 17)?,
    })
}

fn price_from_row(row: &Row<'_>) -> rusqlite::Result<PricePoint> {
    Ok(PricePoint {
        id: row.get(0)?,
        market_id: row.get(1)?,
        condition_id: row.get(2)?,
        market_question: row.get(3)?,
        yes_price: decimal(row, 4)?,
        no_price: decimal(row, 5)?,
        volume: decimal_opt(row, 6)?,
        liquidity: decimal_opt(row, 7)?,
        recorded_at: timestamp(row, 8)?,
    })
}

const PRICE_COLUMNS: &str =
    "id, market_id, condition_id, market_question, yes_price, no_price, volume, liquidity, recorded_at";

#[async_trait]
impl RecordStore for SqliteStore {
    async fn agent_state(&self) -> Result<Option<AgentState>> {
        let conn = self.conn()?;
        let state = conn
            .query_row(
                "SELECT bankroll, total_pnl, total_api_cost, is_alive, updated_at \
                 FROM agent_state WHERE id = 1",
                [],
                |row| {
                    Ok(AgentState {
                        bankroll: decimal(row, 0)?,
                        total_pnl: decimal(row, 1)?,
                        total_api_cost: decimal(row, 2)?,
                        is_alive: row.get::<_, i64>(3)? != 0,
                        updated_at: timestamp(row, 4)?,
                    })
                },
            )
            .optional()?;
        Ok(state)
    }

    async fn trades(&self, filter: &TradeFilter, limit: u32, offset: u32) -> Result<Vec<Trade>> {
        let conn = self.conn()?;
        let (clause, mut params) = filter_sql(filter);
        params.push(Box::new(limit as i64));
        params.push(Box::new(offset as i64));

        let sql = format!(
            "SELECT {TRADE_COLUMNS} FROM trades{clause} \
             ORDER BY created_at DESC LIMIT ? OFFSET ?"
        );
        let mut stmt = conn.prepare(&sql)?;
        let refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let rows = stmt.query_map(&refs[..], trade_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    async fn trade_count(&self, filter: &TradeFilter) -> Result<u64> {
        let conn = self.conn()?;
        let (clause, params) = filter_sql(filter);
        let sql = format!("SELECT COUNT(*) FROM trades{clause}");
        let refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let count: i64 = conn.query_row(&sql, &refs[..], |row| row.get(0))?;
        Ok(count as u64)
    }

    async fn strategies(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT DISTINCT strategy FROM trades ORDER BY strategy")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    async fn price_history(&self, market_id: &str, limit: u32) -> Result<Vec<PricePoint>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {PRICE_COLUMNS} FROM price_history \
             WHERE market_id = ? ORDER BY recorded_at DESC LIMIT ?"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params![market_id, limit as i64], price_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    async fn latest_prices(&self, market_ids: &[String]) -> Result<HashMap<String, PricePoint>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {PRICE_COLUMNS} FROM price_history \
             WHERE market_id = ? ORDER BY recorded_at DESC LIMIT 1"
        );
        let mut stmt = conn.prepare(&sql)?;

        let mut latest = HashMap::new();
        for market_id in market_ids {
            let row = stmt
                .query_row(rusqlite::params![market_id], price_from_row)
                .optional()?;
            if let Some(point) = row {
                latest.insert(market_id.clone(), point);
            }
        }
        Ok(latest)
    }

    async fn api_costs(&self, limit: u32) -> Result<Vec<ApiCost>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, service, cost_usd, tokens_used, created_at \
             FROM api_costs ORDER BY created_at DESC LIMIT ?",
        )?;
        let rows = stmt.query_map(rusqlite::params![limit as i64], |row| {
            Ok(ApiCost {
                id: row.get(0)?,
                service: row.get(1)?,
                cost_usd: decimal(row, 2)?,
                tokens_used: row.get(3)?,
                created_at: timestamp(row, 4)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    async fn scan_logs(&self, limit: u32) -> Result<Vec<ScanLog>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, strategy, markets_scanned, opportunities_found, trades_placed, created_at \
             FROM scan_logs ORDER BY created_at DESC LIMIT ?",
        )?;
        let rows = stmt.query_map(rusqlite::params![limit as i64], |row| {
            Ok(ScanLog {
                id: row.get(0)?,
                strategy: row.get(1)?,
                markets_scanned: row.get(2)?,
                opportunities_found: row.get(3)?,
                trades_placed: row.get(4)?,
                created_at: timestamp(row, 5)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::TradeStatus;

    /// Throwaway database seeded like the agent would write it. Removed on drop.
    pub(crate) struct FixtureDb {
        pub path: PathBuf,
    }

    impl FixtureDb {
        pub fn new() -> Self {
            let path = std::env::temp_dir()
                .join(format!("dashboard-test-{}.db", uuid::Uuid::new_v4()));
            let conn = Connection::open(&path).expect("create fixture db");
            conn.execute_batch(
                "
                CREATE TABLE agent_state (
                    id INTEGER PRIMARY KEY,
                    bankroll TEXT NOT NULL,
                    total_pnl TEXT NOT NULL,
                    total_api_cost TEXT NOT NULL,
                    is_alive INTEGER NOT NULL,
                    updated_at TEXT NOT NULL
                );
                CREATE TABLE trades (
                    id INTEGER PRIMARY KEY,
                    strategy TEXT NOT NULL,
                    market_id TEXT NOT NULL,
                    condition_id TEXT,
                    market_question TEXT NOT NULL,
                    side TEXT NOT NULL,
                    entry_price TEXT NOT NULL,
                    size TEXT NOT NULL,
                    cost_usd TEXT NOT NULL,
                    fair_value_estimate TEXT NOT NULL,
                    edge TEXT NOT NULL,
                    kelly_fraction TEXT NOT NULL,
                    status TEXT NOT NULL,
                    exit_price TEXT,
                    pnl TEXT,
                    order_id TEXT,
                    created_at TEXT NOT NULL,
                    closed_at TEXT
                );
                CREATE TABLE price_history (
                    id INTEGER PRIMARY KEY,
                    market_id TEXT NOT NULL,
                    condition_id TEXT,
                    market_question TEXT NOT NULL,
                    yes_price TEXT NOT NULL,
                    no_price TEXT NOT NULL,
                    volume TEXT,
                    liquidity TEXT,
                    recorded_at TEXT NOT NULL
                );
                CREATE TABLE api_costs (
                    id INTEGER PRIMARY KEY,
                    service TEXT NOT NULL,
                    cost_usd TEXT NOT NULL,
                    tokens_used INTEGER NOT NULL,
                    created_at TEXT NOT NULL
                );
                CREATE TABLE scan_logs (
                    id INTEGER PRIMARY KEY,
                    strategy TEXT NOT NULL,
                    markets_scanned INTEGER NOT NULL,
                    opportunities_found INTEGER NOT NULL,
                    trades_placed INTEGER NOT NULL,
                    created_at TEXT NOT NULL
                );
                ",
            )
            .expect("create fixture schema");
            Self { path }
        }

        pub fn conn(&self) -> Connection {
            Connection::open(&self.path).expect("open fixture db")
        }

        pub fn store(&self) -> SqliteStore {
            SqliteStore::open(&self.path).expect("open store")
        }
    }

    impl Drop for FixtureDb {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.path);
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn insert_trade(
        conn: &Connection,
        id: i64,
        strategy: &str,
        status: &str,
        cost_usd: &str,
        pnl: Option<&str>,
        created_at: &str,
        closed_at: Option<&str>,
    ) {
        conn.execute(
            "INSERT INTO trades (id, strategy, market_id, condition_id, market_question, side, \
             entry_price, size, cost_usd, fair_value_estimate, edge, kelly_fraction, \
             status, exit_price, pnl, order_id, created_at, closed_at) \
             VALUES (?1, ?2, ?3, NULL, ?4, 'YES', '0.40', '100', ?5, '0.50', '0.10', '0.25', \
                     ?6, NULL, ?7, NULL, ?8, ?9)",
            rusqlite::params![
                id,
                strategy,
                format!("mkt-{id}"),
                format!("Question {id}?"),
                cost_usd,
                status,
                pnl,
                created_at,
                closed_at,
            ],
        )
        .expect("insert trade");
    }

    fn insert_price(conn: &Connection, id: i64, market_id: &str, yes: &str, recorded_at: &str) {
        conn.execute(
            "INSERT INTO price_history (id, market_id, condition_id, market_question, \
             yes_price, no_price, volume, liquidity, recorded_at) \
             VALUES (?1, ?2, NULL, 'q', ?3, '0.50', NULL, NULL, ?4)",
            rusqlite::params![id, market_id, yes, recorded_at],
        )
        .expect("insert price");
    }

    #[tokio::test]
    async fn test_open_fails_closed_when_missing() {
        let missing = std::env::temp_dir().join("no-such-dashboard.db");
        assert!(SqliteStore::open(&missing).is_err());
    }

    #[tokio::test]
    async fn test_agent_state_absent_is_none() {
        let fx = FixtureDb::new();
        let state = fx.store().agent_state().await.unwrap();
        assert!(state.is_none());
    }

    #[tokio::test]
    async fn test_agent_state_read() {
        let fx = FixtureDb::new();
        fx.conn()
            .execute(
                "INSERT INTO agent_state (id, bankroll, total_pnl, total_api_cost, is_alive, updated_at) \
                 VALUES (1, '812.50', '12.50', '3.07', 1, '2026-08-20T08:00:00+00:00')",
                [],
            )
            .unwrap();

        let state = fx.store().agent_state().await.unwrap().unwrap();
        assert_eq!(state.bankroll.to_string(), "812.50");
        assert!(state.is_alive);
    }

    #[tokio::test]
    async fn test_trades_filter_order_and_pagination() {
        let fx = FixtureDb::new();
        let conn = fx.conn();
        insert_trade(&conn, 1, "arb", "open", "10", None, "2026-08-01T10:00:00+00:00", None);
        insert_trade(&conn, 2, "arb", "closed", "20", Some("5"), "2026-08-02T10:00:00+00:00", Some("2026-08-03T10:00:00+00:00"));
        insert_trade(&conn, 3, "news", "open", "30", None, "2026-08-03T10:00:00+00:00", None);
        let store = fx.store();

        // No filter: newest first.
        let all = store.trades(&TradeFilter::default(), 50, 0).await.unwrap();
        assert_eq!(all.iter().map(|t| t.id).collect::<Vec<_>>(), vec![3, 2, 1]);

        // Status filter.
        let open = store
            .trades(&TradeFilter::by_status(TradeStatus::Open), 50, 0)
            .await
            .unwrap();
        assert_eq!(open.iter().map(|t| t.id).collect::<Vec<_>>(), vec![3, 1]);

        // Status AND strategy.
        let filter = TradeFilter {
            status: Some(TradeStatus::Open),
            strategy: Some("arb".to_string()),
        };
        let arb_open = store.trades(&filter, 50, 0).await.unwrap();
        assert_eq!(arb_open.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1]);

        // Offset skips rows of the ordered result.
        let page = store.trades(&TradeFilter::default(), 1, 1).await.unwrap();
        assert_eq!(page.iter().map(|t| t.id).collect::<Vec<_>>(), vec![2]);

        assert_eq!(store.trade_count(&TradeFilter::default()).await.unwrap(), 3);
        assert_eq!(store.trade_count(&filter).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_open_trade_has_no_pnl() {
        let fx = FixtureDb::new();
        insert_trade(&fx.conn(), 1, "arb", "open", "10", None, "2026-08-01T10:00:00+00:00", None);
        let trades = fx.store().trades(&TradeFilter::default(), 10, 0).await.unwrap();
        assert!(trades[0].pnl.is_none());
        assert!(trades[0].exit_price.is_none());
        assert!(trades[0].closed_at.is_none());
    }

    #[tokio::test]
    async fn test_strategies_distinct_sorted() {
        let fx = FixtureDb::new();
        let conn = fx.conn();
        insert_trade(&conn, 1, "news", "open", "10", None, "2026-08-01T10:00:00+00:00", None);
        insert_trade(&conn, 2, "arb", "open", "10", None, "2026-08-02T10:00:00+00:00", None);
        insert_trade(&conn, 3, "arb", "open", "10", None, "2026-08-03T10:00:00+00:00", None);

        let strategies = fx.store().strategies().await.unwrap();
        assert_eq!(strategies, vec!["arb".to_string(), "news".to_string()]);
    }

    #[tokio::test]
    async fn test_price_history_order_and_limit() {
        let fx = FixtureDb::new();
        let conn = fx.conn();
        insert_price(&conn, 1, "mkt-1", "0.40", "2026-08-01T10:00:00+00:00");
        insert_price(&conn, 2, "mkt-1", "0.45", "2026-08-01T11:00:00+00:00");
        insert_price(&conn, 3, "mkt-2", "0.60", "2026-08-01T12:00:00+00:00");

        let prices = fx.store().price_history("mkt-1", 1).await.unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].id, 2);
    }

    #[tokio::test]
    async fn test_latest_prices_omits_unknown_markets() {
        let fx = FixtureDb::new();
        let conn = fx.conn();
        insert_price(&conn, 1, "mkt-1", "0.40", "2026-08-01T10:00:00+00:00");
        insert_price(&conn, 2, "mkt-1", "0.45", "2026-08-01T11:00:00+00:00");

        let ids = vec!["mkt-1".to_string(), "mkt-unknown".to_string()];
        let latest = fx.store().latest_prices(&ids).await.unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest["mkt-1"].yes_price.to_string(), "0.45");
        assert!(!latest.contains_key("mkt-unknown"));
    }

    #[tokio::test]
    async fn test_api_costs_and_scan_logs() {
        let fx = FixtureDb::new();
        let conn = fx.conn();
        conn.execute(
            "INSERT INTO api_costs (id, service, cost_usd, tokens_used, created_at) \
             VALUES (1, 'claude', '0.031', 1520, '2026-08-01T10:00:00+00:00'), \
                    (2, 'claude', '0.044', 2210, '2026-08-01T11:00:00+00:00')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO scan_logs (id, strategy, markets_scanned, opportunities_found, trades_placed, created_at) \
             VALUES (1, 'arb', 640, 3, 1, '2026-08-01T10:00:00+00:00')",
            [],
        )
        .unwrap();
        let store = fx.store();

        let costs = store.api_costs(100).await.unwrap();
        assert_eq!(costs.len(), 2);
        assert_eq!(costs[0].id, 2); // newest first

        let scans = store.scan_logs(10).await.unwrap();
        assert_eq!(scans[0].markets_scanned, 640);
    }
}
