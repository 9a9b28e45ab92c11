use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tag value read from the store (or a query string) that matched no known variant.
#[derive(Debug, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct InvalidTag {
    pub kind: &'static str,
    pub value: String,
}

/// Singleton liveness/balance row the agent keeps up to date (id = 1).
/// Absence means the agent has not initialized the store yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    #[serde(with = "rust_decimal::serde::float")]
    pub bankroll: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_pnl: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_api_cost: Decimal,
    pub is_alive: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Yes,
    No,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Yes => write!(f, "YES"),
            Side::No => write!(f, "NO"),
        }
    }
}

impl FromStr for Side {
    type Err = InvalidTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "YES" => Ok(Side::Yes),
            "NO" => Ok(Side::No),
            other => Err(InvalidTag { kind: "side", value: other.to_string() }),
        }
    }
}

/// Trade lifecycle. A trade is created `open` with no pnl, then moves exactly
/// once to `closed` or `resolved`, at which point exit_price/pnl are set and
/// never change again (from this system's read-only point of view).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Open,
    Closed,
    Resolved,
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeStatus::Open => write!(f, "open"),
            TradeStatus::Closed => write!(f, "closed"),
            TradeStatus::Resolved => write!(f, "resolved"),
        }
    }
}

impl FromStr for TradeStatus {
    type Err = InvalidTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(TradeStatus::Open),
            "closed" => Ok(TradeStatus::Closed),
            "resolved" => Ok(TradeStatus::Resolved),
            other => Err(InvalidTag { kind: "status", value: other.to_string() }),
        }
    }
}

/// Trade record as the agent wrote it. Prices are probabilities in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: i64,
    pub strategy: String,
    pub market_id: String,
    pub condition_id: Option<String>,
    pub market_question: String,
    pub side: Side,
    #[serde(with = "rust_decimal::serde::float")]
    pub entry_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub size: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost_usd: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub fair_value_estimate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub edge: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub kelly_fraction: Decimal,
    pub status: TradeStatus,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub exit_price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub pnl: Option<Decimal>,
    pub order_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// One snapshot in the per-market price time series the agent appends to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    pub id: i64,
    pub market_id: String,
    pub condition_id: Option<String>,
    pub market_question: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub yes_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub no_price: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub volume: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub liquidity: Option<Decimal>,
    pub recorded_at: DateTime<Utc>,
}

/// External API spend log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCost {
    pub id: i64,
    pub service: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost_usd: Decimal,
    pub tokens_used: i64,
    pub created_at: DateTime<Utc>,
}

/// Scan-cycle log entry. Kept for parity with the store schema the agent
/// writes; no dashboard view reads it yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanLog {
    pub id: i64,
    pub strategy: String,
    pub markets_scanned: i64,
    pub opportunities_found: i64,
    pub trades_placed: i64,
    pub created_at: DateTime<Utc>,
}

/// Explicit trade filter: each field is defined-or-absent, and both are ANDed
/// together. Translated to a concrete query by one function per backend, so
/// there is no ad-hoc predicate assembly anywhere else.
#[derive(Debug, Clone, Default)]
pub struct TradeFilter {
    pub status: Option<TradeStatus>,
    pub strategy: Option<String>,
}

impl TradeFilter {
    pub fn by_status(status: TradeStatus) -> Self {
        Self { status: Some(status), strategy: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [TradeStatus::Open, TradeStatus::Closed, TradeStatus::Resolved] {
            assert_eq!(status.to_string().parse::<TradeStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_side_round_trip() {
        assert_eq!("YES".parse::<Side>().unwrap(), Side::Yes);
        assert_eq!("NO".parse::<Side>().unwrap(), Side::No);
        assert_eq!(Side::No.to_string(), "NO");
    }

    #[test]
    fn test_unknown_tags_rejected() {
        assert!("cancelled".parse::<TradeStatus>().is_err());
        assert!("MAYBE".parse::<Side>().is_err());
    }

    #[test]
    fn test_trade_json_shape() {
        // The wire format uses plain numbers for money and lowercase/uppercase tags.
        let trade = Trade {
            id: 7,
            strategy: "news_spike".to_string(),
            market_id: "0xabc".to_string(),
            condition_id: None,
            market_question: "Will it rain?".to_string(),
            side: Side::Yes,
            entry_price: "0.42".parse().unwrap(),
            size: "100".parse().unwrap(),
            cost_usd: "42".parse().unwrap(),
            fair_value_estimate: "0.55".parse().unwrap(),
            edge: "0.13".parse().unwrap(),
            kelly_fraction: "0.25".parse().unwrap(),
            status: TradeStatus::Open,
            exit_price: None,
            pnl: None,
            order_id: None,
            created_at: "2026-08-01T10:00:00+00:00".parse().unwrap(),
            closed_at: None,
        };

        let json = serde_json::to_value(&trade).unwrap();
        assert_eq!(json["side"], "YES");
        assert_eq!(json["status"], "open");
        assert_eq!(json["cost_usd"], 42.0);
        assert!(json["pnl"].is_null());
    }
}
