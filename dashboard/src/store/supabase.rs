//! Hosted backend over the Supabase REST API (PostgREST), for deployments
//! where the agent writes to Postgres instead of a local file. Read-only:
//! only GETs with the anon key, never an insert or update.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{RecordStore, Result, StoreError};
use crate::types::{AgentState, ApiCost, PricePoint, ScanLog, Trade, TradeFilter};

#[derive(Clone)]
pub struct SupabaseStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// Translate a [`TradeFilter`] into PostgREST query parameters. Counterpart
/// of the SQLite backend's `filter_sql`; the only place predicates are built.
fn filter_params(filter: &TradeFilter) -> Vec<(String, String)> {
    let mut params = Vec::new();
    if let Some(status) = filter.status {
        params.push(("status".to_string(), format!("eq.{status}")));
    }
    if let Some(ref strategy) = filter.strategy {
        params.push(("strategy".to_string(), format!("eq.{strategy}")));
    }
    params
}

/// Pull the total out of a PostgREST `Content-Range` header ("0-9/42", "*/0").
fn parse_total(content_range: &str) -> Option<u64> {
    content_range.rsplit('/').next()?.parse().ok()
}

impl SupabaseStore {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Build the REST URL for a given table.
    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn get(&self, table: &str) -> reqwest::RequestBuilder {
        self.http
            .get(self.table_url(table))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn fetch_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(String, String)],
    ) -> Result<Vec<T>> {
        let resp = self.get(table).query(query).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(StoreError::Unavailable(format!(
                "{table} query returned {status}"
            )));
        }
        resp.json().await.map_err(Into::into)
    }
}

#[async_trait]
impl RecordStore for SupabaseStore {
    async fn agent_state(&self) -> Result<Option<AgentState>> {
        let query = [
            ("select".to_string(), "*".to_string()),
            ("id".to_string(), "eq.1".to_string()),
            ("limit".to_string(), "1".to_string()),
        ];
        let rows: Vec<AgentState> = self.fetch_rows("agent_state", &query).await?;
        Ok(rows.into_iter().next())
    }

    async fn trades(&self, filter: &TradeFilter, limit: u32, offset: u32) -> Result<Vec<Trade>> {
        let mut query = vec![("select".to_string(), "*".to_string())];
        query.extend(filter_params(filter));
        query.push(("order".to_string(), "created_at.desc".to_string()));
        query.push(("limit".to_string(), limit.to_string()));
        query.push(("offset".to_string(), offset.to_string()));
        self.fetch_rows("trades", &query).await
    }

    async fn trade_count(&self, filter: &TradeFilter) -> Result<u64> {
        let mut query = vec![("select".to_string(), "id".to_string())];
        query.extend(filter_params(filter));

        let resp = self
            .get("trades")
            .query(&query)
            .header("Prefer", "count=exact")
            .header("Range-Unit", "items")
            .header("Range", "0-0")
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(StoreError::Unavailable(format!(
                "trades count returned {status}"
            )));
        }

        resp.headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_total)
            .ok_or_else(|| StoreError::Malformed("missing Content-Range total".to_string()))
    }

    async fn strategies(&self) -> Result<Vec<String>> {
        #[derive(Deserialize)]
        struct StrategyRow {
            strategy: String,
        }

        // PostgREST has no DISTINCT; dedupe and sort here.
        let query = [("select".to_string(), "strategy".to_string())];
        let rows: Vec<StrategyRow> = self.fetch_rows("trades", &query).await?;
        let set: std::collections::BTreeSet<String> =
            rows.into_iter().map(|r| r.strategy).collect();
        Ok(set.into_iter().collect())
    }

    async fn price_history(&self, market_id: &str, limit: u32) -> Result<Vec<PricePoint>> {
        let query = [
            ("select".to_string(), "*".to_string()),
            ("market_id".to_string(), format!("eq.{market_id}")),
            ("order".to_string(), "recorded_at.desc".to_string()),
            ("limit".to_string(), limit.to_string()),
        ];
        self.fetch_rows("price_history", &query).await
    }

    async fn latest_prices(&self, market_ids: &[String]) -> Result<HashMap<String, PricePoint>> {
        // One bounded request per market, like the per-position fan-out that
        // consumes this. Open-position counts are small by construction.
        let mut latest = HashMap::new();
        for market_id in market_ids {
            let mut rows = self.price_history(market_id, 1).await?;
            if let Some(point) = rows.pop() {
                latest.insert(market_id.clone(), point);
            }
        }
        Ok(latest)
    }

    async fn api_costs(&self, limit: u32) -> Result<Vec<ApiCost>> {
        let query = [
            ("select".to_string(), "*".to_string()),
            ("order".to_string(), "created_at.desc".to_string()),
            ("limit".to_string(), limit.to_string()),
        ];
        self.fetch_rows("api_costs", &query).await
    }

    async fn scan_logs(&self, limit: u32) -> Result<Vec<ScanLog>> {
        let query = [
            ("select".to_string(), "*".to_string()),
            ("order".to_string(), "created_at.desc".to_string()),
            ("limit".to_string(), limit.to_string()),
        ];
        self.fetch_rows("scan_logs", &query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TradeStatus;

    #[test]
    fn test_filter_params_empty() {
        assert!(filter_params(&TradeFilter::default()).is_empty());
    }

    #[test]
    fn test_filter_params_both_fields() {
        let filter = TradeFilter {
            status: Some(TradeStatus::Resolved),
            strategy: Some("arb".to_string()),
        };
        let params = filter_params(&filter);
        assert_eq!(
            params,
            vec![
                ("status".to_string(), "eq.resolved".to_string()),
                ("strategy".to_string(), "eq.arb".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_total() {
        assert_eq!(parse_total("0-9/42"), Some(42));
        assert_eq!(parse_total("*/0"), Some(0));
        assert_eq!(parse_total("0-9/*"), None);
        assert_eq!(parse_total("garbage"), None);
    }
}
