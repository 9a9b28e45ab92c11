//! Derived views over trade records. Everything here is a pure function of
//! accessor output so both store backends share one implementation, and the
//! numeric policy (Decimal end to end, divide-by-zero guarded) lives in one
//! place.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::types::{Trade, TradeStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyExposure {
    pub strategy: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub exposure: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PnlPoint {
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub pnl: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cumulative_pnl: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyWinRate {
    pub strategy: String,
    pub wins: u32,
    pub losses: u32,
    pub total: u32,
    /// Percentage rounded to one decimal place. Cosmetic rounding only; the
    /// counts above are the source of truth.
    #[serde(with = "rust_decimal::serde::float")]
    pub win_rate: Decimal,
}

fn is_open(trade: &Trade) -> bool {
    trade.status == TradeStatus::Open
}

/// Closed or resolved trades that actually carry a pnl. The settled
/// population every pnl/win-rate aggregate is computed over.
fn settled(trades: &[Trade]) -> impl Iterator<Item = (&Trade, Decimal)> {
    trades.iter().filter_map(|t| match (t.status, t.pnl) {
        (TradeStatus::Closed | TradeStatus::Resolved, Some(pnl)) => Some((t, pnl)),
        _ => None,
    })
}

/// Sum of cost_usd over open trades. Zero when there are none.
pub fn total_exposure(trades: &[Trade]) -> Decimal {
    trades
        .iter()
        .filter(|t| is_open(t))
        .map(|t| t.cost_usd)
        .sum()
}

/// Open-trade exposure grouped by strategy, sorted by strategy name.
/// Strategies with no open trades are omitted, not zero-valued.
pub fn exposure_by_strategy(trades: &[Trade]) -> Vec<StrategyExposure> {
    let mut by_strategy: BTreeMap<&str, Decimal> = BTreeMap::new();
    for trade in trades.iter().filter(|t| is_open(t)) {
        *by_strategy.entry(&trade.strategy).or_default() += trade.cost_usd;
    }
    by_strategy
        .into_iter()
        .map(|(strategy, exposure)| StrategyExposure {
            strategy: strategy.to_string(),
            exposure,
        })
        .collect()
}

/// Daily realized pnl with a running cumulative sum, dates ascending.
/// Days with no settled trades do not appear; gaps are not zero-filled.
pub fn pnl_over_time(trades: &[Trade]) -> Vec<PnlPoint> {
    let mut by_date: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for (trade, pnl) in settled(trades) {
        // A settled trade without closed_at cannot be dated; skip it.
        if let Some(closed_at) = trade.closed_at {
            *by_date.entry(closed_at.date_naive()).or_default() += pnl;
        }
    }

    let mut cumulative = Decimal::ZERO;
    by_date
        .into_iter()
        .map(|(date, pnl)| {
            cumulative += pnl;
            PnlPoint { date, pnl, cumulative_pnl: cumulative }
        })
        .collect()
}

/// Win/loss split per strategy over the settled population, sorted by
/// strategy name. A break-even trade (pnl == 0) counts as a loss by policy.
pub fn win_rate_by_strategy(trades: &[Trade]) -> Vec<StrategyWinRate> {
    let mut tally: BTreeMap<&str, (u32, u32)> = BTreeMap::new();
    for (trade, pnl) in settled(trades) {
        let entry = tally.entry(&trade.strategy).or_default();
        if pnl > Decimal::ZERO {
            entry.0 += 1;
        } else {
            entry.1 += 1;
        }
    }

    tally
        .into_iter()
        .map(|(strategy, (wins, losses))| {
            let total = wins + losses;
            // total >= 1 here: a strategy only gets an entry from a settled trade.
            let win_rate = (Decimal::from(100 * wins) / Decimal::from(total))
                .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
            StrategyWinRate { strategy: strategy.to_string(), wins, losses, total, win_rate }
        })
        .collect()
}

/// Top-n trades by pnl descending (best) and ascending (worst), excluding
/// trades with no pnl. The two lists overlap when fewer than 2n qualify.
pub fn best_worst_trades(trades: &[Trade], n: usize) -> (Vec<Trade>, Vec<Trade>) {
    let mut ranked: Vec<&Trade> = trades.iter().filter(|t| t.pnl.is_some()).collect();
    ranked.sort_by_key(|t| std::cmp::Reverse(t.pnl));

    let best: Vec<Trade> = ranked.iter().take(n).map(|t| (*t).clone()).collect();
    let worst: Vec<Trade> = ranked.iter().rev().take(n).map(|t| (*t).clone()).collect();
    (best, worst)
}
