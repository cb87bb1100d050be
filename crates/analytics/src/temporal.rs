//! Temporal behavior analysis: recency, inter-purchase intervals, and
//! windowed before/after activity comparison.
//!
//! Every computation takes the caller's reference date so runs are
//! reproducible; nothing in here reads the clock.

use chrono::{Months, NaiveDate};
use pulse_core::types::CustomerAggregate;
use serde::Serialize;

use crate::util::round2;

/// Days since a customer's last purchase, relative to the reference date.
#[derive(Debug, Clone, Serialize)]
pub struct RecencyRecord {
    pub customer_id: String,
    pub last_purchase_date: NaiveDate,
    pub days_since_last_purchase: i64,
}

/// Recency per customer, ordered most-inactive first. Ties break on
/// customer id so the ranking is stable across runs.
pub fn recency_ranking<'a>(
    aggregates: impl Iterator<Item = &'a CustomerAggregate>,
    reference_date: NaiveDate,
) -> Vec<RecencyRecord> {
    let mut rows: Vec<RecencyRecord> = aggregates
        .map(|agg| RecencyRecord {
            customer_id: agg.customer_id.clone(),
            last_purchase_date: agg.last_purchase_date,
            days_since_last_purchase: (reference_date - agg.last_purchase_date).num_days(),
        })
        .collect();
    rows.sort_by(|a, b| {
        b.days_since_last_purchase
            .cmp(&a.days_since_last_purchase)
            .then_with(|| a.customer_id.cmp(&b.customer_id))
    });
    rows
}

/// Average gap between consecutive purchases.
#[derive(Debug, Clone, Serialize)]
pub struct IntervalStats {
    pub customer_id: String,
    pub purchase_count: u64,
    /// Arithmetic mean of the gaps, rounded to 2 decimal places.
    pub average_gap_days: f64,
}

/// Gap statistics over one customer's ascending purchase dates.
///
/// The first purchase contributes no gap, so customers with fewer than two
/// purchases yield `None`. They are excluded from interval-based rankings,
/// never treated as zero.
pub fn interval_stats(agg: &CustomerAggregate) -> Option<IntervalStats> {
    if agg.purchase_dates.len() < 2 {
        return None;
    }
    let gaps: Vec<i64> = agg
        .purchase_dates
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_days())
        .collect();
    let mean = gaps.iter().sum::<i64>() as f64 / gaps.len() as f64;
    Some(IntervalStats {
        customer_id: agg.customer_id.clone(),
        purchase_count: agg.transaction_count,
        average_gap_days: round2(mean),
    })
}

/// The two disjoint comparison windows derived from the reference date.
/// Past is half-open `[past_start, split)`; recent is `[split, reference]`
/// so the reference day itself counts as recent.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TrendWindows {
    pub past_start: NaiveDate,
    pub split: NaiveDate,
    pub reference: NaiveDate,
}

impl TrendWindows {
    pub fn from_reference(
        reference: NaiveDate,
        past_window_months: u32,
        split_months: u32,
    ) -> Self {
        Self {
            past_start: reference - Months::new(past_window_months),
            split: reference - Months::new(split_months),
            reference,
        }
    }

    fn in_past(&self, date: NaiveDate) -> bool {
        date >= self.past_start && date < self.split
    }

    fn in_recent(&self, date: NaiveDate) -> bool {
        date >= self.split && date <= self.reference
    }
}

/// Per-customer transaction counts in the two comparison windows.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityTrend {
    pub customer_id: String,
    pub past_count: u64,
    pub recent_count: u64,
}

impl ActivityTrend {
    /// Fewer recent purchases than in the baseline window.
    pub fn is_declining(&self) -> bool {
        self.recent_count < self.past_count
    }
}

/// Count purchases per window for every customer with a baseline.
///
/// Customers absent from the past window are excluded entirely: with no
/// baseline there is nothing to compare against. Absence from the recent
/// window is an observation (`recent_count = 0`), not an exclusion.
pub fn activity_trends<'a>(
    aggregates: impl Iterator<Item = &'a CustomerAggregate>,
    windows: TrendWindows,
) -> Vec<ActivityTrend> {
    let mut rows = Vec::new();
    for agg in aggregates {
        let mut past_count = 0u64;
        let mut recent_count = 0u64;
        for &date in &agg.purchase_dates {
            if windows.in_past(date) {
                past_count += 1;
            } else if windows.in_recent(date) {
                recent_count += 1;
            }
        }
        if past_count == 0 {
            continue;
        }
        rows.push(ActivityTrend {
            customer_id: agg.customer_id.clone(),
            past_count,
            recent_count,
        });
    }
    rows
}
