//! Whole-table rollups that are not per-customer: item leaders and
//! calendar-month seasonality.

use pulse_core::types::Transaction;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::util::round2;

/// Revenue and units for one item.
#[derive(Debug, Clone, Serialize)]
pub struct ItemRevenue {
    pub item: String,
    pub units: u64,
    pub revenue: f64,
}

/// Top items by revenue. Only rows that carry both an item and a spend
/// amount contribute; a missing quantity contributes zero units but its
/// revenue still counts.
pub fn top_items(transactions: &[Transaction], limit: usize) -> Vec<ItemRevenue> {
    let mut by_item: HashMap<&str, (u64, f64)> = HashMap::new();
    for tx in transactions {
        let (item, spent) = match (tx.item.as_deref(), tx.total_spent) {
            (Some(item), Some(spent)) => (item, spent),
            _ => continue,
        };
        let entry = by_item.entry(item).or_insert((0, 0.0));
        entry.0 += u64::from(tx.quantity.unwrap_or(0));
        entry.1 += spent;
    }

    let mut rows: Vec<ItemRevenue> = by_item
        .into_iter()
        .map(|(item, (units, revenue))| ItemRevenue {
            item: item.to_string(),
            units,
            revenue: round2(revenue),
        })
        .collect();
    rows.sort_by(|a, b| {
        b.revenue
            .partial_cmp(&a.revenue)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.item.cmp(&b.item))
    });
    rows.truncate(limit);
    rows
}

/// Transaction count and revenue for one calendar month.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlySales {
    pub year: i32,
    pub month: u32,
    pub transactions: u64,
    pub revenue: f64,
}

/// Seasonality rollup: one row per calendar month with activity, ascending.
/// Rows without a date are skipped; rows without a spend still count as a
/// transaction.
pub fn monthly_sales(transactions: &[Transaction]) -> Vec<MonthlySales> {
    use chrono::Datelike;

    let mut by_month: BTreeMap<(i32, u32), (u64, f64)> = BTreeMap::new();
    for tx in transactions {
        let date = match tx.date {
            Some(date) => date,
            None => continue,
        };
        let entry = by_month.entry((date.year(), date.month())).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += tx.total_spent.unwrap_or(0.0);
    }

    by_month
        .into_iter()
        .map(|((year, month), (count, revenue))| MonthlySales {
            year,
            month,
            transactions: count,
            revenue: round2(revenue),
        })
        .collect()
}
