//! Customer purchase analytics: ingestion, per-customer aggregation,
//! percentile classification, and temporal behavior analysis.

pub mod aggregate;
pub mod percentile;
pub mod sales;
pub mod source;
pub mod temporal;
pub mod util;

pub use aggregate::{aggregate_customers, AggregateSet};
pub use percentile::{classify, percentile_thresholds, PercentileThresholds};
pub use source::{CsvSource, MemorySource, TransactionSource};
pub use temporal::{
    activity_trends, interval_stats, recency_ranking, ActivityTrend, IntervalStats,
    RecencyRecord, TrendWindows,
};
