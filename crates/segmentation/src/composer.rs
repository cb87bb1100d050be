//! Segment composer: merges the aggregation, percentile, and temporal
//! outputs into the named customer views. All views are pure projections
//! over the aggregate set; none of them mutate it.

use chrono::NaiveDate;
use pulse_analytics::aggregate::AggregateSet;
use pulse_analytics::percentile::{classify, percentile_thresholds};
use pulse_analytics::temporal::{
    activity_trends, interval_stats, recency_ranking, IntervalStats, TrendWindows,
};
use pulse_analytics::util::round2;
use pulse_core::config::AnalysisConfig;
use pulse_core::{PulseError, PulseResult};
use serde::Serialize;
use tracing::debug;

use crate::labels::{ChurnRisk, ClvTier, SpendTier};

/// One-time vs repeat customer counts. The two always sum to the total.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RetentionSplit {
    pub one_time_buyers: u64,
    pub repeat_customers: u64,
    pub total_customers: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpendTierRow {
    pub customer_id: String,
    pub total_spending: f64,
    pub tier: SpendTier,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClvTierRow {
    pub customer_id: String,
    pub lifetime_value: f64,
    pub tier: ClvTier,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscountDependencyRow {
    pub customer_id: String,
    pub transaction_count: u64,
    pub discounted_count: u64,
    /// Percentage of purchases made under a discount, 2 decimal places.
    pub discount_rate_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AtRiskRow {
    pub customer_id: String,
    pub total_spending: f64,
    pub days_inactive: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecliningActivityRow {
    pub customer_id: String,
    pub past_count: u64,
    pub recent_count: u64,
}

/// Builds every segment view from one aggregate set, under one frozen
/// reference date.
pub struct SegmentComposer {
    config: AnalysisConfig,
    reference_date: NaiveDate,
}

impl SegmentComposer {
    pub fn new(config: AnalysisConfig) -> Self {
        let reference_date = config.resolved_reference_date();
        Self {
            config,
            reference_date,
        }
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    /// One-time vs repeat customers over the whole population.
    pub fn retention_split(&self, aggregates: &AggregateSet) -> RetentionSplit {
        let mut one_time_buyers = 0u64;
        let mut repeat_customers = 0u64;
        for agg in aggregates.iter() {
            if agg.transaction_count == 1 {
                one_time_buyers += 1;
            } else {
                repeat_customers += 1;
            }
        }
        RetentionSplit {
            one_time_buyers,
            repeat_customers,
            total_customers: aggregates.len() as u64,
        }
    }

    /// Spend tiers at the configured percentile breakpoints, ranked by
    /// spend descending.
    pub fn spend_tiers(&self, aggregates: &AggregateSet) -> PulseResult<Vec<SpendTierRow>> {
        let (medium_cut, high_cut) = self.spend_cutoffs(aggregates)?;
        let ladder = [
            (SpendTier::High, high_cut),
            (SpendTier::Medium, medium_cut),
            (SpendTier::Low, f64::NEG_INFINITY),
        ];

        let mut rows: Vec<SpendTierRow> = aggregates
            .iter()
            .map(|agg| SpendTierRow {
                customer_id: agg.customer_id.clone(),
                total_spending: round2(agg.total_spending),
                tier: classify(agg.total_spending, &ladder).unwrap_or(SpendTier::Low),
            })
            .collect();
        rows.sort_by(|a, b| {
            b.total_spending
                .partial_cmp(&a.total_spending)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.customer_id.cmp(&b.customer_id))
        });
        Ok(rows)
    }

    /// Lifetime-value tiers. Same distribution math as the spend tiers,
    /// reported as its own dimension.
    pub fn clv_tiers(&self, aggregates: &AggregateSet) -> PulseResult<Vec<ClvTierRow>> {
        let (medium_cut, high_cut) = self.spend_cutoffs(aggregates)?;
        let ladder = [
            (ClvTier::High, high_cut),
            (ClvTier::Medium, medium_cut),
            (ClvTier::Low, f64::NEG_INFINITY),
        ];

        let mut rows: Vec<ClvTierRow> = aggregates
            .iter()
            .map(|agg| ClvTierRow {
                customer_id: agg.customer_id.clone(),
                lifetime_value: round2(agg.total_spending),
                tier: classify(agg.total_spending, &ladder).unwrap_or(ClvTier::Low),
            })
            .collect();
        rows.sort_by(|a, b| {
            b.lifetime_value
                .partial_cmp(&a.lifetime_value)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.customer_id.cmp(&b.customer_id))
        });
        Ok(rows)
    }

    /// Discount dependency per customer, ranked most-dependent first.
    pub fn discount_dependency(&self, aggregates: &AggregateSet) -> Vec<DiscountDependencyRow> {
        let mut rows: Vec<DiscountDependencyRow> = aggregates
            .iter()
            .map(|agg| DiscountDependencyRow {
                customer_id: agg.customer_id.clone(),
                transaction_count: agg.transaction_count,
                discounted_count: agg.discounted_count,
                discount_rate_pct: round2(agg.discount_rate_pct()),
            })
            .collect();
        rows.sort_by(|a, b| {
            b.discount_rate_pct
                .partial_cmp(&a.discount_rate_pct)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.customer_id.cmp(&b.customer_id))
        });
        rows
    }

    /// Churn view: top spend tier intersected with inactivity, ordered by
    /// descending inactivity. A customer below the high spend cut never
    /// appears here, however long they have been away.
    pub fn at_risk(&self, aggregates: &AggregateSet) -> PulseResult<Vec<AtRiskRow>> {
        let (_, high_cut) = self.spend_cutoffs(aggregates)?;
        let threshold_days = self.config.inactivity_threshold_days;

        let mut rows = Vec::new();
        for record in recency_ranking(aggregates.iter(), self.reference_date) {
            let agg = match aggregates.get(&record.customer_id) {
                Some(agg) => agg,
                None => continue,
            };
            if agg.total_spending < high_cut {
                continue;
            }
            let risk = ChurnRisk::from_inactivity(
                record.days_since_last_purchase,
                threshold_days,
            );
            if risk == ChurnRisk::AtRisk {
                rows.push(AtRiskRow {
                    customer_id: record.customer_id,
                    total_spending: round2(agg.total_spending),
                    days_inactive: record.days_since_last_purchase,
                });
            }
        }
        debug!(
            at_risk = rows.len(),
            threshold_days, "Computed at-risk view"
        );
        Ok(rows)
    }

    /// Customers whose recent activity dropped below their baseline,
    /// top-N by baseline volume.
    pub fn declining_activity(&self, aggregates: &AggregateSet) -> Vec<DecliningActivityRow> {
        let windows = TrendWindows::from_reference(
            self.reference_date,
            self.config.past_window_months,
            self.config.split_months,
        );
        let mut rows: Vec<DecliningActivityRow> = activity_trends(aggregates.iter(), windows)
            .into_iter()
            .filter(|trend| trend.is_declining())
            .map(|trend| DecliningActivityRow {
                customer_id: trend.customer_id,
                past_count: trend.past_count,
                recent_count: trend.recent_count,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.past_count
                .cmp(&a.past_count)
                .then_with(|| a.customer_id.cmp(&b.customer_id))
        });
        rows.truncate(self.config.top_n_declining);
        rows
    }

    /// Purchase cadence: average days between purchases, tightest cadence
    /// first. Single-purchase customers carry no cadence and are excluded.
    pub fn purchase_cadence(&self, aggregates: &AggregateSet) -> Vec<IntervalStats> {
        let mut rows: Vec<IntervalStats> =
            aggregates.iter().filter_map(interval_stats).collect();
        rows.sort_by(|a, b| {
            a.average_gap_days
                .partial_cmp(&b.average_gap_days)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.customer_id.cmp(&b.customer_id))
        });
        rows
    }

    /// The (medium, high) spend thresholds for the current population.
    fn spend_cutoffs(&self, aggregates: &AggregateSet) -> PulseResult<(f64, f64)> {
        aggregates.require_complete_spend()?;
        let percentiles = &self.config.tier_percentiles;
        if percentiles.len() != 2 {
            return Err(PulseError::Config(format!(
                "tier_percentiles must hold exactly two breakpoints, got {}",
                percentiles.len()
            )));
        }

        let spends: Vec<f64> = aggregates.iter().map(|agg| agg.total_spending).collect();
        let thresholds = percentile_thresholds(&spends, percentiles, "total_spending")?;
        let medium_cut = thresholds
            .value_at(percentiles[0])
            .unwrap_or(f64::NEG_INFINITY);
        let high_cut = thresholds
            .value_at(percentiles[1])
            .unwrap_or(f64::NEG_INFINITY);
        Ok((medium_cut, high_cut))
    }
}
