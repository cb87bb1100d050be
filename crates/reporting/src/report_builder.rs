//! Report generation over the segment views: named tabular outputs with
//! CSV and JSON export and a registry of generated reports.

use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use pulse_analytics::aggregate::{aggregate_customers, AggregateSet};
use pulse_analytics::sales::{monthly_sales, top_items};
use pulse_core::config::AnalysisConfig;
use pulse_core::types::Transaction;
use pulse_core::{PulseError, PulseResult};
use pulse_segmentation::SegmentComposer;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

// ─── Types ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    RetentionSplit,
    SpendTiers,
    ClvTiers,
    DiscountDependency,
    AtRiskCustomers,
    DecliningActivity,
    PurchaseCadence,
    TopItems,
    MonthlySeasonality,
}

impl ReportType {
    pub fn all() -> [ReportType; 9] {
        [
            ReportType::RetentionSplit,
            ReportType::SpendTiers,
            ReportType::ClvTiers,
            ReportType::DiscountDependency,
            ReportType::AtRiskCustomers,
            ReportType::DecliningActivity,
            ReportType::PurchaseCadence,
            ReportType::TopItems,
            ReportType::MonthlySeasonality,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReportType::RetentionSplit => "retention_split",
            ReportType::SpendTiers => "spend_tiers",
            ReportType::ClvTiers => "clv_tiers",
            ReportType::DiscountDependency => "discount_dependency",
            ReportType::AtRiskCustomers => "at_risk_customers",
            ReportType::DecliningActivity => "declining_activity",
            ReportType::PurchaseCadence => "purchase_cadence",
            ReportType::TopItems => "top_items",
            ReportType::MonthlySeasonality => "monthly_seasonality",
        }
    }
}

impl std::str::FromStr for ReportType {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportType::all()
            .into_iter()
            .find(|report_type| report_type.name() == s)
            .ok_or_else(|| {
                PulseError::Config(format!(
                    "unknown report '{}', expected one of: {}",
                    s,
                    ReportType::all()
                        .iter()
                        .map(|r| r.name())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A generated report: columns plus rows of JSON cells in column order.
#[derive(Debug, Clone, Serialize)]
pub struct ReportOutput {
    pub report_id: Uuid,
    pub report_type: ReportType,
    pub generated_at: DateTime<Utc>,
    pub reference_date: NaiveDate,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
    pub row_count: usize,
}

// ─── Report Engine ──────────────────────────────────────────────────────────

/// Generates the report suite over one immutable transaction snapshot.
///
/// Aggregation runs once at construction. If it fails on a malformed
/// record, only the per-customer reports are disabled; whole-table
/// rollups still run, so one bad record never takes down the run.
pub struct ReportEngine {
    transactions: Vec<Transaction>,
    aggregates: AggregateSet,
    /// `(transaction_id, field)` of the record that broke aggregation.
    integrity_error: Option<(String, String)>,
    composer: SegmentComposer,
    top_n_items: usize,
    generated: DashMap<ReportType, ReportOutput>,
}

impl ReportEngine {
    pub fn new(config: AnalysisConfig, transactions: Vec<Transaction>) -> PulseResult<Self> {
        let top_n_items = config.top_n_items;
        let (aggregates, integrity_error) = match aggregate_customers(&transactions) {
            Ok(set) => (set, None),
            Err(PulseError::DataIntegrity {
                transaction_id,
                field,
            }) => {
                warn!(
                    transaction_id = %transaction_id,
                    field = %field,
                    "Aggregation failed; per-customer reports disabled for this run"
                );
                (AggregateSet::default(), Some((transaction_id, field)))
            }
            Err(other) => return Err(other),
        };

        Ok(Self {
            transactions,
            aggregates,
            integrity_error,
            composer: SegmentComposer::new(config),
            top_n_items,
            generated: DashMap::new(),
        })
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.composer.reference_date()
    }

    /// Generate one report and register the output for later export.
    pub fn generate(&self, report_type: ReportType) -> PulseResult<ReportOutput> {
        let (columns, rows) = match report_type {
            ReportType::RetentionSplit => self.gen_retention_split()?,
            ReportType::SpendTiers => self.gen_spend_tiers()?,
            ReportType::ClvTiers => self.gen_clv_tiers()?,
            ReportType::DiscountDependency => self.gen_discount_dependency()?,
            ReportType::AtRiskCustomers => self.gen_at_risk()?,
            ReportType::DecliningActivity => self.gen_declining_activity()?,
            ReportType::PurchaseCadence => self.gen_purchase_cadence()?,
            ReportType::TopItems => self.gen_top_items(),
            ReportType::MonthlySeasonality => self.gen_monthly_seasonality(),
        };

        let output = ReportOutput {
            report_id: Uuid::new_v4(),
            report_type,
            generated_at: Utc::now(),
            reference_date: self.reference_date(),
            row_count: rows.len(),
            columns,
            rows,
        };
        info!(report = %report_type, rows = output.row_count, "Generated report");
        self.generated.insert(report_type, output.clone());
        Ok(output)
    }

    /// Run every report, collecting per-report results. A failing report
    /// never aborts the others.
    pub fn generate_all(&self) -> Vec<(ReportType, PulseResult<ReportOutput>)> {
        ReportType::all()
            .into_iter()
            .map(|report_type| (report_type, self.generate(report_type)))
            .collect()
    }

    pub fn get_generated(&self, report_type: ReportType) -> Option<ReportOutput> {
        self.generated.get(&report_type).map(|r| r.clone())
    }

    /// Export a previously generated report as CSV.
    pub fn export_csv(&self, report_type: ReportType) -> Option<String> {
        let output = self.generated.get(&report_type)?;
        let mut csv = output.columns.join(",");
        csv.push('\n');
        for row in &output.rows {
            let cells: Vec<String> = row
                .iter()
                .map(|v| match v {
                    serde_json::Value::String(s) => format!("\"{}\"", s.replace('"', "\"\"")),
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                })
                .collect();
            csv.push_str(&cells.join(","));
            csv.push('\n');
        }
        Some(csv)
    }

    /// Export a previously generated report as pretty JSON records.
    pub fn export_json(&self, report_type: ReportType) -> Option<String> {
        let output = self.generated.get(&report_type)?;
        let mut records: Vec<HashMap<String, serde_json::Value>> = Vec::new();
        for row in &output.rows {
            let mut record = HashMap::new();
            for (i, col) in output.columns.iter().enumerate() {
                if let Some(val) = row.get(i) {
                    record.insert(col.clone(), val.clone());
                }
            }
            records.push(record);
        }
        serde_json::to_string_pretty(&records).ok()
    }

    /// The aggregate set, or the stored integrity error for reports that
    /// need per-customer data.
    fn require_aggregates(&self) -> PulseResult<&AggregateSet> {
        match &self.integrity_error {
            Some((transaction_id, field)) => Err(PulseError::DataIntegrity {
                transaction_id: transaction_id.clone(),
                field: field.clone(),
            }),
            None => Ok(&self.aggregates),
        }
    }

    fn gen_retention_split(&self) -> PulseResult<(Vec<String>, Vec<Vec<serde_json::Value>>)> {
        let split = self.composer.retention_split(self.require_aggregates()?);
        Ok((
            columns(&["one_time_buyers", "repeat_customers", "total_customers"]),
            vec![vec![
                json!(split.one_time_buyers),
                json!(split.repeat_customers),
                json!(split.total_customers),
            ]],
        ))
    }

    fn gen_spend_tiers(&self) -> PulseResult<(Vec<String>, Vec<Vec<serde_json::Value>>)> {
        let rows = self.composer.spend_tiers(self.require_aggregates()?)?;
        Ok((
            columns(&["customer_id", "total_spending", "tier"]),
            rows.into_iter()
                .map(|r| {
                    vec![
                        json!(r.customer_id),
                        json!(r.total_spending),
                        json!(r.tier.as_str()),
                    ]
                })
                .collect(),
        ))
    }

    fn gen_clv_tiers(&self) -> PulseResult<(Vec<String>, Vec<Vec<serde_json::Value>>)> {
        let rows = self.composer.clv_tiers(self.require_aggregates()?)?;
        Ok((
            columns(&["customer_id", "lifetime_value", "tier"]),
            rows.into_iter()
                .map(|r| {
                    vec![
                        json!(r.customer_id),
                        json!(r.lifetime_value),
                        json!(r.tier.as_str()),
                    ]
                })
                .collect(),
        ))
    }

    fn gen_discount_dependency(&self) -> PulseResult<(Vec<String>, Vec<Vec<serde_json::Value>>)> {
        let rows = self
            .composer
            .discount_dependency(self.require_aggregates()?);
        Ok((
            columns(&[
                "customer_id",
                "transaction_count",
                "discounted_count",
                "discount_rate_pct",
            ]),
            rows.into_iter()
                .map(|r| {
                    vec![
                        json!(r.customer_id),
                        json!(r.transaction_count),
                        json!(r.discounted_count),
                        json!(r.discount_rate_pct),
                    ]
                })
                .collect(),
        ))
    }

    fn gen_at_risk(&self) -> PulseResult<(Vec<String>, Vec<Vec<serde_json::Value>>)> {
        let rows = self.composer.at_risk(self.require_aggregates()?)?;
        Ok((
            columns(&["customer_id", "total_spending", "days_inactive"]),
            rows.into_iter()
                .map(|r| {
                    vec![
                        json!(r.customer_id),
                        json!(r.total_spending),
                        json!(r.days_inactive),
                    ]
                })
                .collect(),
        ))
    }

    fn gen_declining_activity(&self) -> PulseResult<(Vec<String>, Vec<Vec<serde_json::Value>>)> {
        let rows = self
            .composer
            .declining_activity(self.require_aggregates()?);
        Ok((
            columns(&["customer_id", "past_count", "recent_count"]),
            rows.into_iter()
                .map(|r| {
                    vec![
                        json!(r.customer_id),
                        json!(r.past_count),
                        json!(r.recent_count),
                    ]
                })
                .collect(),
        ))
    }

    fn gen_purchase_cadence(&self) -> PulseResult<(Vec<String>, Vec<Vec<serde_json::Value>>)> {
        let rows = self.composer.purchase_cadence(self.require_aggregates()?);
        Ok((
            columns(&["customer_id", "purchase_count", "average_gap_days"]),
            rows.into_iter()
                .map(|r| {
                    vec![
                        json!(r.customer_id),
                        json!(r.purchase_count),
                        json!(r.average_gap_days),
                    ]
                })
                .collect(),
        ))
    }

    fn gen_top_items(&self) -> (Vec<String>, Vec<Vec<serde_json::Value>>) {
        let rows = top_items(&self.transactions, self.top_n_items);
        (
            columns(&["item", "units", "revenue"]),
            rows.into_iter()
                .map(|r| vec![json!(r.item), json!(r.units), json!(r.revenue)])
                .collect(),
        )
    }

    fn gen_monthly_seasonality(&self) -> (Vec<String>, Vec<Vec<serde_json::Value>>) {
        let rows = monthly_sales(&self.transactions);
        (
            columns(&["year", "month", "transactions", "revenue"]),
            rows.into_iter()
                .map(|r| {
                    vec![
                        json!(r.year),
                        json!(r.month),
                        json!(r.transactions),
                        json!(r.revenue),
                    ]
                })
                .collect(),
        )
    }
}

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}
