use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single row of the purchases table. Read-only input; the engine never
/// mutates transactions. Fields that real exports leave blank deserialize
/// as `None` and are validated where a computation actually needs them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub customer_id: Option<String>,
    pub category: Option<String>,
    pub item: Option<String>,
    pub price_per_unit: Option<f64>,
    pub quantity: Option<u32>,
    pub total_spent: Option<f64>,
    pub payment_method: Option<String>,
    pub location: Option<String>,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub discount_applied: bool,
}

/// One customer's reduction of the transaction table. Recomputed fully on
/// each run; there is no incremental update path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerAggregate {
    pub customer_id: String,
    pub total_spending: f64,
    pub transaction_count: u64,
    pub first_purchase_date: NaiveDate,
    pub last_purchase_date: NaiveDate,
    pub discounted_count: u64,
    /// Purchase dates sorted ascending. Interval math depends on the order.
    pub purchase_dates: Vec<NaiveDate>,
}

impl CustomerAggregate {
    /// Share of this customer's purchases made under a discount, as a
    /// percentage.
    pub fn discount_rate_pct(&self) -> f64 {
        if self.transaction_count == 0 {
            return 0.0;
        }
        self.discounted_count as f64 / self.transaction_count as f64 * 100.0
    }
}
