//! Per-customer reduction of the raw transaction table.

use pulse_core::types::{CustomerAggregate, Transaction};
use pulse_core::{PulseError, PulseResult};
use std::collections::HashMap;
use tracing::debug;

/// Output of one aggregation pass: the per-customer aggregates plus the
/// ids of transactions that carried no spend amount. Spend-based reports
/// check the gap list before trusting `total_spending`.
#[derive(Debug, Clone, Default)]
pub struct AggregateSet {
    aggregates: HashMap<String, CustomerAggregate>,
    spend_gaps: Vec<String>,
}

impl AggregateSet {
    pub fn get(&self, customer_id: &str) -> Option<&CustomerAggregate> {
        self.aggregates.get(customer_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CustomerAggregate> {
        self.aggregates.values()
    }

    pub fn len(&self) -> usize {
        self.aggregates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aggregates.is_empty()
    }

    /// Transaction ids that were aggregated without a `total_spent` value.
    pub fn spend_gaps(&self) -> &[String] {
        &self.spend_gaps
    }

    /// Fails with the first offending record when a report needs complete
    /// spend data.
    pub fn require_complete_spend(&self) -> PulseResult<()> {
        match self.spend_gaps.first() {
            Some(id) => Err(PulseError::DataIntegrity {
                transaction_id: id.clone(),
                field: "total_spent".to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// Reduce the transaction set to one aggregate per distinct customer.
///
/// Every transaction contributes to exactly one aggregate. A transaction
/// without a `customer_id` or `date` fails the whole pass; a missing
/// `total_spent` is recorded as a spend gap instead so that reports which
/// never look at spend can still run.
pub fn aggregate_customers(transactions: &[Transaction]) -> PulseResult<AggregateSet> {
    let mut aggregates: HashMap<String, CustomerAggregate> = HashMap::new();
    let mut spend_gaps = Vec::new();

    for tx in transactions {
        let customer_id = tx.customer_id.as_deref().ok_or_else(|| {
            PulseError::DataIntegrity {
                transaction_id: tx.transaction_id.clone(),
                field: "customer_id".to_string(),
            }
        })?;
        let date = tx.date.ok_or_else(|| PulseError::DataIntegrity {
            transaction_id: tx.transaction_id.clone(),
            field: "date".to_string(),
        })?;
        let spend = match tx.total_spent {
            Some(amount) => amount,
            None => {
                spend_gaps.push(tx.transaction_id.clone());
                0.0
            }
        };

        let entry = aggregates
            .entry(customer_id.to_string())
            .or_insert_with(|| CustomerAggregate {
                customer_id: customer_id.to_string(),
                total_spending: 0.0,
                transaction_count: 0,
                first_purchase_date: date,
                last_purchase_date: date,
                discounted_count: 0,
                purchase_dates: Vec::new(),
            });
        entry.total_spending += spend;
        entry.transaction_count += 1;
        if tx.discount_applied {
            entry.discounted_count += 1;
        }
        entry.purchase_dates.push(date);
    }

    for agg in aggregates.values_mut() {
        agg.purchase_dates.sort_unstable();
        if let (Some(first), Some(last)) =
            (agg.purchase_dates.first(), agg.purchase_dates.last())
        {
            agg.first_purchase_date = *first;
            agg.last_purchase_date = *last;
        }
    }

    debug!(
        transactions = transactions.len(),
        customers = aggregates.len(),
        spend_gaps = spend_gaps.len(),
        "Aggregated transaction set"
    );

    Ok(AggregateSet {
        aggregates,
        spend_gaps,
    })
}
