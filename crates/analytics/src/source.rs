//! Transaction ingestion. CSV files and in-memory collections both feed
//! the pipeline through the `TransactionSource` seam.
//!
//! Expected CSV columns:
//!   transaction_id, customer_id, category, item, price_per_unit,
//!   quantity, total_spent, payment_method, location, date,
//!   discount_applied

use pulse_core::types::Transaction;
use pulse_core::{PulseError, PulseResult};
use serde::Deserialize;
use std::io::Read;
use tracing::info;

/// Anything that can produce the full transaction set for one run.
/// The engine requires read access only.
pub trait TransactionSource {
    fn fetch(&self) -> PulseResult<Vec<Transaction>>;
}

/// CSV-file backed source.
pub struct CsvSource {
    path: String,
}

impl CsvSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl TransactionSource for CsvSource {
    fn fetch(&self) -> PulseResult<Vec<Transaction>> {
        let file = std::fs::File::open(&self.path)?;
        let transactions = load_transactions(file)?;
        info!(
            path = %self.path,
            count = transactions.len(),
            "Loaded transactions from CSV"
        );
        Ok(transactions)
    }
}

/// In-memory source for embedding callers and tests.
pub struct MemorySource {
    transactions: Vec<Transaction>,
}

impl MemorySource {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }
}

impl TransactionSource for MemorySource {
    fn fetch(&self) -> PulseResult<Vec<Transaction>> {
        Ok(self.transactions.clone())
    }
}

/// Raw CSV record. Blank cells land as `None`; the discount column accepts
/// the usual spreadsheet spellings of a boolean.
#[derive(Debug, Clone, Deserialize)]
struct TransactionRecord {
    transaction_id: String,
    customer_id: Option<String>,
    category: Option<String>,
    item: Option<String>,
    price_per_unit: Option<f64>,
    quantity: Option<u32>,
    total_spent: Option<f64>,
    payment_method: Option<String>,
    location: Option<String>,
    date: Option<chrono::NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_bool")]
    discount_applied: bool,
}

impl TransactionRecord {
    fn into_transaction(self) -> Transaction {
        Transaction {
            transaction_id: self.transaction_id,
            customer_id: self.customer_id.filter(|s| !s.is_empty()),
            category: self.category.filter(|s| !s.is_empty()),
            item: self.item.filter(|s| !s.is_empty()),
            price_per_unit: self.price_per_unit,
            quantity: self.quantity,
            total_spent: self.total_spent,
            payment_method: self.payment_method.filter(|s| !s.is_empty()),
            location: self.location.filter(|s| !s.is_empty()),
            date: self.date,
            discount_applied: self.discount_applied,
        }
    }
}

/// Load transactions from any CSV reader.
pub fn load_transactions<R: Read>(reader: R) -> PulseResult<Vec<Transaction>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut transactions = Vec::new();
    for (line_num, result) in csv_reader.deserialize().enumerate() {
        let record: TransactionRecord = result.map_err(|e| {
            // +2: one for the header row, one for zero-based enumeration
            PulseError::Csv(format!("parse error at line {}: {}", line_num + 2, e))
        })?;
        transactions.push(record.into_transaction());
    }

    Ok(transactions)
}

/// Flexible bool deserializer: handles "true"/"false", "1"/"0", "yes"/"no".
/// A blank cell counts as false.
fn deserialize_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    match s.to_lowercase().trim() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "expected bool value, got '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
transaction_id,customer_id,category,item,price_per_unit,quantity,total_spent,payment_method,location,date,discount_applied
TXN_0001,CUST_01,Food,Item_10_FOOD,9.50,2,19.00,Credit Card,In-store,2024-01-05,True
TXN_0002,CUST_01,Beverages,Item_3_BEV,4.25,4,17.00,Cash,Online,2024-02-11,False
TXN_0003,CUST_02,Food,Item_2_FOOD,6.00,1,6.00,Digital Wallet,Online,2024-01-20,
TXN_0004,CUST_03,,Item_7_MISC,,3,,Cash,In-store,2024-03-02,yes
TXN_0005,,Food,Item_1_FOOD,2.00,1,2.00,Cash,In-store,,0
";

    #[test]
    fn test_load_sample_csv() {
        let transactions = load_transactions(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(transactions.len(), 5);
        assert_eq!(transactions[0].transaction_id, "TXN_0001");
        assert_eq!(transactions[0].customer_id.as_deref(), Some("CUST_01"));
        assert!(transactions[0].discount_applied);
        assert!(!transactions[1].discount_applied);
    }

    #[test]
    fn test_blank_cells_become_none() {
        let transactions = load_transactions(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(transactions[3].category, None);
        assert_eq!(transactions[3].price_per_unit, None);
        assert_eq!(transactions[3].total_spent, None);
        assert_eq!(transactions[4].customer_id, None);
        assert_eq!(transactions[4].date, None);
    }

    #[test]
    fn test_bool_parsing_handles_variants() {
        let transactions = load_transactions(SAMPLE_CSV.as_bytes()).unwrap();
        assert!(!transactions[2].discount_applied); // blank
        assert!(transactions[3].discount_applied); // yes
        assert!(!transactions[4].discount_applied); // 0
    }

    #[test]
    fn test_bad_row_reports_line_number() {
        let csv_data = "\
transaction_id,customer_id,category,item,price_per_unit,quantity,total_spent,payment_method,location,date,discount_applied
TXN_0001,CUST_01,Food,Item_1,1.00,1,1.00,Cash,In-store,2024-01-05,false
TXN_0002,CUST_01,Food,Item_1,not_a_number,1,1.00,Cash,In-store,2024-01-06,false
";
        let err = load_transactions(csv_data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_memory_source_round_trip() {
        let transactions = load_transactions(SAMPLE_CSV.as_bytes()).unwrap();
        let source = MemorySource::new(transactions.clone());
        let fetched = source.fetch().unwrap();
        assert_eq!(fetched.len(), transactions.len());
    }
}
