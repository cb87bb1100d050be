use chrono::NaiveDate;
use pulse_analytics::source::load_transactions;
use pulse_core::config::AnalysisConfig;
use pulse_core::types::Transaction;
use pulse_reporting::{ReportEngine, ReportType};

// ---------------------------------------------------------------------------
// Test data fixtures
// ---------------------------------------------------------------------------

/// Six customers with distinct behaviors, analyzed as of 2025-01-01.
///
/// Totals are [120, 100, 40, 30, 20, 10], so the default breakpoints give
/// p50 = 35.0 and p75 = 85.0.
///
///   CUST_01: high spender, 4 purchases, still active in December
///   CUST_02: high spender, lapsed since September (the at-risk case)
///   CUST_03: 3 early purchases, nothing recent (the declining case)
///   CUST_04: one-time buyer
///   CUST_05: tight 20-day cadence, half the purchases discounted
///   CUST_06: recent-only activity, no baseline window presence
const FIXTURE_CSV: &str = "\
transaction_id,customer_id,category,item,price_per_unit,quantity,total_spent,payment_method,location,date,discount_applied
TXN_0001,CUST_01,Electronics,Item_20_EHE,30.00,1,30.00,Credit Card,Online,2024-05-01,True
TXN_0002,CUST_01,Electronics,Item_20_EHE,30.00,1,30.00,Credit Card,Online,2024-09-01,False
TXN_0003,CUST_01,Food,Item_4_FOOD,30.00,1,30.00,Cash,In-store,2024-11-01,False
TXN_0004,CUST_01,Food,Item_4_FOOD,30.00,1,30.00,Cash,In-store,2024-12-20,False
TXN_0005,CUST_02,Furniture,Item_15_FUR,60.00,1,60.00,Digital Wallet,Online,2024-06-15,False
TXN_0006,CUST_02,Furniture,Item_15_FUR,40.00,1,40.00,Digital Wallet,Online,2024-09-01,False
TXN_0007,CUST_03,Food,Item_2_FOOD,10.00,1,10.00,Cash,In-store,2024-02-01,False
TXN_0008,CUST_03,Food,Item_2_FOOD,10.00,1,10.00,Cash,In-store,2024-03-02,False
TXN_0009,CUST_03,Food,Item_2_FOOD,10.00,1,10.00,Cash,In-store,2024-04-01,False
TXN_0010,CUST_04,Beverages,Item_9_BEV,10.00,1,10.00,Cash,In-store,2024-11-15,False
TXN_0011,CUST_05,Milk Products,Item_6_MILK,10.00,1,10.00,Credit Card,In-store,2024-07-10,True
TXN_0012,CUST_05,Milk Products,Item_6_MILK,10.00,1,10.00,Credit Card,In-store,2024-07-30,True
TXN_0013,CUST_05,Milk Products,Item_6_MILK,10.00,1,10.00,Credit Card,In-store,2024-08-19,False
TXN_0014,CUST_05,Milk Products,Item_6_MILK,10.00,1,10.00,Credit Card,In-store,2024-09-08,False
TXN_0015,CUST_06,Patisserie,Item_11_PAT,10.00,1,10.00,Cash,Online,2024-08-01,False
TXN_0016,CUST_06,Patisserie,Item_11_PAT,10.00,1,10.00,Cash,Online,2024-12-01,False
";

fn fixture_transactions() -> Vec<Transaction> {
    load_transactions(FIXTURE_CSV.as_bytes()).unwrap()
}

fn fixture_config() -> AnalysisConfig {
    AnalysisConfig {
        reference_date: NaiveDate::from_ymd_opt(2025, 1, 1),
        ..AnalysisConfig::default()
    }
}

fn fixture_engine() -> ReportEngine {
    ReportEngine::new(fixture_config(), fixture_transactions()).unwrap()
}

fn cell_str(row: &[serde_json::Value], idx: usize) -> &str {
    row[idx].as_str().unwrap()
}

// ---------------------------------------------------------------------------
// End-to-end report assertions
// ---------------------------------------------------------------------------

#[test]
fn retention_split_counts_sum_to_total() {
    let engine = fixture_engine();
    let output = engine.generate(ReportType::RetentionSplit).unwrap();
    let row = &output.rows[0];
    let one_time = row[0].as_u64().unwrap();
    let repeat = row[1].as_u64().unwrap();
    let total = row[2].as_u64().unwrap();
    assert_eq!(one_time, 1); // CUST_04
    assert_eq!(repeat, 5);
    assert_eq!(one_time + repeat, total);
}

#[test]
fn spend_tiers_follow_interpolated_breakpoints() {
    let engine = fixture_engine();
    let output = engine.generate(ReportType::SpendTiers).unwrap();

    let tier_of = |customer: &str| -> String {
        output
            .rows
            .iter()
            .find(|row| cell_str(row, 0) == customer)
            .map(|row| cell_str(row, 2).to_string())
            .unwrap()
    };
    assert_eq!(tier_of("CUST_01"), "high"); // 120 >= 85
    assert_eq!(tier_of("CUST_02"), "high"); // 100 >= 85
    assert_eq!(tier_of("CUST_05"), "medium"); // 40 >= 35
    assert_eq!(tier_of("CUST_03"), "low"); // 30 < 35
    assert_eq!(tier_of("CUST_04"), "low");
    assert_eq!(tier_of("CUST_06"), "low");

    // Ranked by spend descending.
    assert_eq!(cell_str(&output.rows[0], 0), "CUST_01");
}

#[test]
fn at_risk_is_high_tier_and_inactive_only() {
    let engine = fixture_engine();
    let at_risk = engine.generate(ReportType::AtRiskCustomers).unwrap();

    assert_eq!(at_risk.rows.len(), 1);
    assert_eq!(cell_str(&at_risk.rows[0], 0), "CUST_02");
    // 2024-09-01 to 2025-01-01.
    assert_eq!(at_risk.rows[0][2].as_i64().unwrap(), 122);

    // Property: every at-risk customer sits in the high spend tier.
    let tiers = engine.generate(ReportType::SpendTiers).unwrap();
    for row in &at_risk.rows {
        let customer = cell_str(row, 0);
        let tier = tiers
            .rows
            .iter()
            .find(|t| cell_str(t, 0) == customer)
            .map(|t| cell_str(t, 2))
            .unwrap();
        assert_eq!(tier, "high");
    }
}

#[test]
fn declining_activity_needs_a_baseline() {
    let engine = fixture_engine();
    let output = engine.generate(ReportType::DecliningActivity).unwrap();

    assert_eq!(output.rows.len(), 1);
    assert_eq!(cell_str(&output.rows[0], 0), "CUST_03");
    assert_eq!(output.rows[0][1].as_u64().unwrap(), 3); // past_count
    assert_eq!(output.rows[0][2].as_u64().unwrap(), 0); // recent_count

    // CUST_06 is recent-only: no baseline, so never flagged.
    assert!(output.rows.iter().all(|row| cell_str(row, 0) != "CUST_06"));
}

#[test]
fn purchase_cadence_ranks_tightest_first() {
    let engine = fixture_engine();
    let output = engine.generate(ReportType::PurchaseCadence).unwrap();

    assert_eq!(cell_str(&output.rows[0], 0), "CUST_05");
    assert_eq!(output.rows[0][2].as_f64().unwrap(), 20.0);

    // The one-time buyer carries no cadence at all.
    assert!(output.rows.iter().all(|row| cell_str(row, 0) != "CUST_04"));
}

#[test]
fn discount_dependency_ranked_descending() {
    let engine = fixture_engine();
    let output = engine.generate(ReportType::DiscountDependency).unwrap();

    assert_eq!(cell_str(&output.rows[0], 0), "CUST_05");
    assert_eq!(output.rows[0][3].as_f64().unwrap(), 50.0);

    let cust_01 = output
        .rows
        .iter()
        .find(|row| cell_str(row, 0) == "CUST_01")
        .unwrap();
    assert_eq!(cust_01[3].as_f64().unwrap(), 25.0);
}

#[test]
fn rollup_reports_cover_items_and_months() {
    let engine = fixture_engine();

    let items = engine.generate(ReportType::TopItems).unwrap();
    assert_eq!(cell_str(&items.rows[0], 0), "Item_15_FUR"); // 60 + 40 revenue
    assert_eq!(items.rows[0][2].as_f64().unwrap(), 100.0);

    let months = engine.generate(ReportType::MonthlySeasonality).unwrap();
    // Purchases span Feb through Dec 2024 with gaps: 10 distinct months.
    assert_eq!(months.rows.len(), 10);
    assert_eq!(months.rows[0][0].as_i64().unwrap(), 2024);
    assert_eq!(months.rows[0][1].as_u64().unwrap(), 2);
}

#[test]
fn full_run_is_idempotent() {
    let first = fixture_engine();
    let second = fixture_engine();
    for report_type in ReportType::all() {
        let a = first.generate(report_type).unwrap();
        let b = second.generate(report_type).unwrap();
        assert_eq!(a.columns, b.columns);
        assert_eq!(a.rows, b.rows, "report {} differs between runs", report_type);
    }
}

#[test]
fn csv_and_json_exports_agree_on_row_count() {
    let engine = fixture_engine();
    engine.generate(ReportType::SpendTiers).unwrap();

    let csv = engine.export_csv(ReportType::SpendTiers).unwrap();
    let json_text = engine.export_json(ReportType::SpendTiers).unwrap();
    let records: Vec<serde_json::Value> = serde_json::from_str(&json_text).unwrap();

    // Header plus one line per customer.
    assert_eq!(csv.lines().count(), 1 + records.len());
    assert_eq!(records.len(), 6);
}
