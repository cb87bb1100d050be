//! Tabular reporting over the customer segmentation views.

pub mod report_builder;

pub use report_builder::{ReportEngine, ReportOutput, ReportType};
