//! Customer segmentation: composes aggregation, percentile, and temporal
//! analytics into named segment views.

pub mod composer;
pub mod labels;

pub use composer::{
    AtRiskRow, ClvTierRow, DecliningActivityRow, DiscountDependencyRow, RetentionSplit,
    SegmentComposer, SpendTierRow,
};
pub use labels::{ChurnRisk, ClvTier, SpendTier};
