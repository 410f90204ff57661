mod adjustment;
mod attributes;
mod condition;
mod error;
mod evaluation_report;
mod field;
mod result;
mod rule;
mod subject;
mod tiers;
mod value;

pub use adjustment::{Adjustment, AdjustmentKind};
pub use attributes::Attributes;
pub use condition::{compare, field, Condition, ConditionRecord, FieldCondition, Operator};
pub use error::ConfigError;
pub use evaluation_report::{PricingReport, RuleOutcome};
pub use field::FieldPath;
pub use result::{AppliedRule, PriceResult, PriceSummary};
pub use rule::{PricingRule, RuleKind, RuleRecord, RuleVariant};
pub use subject::{Customer, EvaluationContext, Product};
pub use tiers::{DisplayTier, SegmentTable, VolumeTier, VolumeTiers};
pub use value::Value;
