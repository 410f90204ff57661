//! Rule-based pricing.
//!
//! A [`PricingEngine`] holds prioritized rules. Each rule has AND-combined
//! conditions over product, customer, quantity and caller-supplied
//! attributes, plus one price adjustment. Rules are applied in descending
//! priority to a running price, an exclusive rule stops evaluation, and the
//! final price never goes below zero.
//!
//! ```
//! use rust_decimal::Decimal;
//! use tariff::{field, Adjustment, Attributes, Customer, PricingEngine, Product};
//!
//! let engine = PricingEngine::builder()
//!     .rule("wholesale", |r| {
//!         r.priority(20)
//!             .when(field("customer.group_code").eq("wholesale"))
//!             .then(Adjustment::percentage_off(Decimal::from(20)))
//!     })
//!     .rule("bulk", |r| r.priority(10).volume_discount())
//!     .build()
//!     .unwrap();
//!
//! let product = Product::new(1, Decimal::from(100));
//! let customer = Customer::new(7).with_group_code("wholesale");
//! let result = engine.calculate_price(&product, Some(&customer), 50, &Attributes::new());
//! assert_eq!(result.final_price(), Decimal::from(72));
//! ```

mod compile;
mod config;
mod engine;
pub mod error;
mod evaluate;
mod handle;
pub mod parse;
#[cfg(feature = "binary-cache")]
pub mod serial;
mod types;

pub use config::EngineConfig;
pub use engine::{PricingCandidate, PricingEngine, PricingEngineBuilder, RuleBuilder, TierPrice};
pub use error::PricingError;
pub use handle::EngineHandle;
pub use parse::{ParseError, ParsedRules};
#[cfg(feature = "binary-cache")]
pub use serial::{snapshot_is_fresh, DeserializeError, SerializeError};
pub use types::{
    compare, field, Adjustment, AdjustmentKind, AppliedRule, Attributes, Condition,
    ConditionRecord, ConfigError, Customer, DisplayTier, EvaluationContext, FieldCondition,
    FieldPath, Operator, PriceResult, PriceSummary, PricingReport, PricingRule, Product,
    RuleKind, RuleOutcome, RuleRecord, RuleVariant, SegmentTable, Value, VolumeTier, VolumeTiers,
};
