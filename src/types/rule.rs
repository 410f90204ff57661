use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::adjustment::Adjustment;
use super::condition::{Condition, ConditionRecord};
use super::subject::EvaluationContext;
use super::tiers::{SegmentTable, VolumeTiers};

/// Which rule implementation a record asks for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum RuleKind {
    /// Conditions and adjustment come from the record itself.
    #[default]
    Generic,
    /// Built-in quantity-tiered percentage discount.
    VolumeDiscount,
    /// Built-in customer group percentage discount.
    CustomerSegment,
    /// Not recognized; such records are dropped when the engine is built.
    Unknown(String),
}

impl RuleKind {
    #[must_use]
    pub fn from_name(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "generic" | "" => RuleKind::Generic,
            "volume_discount" | "volume" | "tiered" => RuleKind::VolumeDiscount,
            "customer_segment" | "segment" | "customer_group" => RuleKind::CustomerSegment,
            _ => RuleKind::Unknown(s.to_owned()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            RuleKind::Generic => "generic",
            RuleKind::VolumeDiscount => "volume_discount",
            RuleKind::CustomerSegment => "customer_segment",
            RuleKind::Unknown(name) => name,
        }
    }
}

impl Serialize for RuleKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RuleKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(RuleKind::from_name(&name))
    }
}

/// A rule as stored by the rule store, before compilation.
///
/// Records come from JSON exports, the rule file parser, or the builder API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub kind: RuleKind,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub exclusive: bool,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub conditions: Vec<ConditionRecord>,
    #[serde(default)]
    pub adjustment: Option<Adjustment>,
}

fn enabled_by_default() -> bool {
    true
}

impl RuleRecord {
    /// A generic, enabled, non-exclusive record with priority 0.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_owned(),
            kind: RuleKind::Generic,
            priority: 0,
            exclusive: false,
            enabled: true,
            conditions: Vec::new(),
            adjustment: None,
        }
    }
}

/// The closed set of rule behaviors, resolved once at load time.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleVariant {
    Volume(VolumeTiers),
    CustomerSegment(SegmentTable),
    Generic(Option<Adjustment>),
}

/// A compiled rule: conditions resolved, variant fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingRule {
    pub(crate) id: Option<i64>,
    pub(crate) name: String,
    pub(crate) priority: i64,
    pub(crate) exclusive: bool,
    pub(crate) enabled: bool,
    pub(crate) conditions: Vec<Condition>,
    pub(crate) variant: RuleVariant,
}

impl PricingRule {
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn priority(&self) -> i64 {
        self.priority
    }

    #[must_use]
    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn variant(&self) -> &RuleVariant {
        &self.variant
    }

    /// All conditions hold (vacuously true when there are none) and the
    /// variant's own precondition holds.
    #[must_use]
    pub fn applies_to(&self, ctx: &EvaluationContext<'_>) -> bool {
        if !self.conditions.iter().all(|c| c.evaluate(ctx)) {
            return false;
        }
        match &self.variant {
            RuleVariant::Volume(tiers) => tiers.percentage_for(ctx.quantity()).is_some(),
            RuleVariant::CustomerSegment(table) => segment_percentage(table, ctx).is_some(),
            RuleVariant::Generic(_) => true,
        }
    }

    /// The adjustment this rule contributes for the context, if any.
    #[must_use]
    pub fn calculate_adjustment(&self, ctx: &EvaluationContext<'_>) -> Option<Adjustment> {
        match &self.variant {
            RuleVariant::Volume(tiers) => tiers
                .percentage_for(ctx.quantity())
                .map(Adjustment::percentage_off),
            RuleVariant::CustomerSegment(table) => {
                segment_percentage(table, ctx).map(Adjustment::percentage_off)
            }
            RuleVariant::Generic(adjustment) => adjustment.clone(),
        }
    }
}

fn segment_percentage(
    table: &SegmentTable,
    ctx: &EvaluationContext<'_>,
) -> Option<rust_decimal::Decimal> {
    let code = ctx.customer()?.group_code.as_deref()?;
    table.percentage_for(code)
}

impl fmt::Display for PricingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (priority {}", self.name, self.priority)?;
        if self.exclusive {
            write!(f, ", exclusive")?;
        }
        write!(f, ")")
    }
}
