use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};

use super::adjustment::Adjustment;

/// One step of the price trace: which rule fired, what it did, and the
/// running price right after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedRule {
    pub rule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<i64>,
    pub adjustment: Adjustment,
    pub price_after: Decimal,
}

impl fmt::Display for AppliedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> {}", self.rule, self.adjustment, self.price_after)
    }
}

/// The outcome of pricing one product.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct PriceResult {
    original_price: Decimal,
    final_price: Decimal,
    applied_rules: Vec<AppliedRule>,
    quantity: u32,
}

impl PriceResult {
    pub(crate) fn new(
        original_price: Decimal,
        final_price: Decimal,
        applied_rules: Vec<AppliedRule>,
        quantity: u32,
    ) -> Self {
        Self {
            original_price,
            final_price,
            applied_rules,
            quantity,
        }
    }

    /// Unit price before any rule.
    #[must_use]
    pub fn original_price(&self) -> Decimal {
        self.original_price
    }

    /// Unit price after all applicable rules, never negative.
    #[must_use]
    pub fn final_price(&self) -> Decimal {
        self.final_price
    }

    /// Rules that changed the price, in application order.
    #[must_use]
    pub fn applied_rules(&self) -> &[AppliedRule] {
        &self.applied_rules
    }

    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// `original - final`. Negative when rules raised the price.
    #[must_use]
    pub fn discount(&self) -> Decimal {
        self.original_price - self.final_price
    }

    /// Discount as a percentage of the original price; 0 when the original is 0.
    #[must_use]
    pub fn discount_percentage(&self) -> Decimal {
        if self.original_price.is_zero() {
            return Decimal::ZERO;
        }
        self.discount()
            .checked_div(self.original_price)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::ZERO)
    }

    /// `final_price * quantity`.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.final_price
            .checked_mul(Decimal::from(self.quantity))
            .unwrap_or(Decimal::MAX)
    }

    /// Flat record for result consumers.
    pub fn summary(&self) -> PriceSummary {
        PriceSummary {
            original_price: self.original_price,
            final_price: self.final_price,
            discount: self.discount(),
            discount_percentage: self.discount_percentage(),
            quantity: self.quantity,
            total_price: self.total_price(),
            applied_rules: self.applied_rules.clone(),
        }
    }
}

impl Serialize for PriceResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.summary().serialize(serializer)
    }
}

impl fmt::Display for PriceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} x{}",
            self.original_price, self.final_price, self.quantity
        )?;
        if !self.applied_rules.is_empty() {
            let steps: Vec<String> = self.applied_rules.iter().map(ToString::to_string).collect();
            write!(f, " [{}]", steps.join(", "))?;
        }
        Ok(())
    }
}

/// Serialized form of a [`PriceResult`], including the derived values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSummary {
    pub original_price: Decimal,
    pub final_price: Decimal,
    pub discount: Decimal,
    pub discount_percentage: Decimal,
    pub quantity: u32,
    pub total_price: Decimal,
    pub applied_rules: Vec<AppliedRule>,
}
