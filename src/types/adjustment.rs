use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// How an adjustment transforms the running price.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AdjustmentKind {
    /// `running - amount`
    SubtractFixed,
    /// `running * (1 - amount / 100)`
    PercentageOff,
    /// `amount`
    ReplaceFixed,
    /// `running * amount`
    MultiplyBy,
    /// Loaded from data but not recognized. Applying it is a no-op.
    Unknown(String),
}

impl AdjustmentKind {
    /// Map a kind name to a kind. Never fails.
    #[must_use]
    pub fn from_name(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "subtract_fixed" | "subtract" | "fixed_discount" | "fixed" => {
                AdjustmentKind::SubtractFixed
            }
            "percentage_off" | "percentage" | "percent" | "percent_off" => {
                AdjustmentKind::PercentageOff
            }
            "replace_fixed" | "fixed_price" | "replace" => AdjustmentKind::ReplaceFixed,
            "multiply_by" | "multiply" | "multiplier" => AdjustmentKind::MultiplyBy,
            _ => AdjustmentKind::Unknown(s.to_owned()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            AdjustmentKind::SubtractFixed => "subtract_fixed",
            AdjustmentKind::PercentageOff => "percentage_off",
            AdjustmentKind::ReplaceFixed => "replace_fixed",
            AdjustmentKind::MultiplyBy => "multiply_by",
            AdjustmentKind::Unknown(name) => name,
        }
    }
}

impl Serialize for AdjustmentKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AdjustmentKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(AdjustmentKind::from_name(&name))
    }
}

/// One price transformation: a kind and its amount.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Adjustment {
    pub kind: AdjustmentKind,
    pub amount: Decimal,
}

impl Adjustment {
    #[must_use]
    pub fn new(kind: AdjustmentKind, amount: Decimal) -> Self {
        Self { kind, amount }
    }

    #[must_use]
    pub fn subtract(amount: Decimal) -> Self {
        Self::new(AdjustmentKind::SubtractFixed, amount)
    }

    #[must_use]
    pub fn percentage_off(percent: Decimal) -> Self {
        Self::new(AdjustmentKind::PercentageOff, percent)
    }

    #[must_use]
    pub fn fixed_price(price: Decimal) -> Self {
        Self::new(AdjustmentKind::ReplaceFixed, price)
    }

    #[must_use]
    pub fn multiply(factor: Decimal) -> Self {
        Self::new(AdjustmentKind::MultiplyBy, factor)
    }

    /// Apply to the running price. Pure and unclamped.
    ///
    /// Unknown kinds and arithmetic overflow leave the price unchanged.
    #[must_use]
    pub fn apply(&self, running: Decimal) -> Decimal {
        let next = match &self.kind {
            AdjustmentKind::SubtractFixed => running.checked_sub(self.amount),
            AdjustmentKind::PercentageOff => self
                .amount
                .checked_div(Decimal::ONE_HUNDRED)
                .and_then(|fraction| Decimal::ONE.checked_sub(fraction))
                .and_then(|factor| running.checked_mul(factor)),
            AdjustmentKind::ReplaceFixed => Some(self.amount),
            AdjustmentKind::MultiplyBy => running.checked_mul(self.amount),
            AdjustmentKind::Unknown(_) => return running,
        };
        next.unwrap_or_else(|| {
            tracing::warn!(
                kind = self.kind.as_str(),
                amount = %self.amount,
                running = %running,
                "adjustment overflowed; price left unchanged"
            );
            running
        })
    }
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            AdjustmentKind::SubtractFixed => write!(f, "-{}", self.amount),
            AdjustmentKind::PercentageOff => write!(f, "-{}%", self.amount),
            AdjustmentKind::ReplaceFixed => write!(f, "={}", self.amount),
            AdjustmentKind::MultiplyBy => write!(f, "x{}", self.amount),
            AdjustmentKind::Unknown(name) => write!(f, "{name}({})", self.amount),
        }
    }
}
