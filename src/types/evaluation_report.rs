use std::fmt;
use std::time::Duration;

use super::adjustment::Adjustment;
use super::result::PriceResult;

/// What happened to one rule during an explained calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    /// The rule applied and changed the running price.
    Applied(Adjustment),
    /// A condition or the variant's precondition did not hold.
    NotApplicable,
    /// The rule applied but produced no adjustment.
    NoAdjustment,
    /// Evaluation stopped at an earlier exclusive rule.
    NotReached,
}

impl fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleOutcome::Applied(adj) => write!(f, "applied {adj}"),
            RuleOutcome::NotApplicable => write!(f, "not applicable"),
            RuleOutcome::NoAdjustment => write!(f, "no adjustment"),
            RuleOutcome::NotReached => write!(f, "not reached"),
        }
    }
}

/// Detailed report returned by
/// [`PricingEngine::explain()`](crate::PricingEngine::explain).
///
/// Carries the same [`PriceResult`] as `calculate_price`, the outcome of
/// every loaded rule in evaluation order, and the wall-clock duration.
#[derive(Debug, Clone)]
#[must_use]
pub struct PricingReport {
    result: PriceResult,
    outcomes: Vec<(String, RuleOutcome)>,
    duration: Duration,
}

impl PricingReport {
    pub(crate) fn new(
        result: PriceResult,
        outcomes: Vec<(String, RuleOutcome)>,
        duration: Duration,
    ) -> Self {
        Self {
            result,
            outcomes,
            duration,
        }
    }

    pub fn result(&self) -> &PriceResult {
        &self.result
    }

    /// `(rule name, outcome)` for every loaded rule, in evaluation order.
    #[must_use]
    pub fn outcomes(&self) -> &[(String, RuleOutcome)] {
        &self.outcomes
    }

    /// Outcome for a rule by name.
    #[must_use]
    pub fn outcome_of(&self, rule: &str) -> Option<&RuleOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| name == rule)
            .map(|(_, outcome)| outcome)
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn into_result(self) -> PriceResult {
        self.result
    }
}

impl fmt::Display for PricingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "price: {}", self.result)?;
        let rules: Vec<String> = self
            .outcomes
            .iter()
            .map(|(name, outcome)| format!("{name}: {outcome}"))
            .collect();
        write!(f, ", rules: [{}]", rules.join(", "))?;
        write!(f, ", duration: {:?}", self.duration)?;
        Ok(())
    }
}
