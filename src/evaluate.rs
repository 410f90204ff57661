use std::time::Instant;

use rust_decimal::Decimal;

use crate::types::{
    AppliedRule, EvaluationContext, PriceResult, PricingReport, PricingRule, RuleOutcome,
};

pub(crate) fn evaluate(rules: &[PricingRule], ctx: &EvaluationContext<'_>) -> PriceResult {
    run(rules, ctx, |_, _| {})
}

pub(crate) fn evaluate_detailed(
    rules: &[PricingRule],
    ctx: &EvaluationContext<'_>,
) -> PricingReport {
    let start = Instant::now();
    let mut outcomes = Vec::with_capacity(rules.len());
    let result = run(rules, ctx, |rule, outcome| {
        outcomes.push((rule.name.clone(), outcome));
    });
    PricingReport::new(result, outcomes, start.elapsed())
}

/// Apply rules in order to the running price.
///
/// `rules` must already be sorted by descending priority. Every rule is
/// reported to `observe` exactly once.
fn run(
    rules: &[PricingRule],
    ctx: &EvaluationContext<'_>,
    mut observe: impl FnMut(&PricingRule, RuleOutcome),
) -> PriceResult {
    let base_price = ctx.product().price;
    let mut running = base_price;
    let mut trace = Vec::new();

    let mut remaining = rules.iter();
    for rule in remaining.by_ref() {
        if !rule.enabled || !rule.applies_to(ctx) {
            observe(rule, RuleOutcome::NotApplicable);
            continue;
        }
        let Some(adjustment) = rule.calculate_adjustment(ctx) else {
            observe(rule, RuleOutcome::NoAdjustment);
            continue;
        };

        running = adjustment.apply(running);
        tracing::trace!(rule = %rule.name, adjustment = %adjustment, price = %running, "rule applied");
        trace.push(AppliedRule {
            rule: rule.name.clone(),
            rule_id: rule.id,
            adjustment: adjustment.clone(),
            price_after: running,
        });
        observe(rule, RuleOutcome::Applied(adjustment));

        if rule.exclusive {
            break;
        }
    }
    for rule in remaining {
        observe(rule, RuleOutcome::NotReached);
    }

    let final_price = running.max(Decimal::ZERO);
    PriceResult::new(base_price, final_price, trace, ctx.quantity())
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::{field, Adjustment, Attributes, Customer, PricingEngine, Product, RuleOutcome};

    fn d(v: i64) -> Decimal {
        Decimal::from(v)
    }

    fn price(engine: &PricingEngine, quantity: u32) -> Decimal {
        let product = Product::new(1, d(100));
        engine
            .calculate_price(&product, None, quantity, &Attributes::new())
            .final_price()
    }

    #[test]
    fn no_rules_keeps_base_price() {
        let engine = PricingEngine::builder().build().unwrap();
        let product = Product::new(1, d(100));
        let result = engine.calculate_price(&product, None, 1, &Attributes::new());
        assert_eq!(result.original_price(), d(100));
        assert_eq!(result.final_price(), d(100));
        assert_eq!(result.discount(), Decimal::ZERO);
        assert!(result.applied_rules().is_empty());
    }

    #[test]
    fn higher_priority_applies_first_and_compounds() {
        let engine = PricingEngine::builder()
            .rule("minus_ten", |r| r.priority(10).then(Adjustment::subtract(d(10))))
            .rule("half", |r| r.priority(20).then(Adjustment::percentage_off(d(50))))
            .build()
            .unwrap();
        // 100 * 0.5 = 50, then 50 - 10 = 40 (not 100 - 10 = 90, * 0.5 = 45)
        assert_eq!(price(&engine, 1), d(40));
    }

    #[test]
    fn exclusive_rule_stops_evaluation() {
        let engine = PricingEngine::builder()
            .rule("flash_sale", |r| {
                r.priority(50)
                    .exclusive()
                    .then(Adjustment::fixed_price(d(60)))
            })
            .rule("extra", |r| r.priority(10).then(Adjustment::subtract(d(5))))
            .build()
            .unwrap();
        assert_eq!(price(&engine, 1), d(60));
    }

    #[test]
    fn exclusive_rule_that_does_not_apply_does_not_stop() {
        let engine = PricingEngine::builder()
            .rule("bulk_only", |r| {
                r.priority(50)
                    .exclusive()
                    .when(field("quantity").gte(100_i64))
                    .then(Adjustment::fixed_price(d(1)))
            })
            .rule("extra", |r| r.priority(10).then(Adjustment::subtract(d(5))))
            .build()
            .unwrap();
        assert_eq!(price(&engine, 1), d(95));
    }

    #[test]
    fn final_price_is_clamped_at_zero() {
        let engine = PricingEngine::builder()
            .rule("too_much", |r| r.then(Adjustment::subtract(d(500))))
            .build()
            .unwrap();
        let product = Product::new(1, d(100));
        let result = engine.calculate_price(&product, None, 1, &Attributes::new());
        assert_eq!(result.final_price(), Decimal::ZERO);
        // The trace keeps the unclamped running price.
        assert_eq!(result.applied_rules()[0].price_after, d(-400));
    }

    #[test]
    fn intermediate_negative_price_can_recover() {
        let engine = PricingEngine::builder()
            .rule("too_much", |r| r.priority(2).then(Adjustment::subtract(d(150))))
            .rule("fee", |r| r.priority(1).then(Adjustment::subtract(d(-70))))
            .build()
            .unwrap();
        assert_eq!(price(&engine, 1), d(20));
    }

    #[test]
    fn generic_rule_without_adjustment_is_skipped() {
        let engine = PricingEngine::builder()
            .rule("marker", |r| r.priority(5).exclusive())
            .rule("promo", |r| r.then(Adjustment::subtract(d(1))))
            .build()
            .unwrap();
        assert_eq!(price(&engine, 1), d(99));
    }

    #[test]
    fn explain_reports_every_rule() {
        let engine = PricingEngine::builder()
            .rule("segment", |r| r.priority(30).customer_segment())
            .rule("stop", |r| {
                r.priority(20)
                    .exclusive()
                    .then(Adjustment::subtract(d(5)))
            })
            .rule("never", |r| r.priority(10).then(Adjustment::subtract(d(5))))
            .rule("marker", |r| r.priority(40))
            .build()
            .unwrap();
        let product = Product::new(1, d(100));
        let guest = Customer::new(1);
        let report = engine.explain(&product, Some(&guest), 1, &Attributes::new());

        assert_eq!(report.outcome_of("marker"), Some(&RuleOutcome::NoAdjustment));
        assert_eq!(report.outcome_of("segment"), Some(&RuleOutcome::NotApplicable));
        assert_eq!(
            report.outcome_of("stop"),
            Some(&RuleOutcome::Applied(Adjustment::subtract(d(5))))
        );
        assert_eq!(report.outcome_of("never"), Some(&RuleOutcome::NotReached));
        assert_eq!(report.result().final_price(), d(95));
        assert_eq!(report.outcomes().len(), 4);
    }
}
