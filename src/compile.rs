use std::cmp::Reverse;

use crate::config::EngineConfig;
use crate::types::{
    AdjustmentKind, Condition, PricingRule, RuleKind, RuleRecord, RuleVariant,
};

/// Turn store records into the engine's evaluation list.
///
/// Disabled records and records of an unknown kind are dropped. The rest are
/// stable-sorted by descending priority, so equal priorities keep load order.
pub(crate) fn compile(records: &[RuleRecord], config: &EngineConfig) -> Vec<PricingRule> {
    let mut rules: Vec<PricingRule> = records
        .iter()
        .filter(|record| record.enabled)
        .filter_map(|record| compile_record(record, config))
        .collect();

    rules.sort_by_key(|rule| Reverse(rule.priority));

    tracing::debug!(
        loaded = rules.len(),
        skipped = records.len() - rules.len(),
        "compiled pricing rules"
    );
    rules
}

fn compile_record(record: &RuleRecord, config: &EngineConfig) -> Option<PricingRule> {
    let variant = match &record.kind {
        RuleKind::Generic => RuleVariant::Generic(record.adjustment.clone()),
        RuleKind::VolumeDiscount => RuleVariant::Volume(config.volume_tiers.clone()),
        RuleKind::CustomerSegment => {
            RuleVariant::CustomerSegment(config.segment_discounts.clone())
        }
        RuleKind::Unknown(kind) => {
            tracing::warn!(rule = %record.name, kind = %kind, "unknown rule kind; rule dropped");
            return None;
        }
    };

    warn_neutralized(record);

    Some(PricingRule {
        id: record.id,
        name: record.name.clone(),
        priority: record.priority,
        exclusive: record.exclusive,
        enabled: record.enabled,
        conditions: record.conditions.iter().map(Condition::compile).collect(),
        variant,
    })
}

fn warn_neutralized(record: &RuleRecord) {
    for condition in &record.conditions {
        if condition.operator.is_unknown() {
            tracing::warn!(
                rule = %record.name,
                operator = condition.operator.as_str(),
                "unknown operator; condition never matches"
            );
        }
    }
    if let Some(adjustment) = &record.adjustment {
        if let AdjustmentKind::Unknown(kind) = &adjustment.kind {
            tracing::warn!(
                rule = %record.name,
                kind = %kind,
                "unknown adjustment kind; adjustment is a no-op"
            );
        }
    }
}
