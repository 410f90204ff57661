use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::types::{
    Adjustment, Attributes, ConditionRecord, ConfigError, Customer, EvaluationContext,
    PriceResult, PricingReport, PricingRule, Product, RuleKind, RuleRecord,
};

/// Builder for constructing a [`PricingEngine`].
///
/// Rules come from store records, a rule file, or closures, and are compiled
/// into an immutable engine that can be shared across threads.
///
/// # Example
///
/// ```
/// use rust_decimal::Decimal;
/// use tariff::{field, Adjustment, Attributes, PricingEngineBuilder, Product};
///
/// let engine = PricingEngineBuilder::new()
///     .rule("clearance", |r| {
///         r.priority(20)
///             .when(field("product.category_id").eq(7_i64))
///             .then(Adjustment::percentage_off(Decimal::from(30)))
///     })
///     .rule("bulk", |r| r.priority(10).volume_discount())
///     .build()
///     .unwrap();
///
/// let product = Product::new(1, Decimal::from(100)).with_category(7);
/// let result = engine.calculate_price(&product, None, 1, &Attributes::new());
/// assert_eq!(result.final_price(), Decimal::from(70));
/// ```
#[derive(Debug, Default)]
pub struct PricingEngineBuilder {
    records: Vec<RuleRecord>,
    config: EngineConfig,
}

/// Intermediate builder passed to the rule definition closure.
#[derive(Debug)]
pub struct RuleBuilder {
    record: RuleRecord,
}

impl PricingEngineBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the tables used by the built-in rules and the tier preview.
    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Define a rule with a closure. Without `.then(..)` or a built-in
    /// variant the rule never adjusts the price.
    #[must_use]
    pub fn rule(mut self, name: &str, f: impl FnOnce(RuleBuilder) -> RuleBuilder) -> Self {
        let builder = f(RuleBuilder {
            record: RuleRecord::new(name),
        });
        self.records.push(builder.record);
        self
    }

    /// Add one store record. Records keep their insertion order among equal
    /// priorities.
    #[must_use]
    pub fn record(mut self, record: RuleRecord) -> Self {
        self.records.push(record);
        self
    }

    #[must_use]
    pub fn records(mut self, records: impl IntoIterator<Item = RuleRecord>) -> Self {
        self.records.extend(records);
        self
    }

    /// Validate the configuration and compile the rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration tables are inconsistent.
    /// Defects inside rule records never fail the build; they are neutralized.
    pub fn build(self) -> Result<PricingEngine, ConfigError> {
        self.config.validate()?;
        let rules = crate::compile::compile(&self.records, &self.config);
        Ok(PricingEngine {
            rules,
            config: self.config,
        })
    }
}

impl RuleBuilder {
    #[must_use]
    pub fn id(mut self, id: i64) -> Self {
        self.record.id = Some(id);
        self
    }

    /// Higher priorities are evaluated first.
    #[must_use]
    pub fn priority(mut self, priority: i64) -> Self {
        self.record.priority = priority;
        self
    }

    /// Stop evaluating further rules once this one adjusts the price.
    #[must_use]
    pub fn exclusive(mut self) -> Self {
        self.record.exclusive = true;
        self
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.record.enabled = false;
        self
    }

    /// Add a condition. Conditions are AND-combined.
    #[must_use]
    pub fn when(mut self, condition: ConditionRecord) -> Self {
        self.record.conditions.push(condition);
        self
    }

    #[must_use]
    pub fn then(mut self, adjustment: Adjustment) -> Self {
        self.record.adjustment = Some(adjustment);
        self
    }

    /// Use the built-in quantity tier discount.
    #[must_use]
    pub fn volume_discount(mut self) -> Self {
        self.record.kind = RuleKind::VolumeDiscount;
        self
    }

    /// Use the built-in customer group discount.
    #[must_use]
    pub fn customer_segment(mut self) -> Self {
        self.record.kind = RuleKind::CustomerSegment;
        self
    }
}

/// A compiled, immutable rule set. Thread-safe and designed to live behind `Arc`.
///
/// Refreshing rules means building a new engine; see
/// [`EngineHandle`](crate::EngineHandle).
#[derive(Debug, Clone)]
pub struct PricingEngine {
    pub(crate) rules: Vec<PricingRule>,
    pub(crate) config: EngineConfig,
}

/// One row of the tiered pricing preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierPrice {
    pub label: String,
    pub min_quantity: u32,
    pub max_quantity: Option<u32>,
    pub unit_price: Decimal,
    pub discount_percentage: Decimal,
}

/// One customer/context assumption for [`PricingEngine::best_price`].
#[derive(Debug, Clone, Default)]
pub struct PricingCandidate {
    pub customer: Option<Customer>,
    pub context: Attributes,
}

impl PricingCandidate {
    #[must_use]
    pub fn new(customer: Option<Customer>, context: Attributes) -> Self {
        Self { customer, context }
    }
}

impl PricingEngine {
    #[must_use]
    pub fn builder() -> PricingEngineBuilder {
        PricingEngineBuilder::new()
    }

    /// Compile store records with the default configuration.
    #[must_use]
    pub fn from_records(records: &[RuleRecord]) -> Self {
        let config = EngineConfig::default();
        let rules = crate::compile::compile(records, &config);
        Self { rules, config }
    }

    /// Load a JSON array of rule records, as exported by the rule store.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Json`](crate::PricingError::Json) when the
    /// document is not an array of records.
    pub fn from_json(input: &str) -> Result<Self, crate::PricingError> {
        let records: Vec<RuleRecord> = serde_json::from_str(input)?;
        Ok(Self::from_records(&records))
    }

    /// Parse a rule file and compile it with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Parse`](crate::PricingError::Parse) on syntax errors.
    pub fn from_dsl(input: &str) -> Result<Self, crate::PricingError> {
        Self::from_dsl_with_config(input, EngineConfig::default())
    }

    /// Parse a rule file and compile it against the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError`](crate::PricingError) on parse or configuration failure.
    pub fn from_dsl_with_config(
        input: &str,
        config: EngineConfig,
    ) -> Result<Self, crate::PricingError> {
        let parsed = crate::parse::parse(input)?;
        let engine = PricingEngineBuilder::new()
            .config(config)
            .records(parsed.records)
            .build()?;
        Ok(engine)
    }

    /// Read a rule file and compile it.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError`](crate::PricingError) on I/O or parse failure.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::PricingError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_dsl(&input)
    }

    /// Price one product.
    ///
    /// Never fails: missing fields, unknown operators and absent customers
    /// only make rules not apply.
    pub fn calculate_price(
        &self,
        product: &Product,
        customer: Option<&Customer>,
        quantity: u32,
        context: &Attributes,
    ) -> PriceResult {
        let ctx = EvaluationContext::new(product, customer, quantity, context);
        crate::evaluate::evaluate(&self.rules, &ctx)
    }

    /// Same as [`calculate_price`](Self::calculate_price), plus the outcome
    /// of every rule and the evaluation time.
    pub fn explain(
        &self,
        product: &Product,
        customer: Option<&Customer>,
        quantity: u32,
        context: &Attributes,
    ) -> PricingReport {
        let ctx = EvaluationContext::new(product, customer, quantity, context);
        crate::evaluate::evaluate_detailed(&self.rules, &ctx)
    }

    /// Price each `(product, quantity)` pair independently. Output order
    /// matches input order.
    #[must_use]
    pub fn calculate_bulk(
        &self,
        items: &[(Product, u32)],
        customer: Option<&Customer>,
        context: &Attributes,
    ) -> Vec<PriceResult> {
        items
            .iter()
            .map(|(product, quantity)| self.calculate_price(product, customer, *quantity, context))
            .collect()
    }

    /// [`calculate_bulk`](Self::calculate_bulk) split across `workers` scoped
    /// threads. Output order matches input order.
    #[must_use]
    pub fn calculate_bulk_parallel(
        &self,
        items: &[(Product, u32)],
        customer: Option<&Customer>,
        context: &Attributes,
        workers: usize,
    ) -> Vec<PriceResult> {
        let workers = workers.max(1);
        if workers == 1 || items.len() < 2 {
            return self.calculate_bulk(items, customer, context);
        }

        let chunk_size = items.len().div_ceil(workers);
        std::thread::scope(|scope| {
            let handles: Vec<_> = items
                .chunks(chunk_size)
                .map(|chunk| scope.spawn(move || self.calculate_bulk(chunk, customer, context)))
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
                })
                .collect()
        })
    }

    /// Unit price table for the configured display tiers, each priced at the
    /// tier's minimum quantity.
    #[must_use]
    pub fn tiered_pricing(
        &self,
        product: &Product,
        customer: Option<&Customer>,
        context: &Attributes,
    ) -> Vec<TierPrice> {
        self.config
            .display_tiers
            .iter()
            .map(|tier| {
                let result = self.calculate_price(product, customer, tier.min, context);
                TierPrice {
                    label: tier.label.clone(),
                    min_quantity: tier.min,
                    max_quantity: tier.max,
                    unit_price: result.final_price(),
                    discount_percentage: result.discount_percentage(),
                }
            })
            .collect()
    }

    /// The cheapest result across candidate contexts.
    ///
    /// Ties go to the earliest candidate. Returns `None` for no candidates.
    #[must_use]
    pub fn best_price(
        &self,
        product: &Product,
        quantity: u32,
        candidates: &[PricingCandidate],
    ) -> Option<PriceResult> {
        let mut best: Option<PriceResult> = None;
        for candidate in candidates {
            let result = self.calculate_price(
                product,
                candidate.customer.as_ref(),
                quantity,
                &candidate.context,
            );
            let cheaper = best
                .as_ref()
                .map_or(true, |current| result.final_price() < current.final_price());
            if cheaper {
                best = Some(result);
            }
        }
        best
    }

    /// Rule names in evaluation order.
    #[must_use]
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(PricingRule::name).collect()
    }

    #[must_use]
    pub fn rules(&self) -> &[PricingRule] {
        &self.rules
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Display for PricingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let exclusive = self.rules.iter().filter(|r| r.is_exclusive()).count();
        write!(
            f,
            "PricingEngine({} rules, {} exclusive, {} volume tiers)",
            self.rules.len(),
            exclusive,
            self.config.volume_tiers.as_slice().len(),
        )
    }
}
