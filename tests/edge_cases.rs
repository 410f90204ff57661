use rust_decimal::Decimal;
use tariff::{
    field, Adjustment, AdjustmentKind, Attributes, ConditionRecord, ConfigError, Customer,
    EngineConfig, Operator, PricingEngine, Product, RuleKind, RuleRecord, Value, VolumeTier,
    VolumeTiers,
};

fn d(v: i64) -> Decimal {
    Decimal::from(v)
}

fn promo_when(condition: ConditionRecord) -> PricingEngine {
    PricingEngine::builder()
        .rule("promo", |r| r.when(condition).then(Adjustment::subtract(d(10))))
        .build()
        .unwrap()
}

fn applies(
    engine: &PricingEngine,
    product: &Product,
    customer: Option<&Customer>,
    attributes: &Attributes,
) -> bool {
    !engine
        .calculate_price(product, customer, 1, attributes)
        .applied_rules()
        .is_empty()
}

#[test]
fn empty_engine_keeps_base_price() {
    let engine = PricingEngine::from_records(&[]);
    let result = engine.calculate_price(&Product::new(1, d(100)), None, 3, &Attributes::new());
    assert_eq!(result.final_price(), d(100));
    assert_eq!(result.discount(), Decimal::ZERO);
    assert_eq!(result.discount_percentage(), Decimal::ZERO);
    assert_eq!(result.total_price(), d(300));
    assert!(result.applied_rules().is_empty());
}

#[test]
fn zero_quantity_is_treated_as_one() {
    let engine = promo_when(field("quantity").eq(1_i64));
    let result = engine.calculate_price(&Product::new(1, d(100)), None, 0, &Attributes::new());
    assert_eq!(result.quantity(), 1);
    assert_eq!(result.final_price(), d(90));
}

#[test]
fn zero_base_price_has_zero_discount_percentage() {
    let engine = PricingEngine::builder()
        .rule("fee", |r| r.then(Adjustment::fixed_price(d(5))))
        .build()
        .unwrap();
    let result = engine.calculate_price(&Product::new(1, Decimal::ZERO), None, 1, &Attributes::new());
    assert_eq!(result.final_price(), d(5));
    assert_eq!(result.discount(), d(-5));
    assert_eq!(result.discount_percentage(), Decimal::ZERO);
}

#[test]
fn absent_customer_field() {
    let product = Product::new(1, d(100));
    let none = Attributes::new();

    let eq = promo_when(field("customer.group_code").eq("vip"));
    assert!(!applies(&eq, &product, None, &none));

    // Negative operators hold when the field is absent.
    let neq = promo_when(field("customer.group_code").neq("vip"));
    assert!(applies(&neq, &product, None, &none));

    let not_in = promo_when(field("customer.group_code").not_in(vec!["vip", "staff"]));
    assert!(applies(&not_in, &product, None, &none));

    let gt = promo_when(field("customer.id").gt(0_i64));
    assert!(!applies(&gt, &product, None, &none));
}

#[test]
fn customer_without_group() {
    let product = Product::new(1, d(100));
    let guest = Customer::new(5);
    let engine = promo_when(field("customer.group_id").eq(1_i64));
    assert!(!applies(&engine, &product, Some(&guest), &Attributes::new()));

    let engine = promo_when(field("customer.id").eq(5_i64));
    assert!(applies(&engine, &product, Some(&guest), &Attributes::new()));
}

#[test]
fn absent_product_category() {
    let engine = promo_when(field("product.category_id").not_in(vec![3_i64]));
    let product = Product::new(1, d(100));
    assert!(applies(&engine, &product, None, &Attributes::new()));

    let engine = promo_when(field("product.category_id").is_in(vec![3_i64]));
    assert!(!applies(&engine, &product, None, &Attributes::new()));
}

#[test]
fn mismatched_types_never_equal() {
    let product = Product::new(1, d(100)).with_category(3);
    let none = Attributes::new();

    let eq = promo_when(field("product.category_id").eq(true));
    assert!(!applies(&eq, &product, None, &none));

    let neq = promo_when(field("product.category_id").neq(true));
    assert!(applies(&neq, &product, None, &none));

    let gt = promo_when(field("product.category_id").gt("abc"));
    assert!(!applies(&gt, &product, None, &none));
}

#[test]
fn numeric_strings_compare_numerically() {
    let product = Product::new(1, d(100));
    let attrs = Attributes::new().set("loyalty_points", "1500");

    let engine = promo_when(field("loyalty_points").gte(1000_i64));
    assert!(applies(&engine, &product, None, &attrs));

    let engine = promo_when(field("loyalty_points").eq(1500_i64));
    assert!(applies(&engine, &product, None, &attrs));
}

#[test]
fn price_compares_against_integers_and_decimals() {
    let product = Product::new(1, Decimal::new(1999, 2));
    let none = Attributes::new();

    assert!(applies(&promo_when(field("product.price").lt(20_i64)), &product, None, &none));
    assert!(applies(
        &promo_when(field("product.price").eq(Decimal::new(19990, 3))),
        &product,
        None,
        &none
    ));
}

#[test]
fn in_with_scalar_is_single_element_set() {
    let product = Product::new(1, d(100)).with_category(4);
    let engine = promo_when(field("product.category_id").is_in(4_i64));
    assert!(applies(&engine, &product, None, &Attributes::new()));

    let engine = promo_when(field("product.category_id").not_in(4_i64));
    assert!(!applies(&engine, &product, None, &Attributes::new()));
}

#[test]
fn contains_on_strings_and_lists() {
    let product = Product::new(1, d(100));
    let attrs = Attributes::new()
        .set("coupon", "SUMMER-SALE")
        .set("tags", vec!["new", "eco"]);

    assert!(applies(&promo_when(field("coupon").contains("SALE")), &product, None, &attrs));
    assert!(!applies(&promo_when(field("coupon").contains("sale")), &product, None, &attrs));
    assert!(applies(&promo_when(field("tags").contains("eco")), &product, None, &attrs));
    assert!(applies(&promo_when(field("tags").not_contains("used")), &product, None, &attrs));
    assert!(!applies(&promo_when(field("missing").contains("x")), &product, None, &attrs));
    assert!(!applies(&promo_when(field("missing").not_contains("x")), &product, None, &attrs));
}

#[test]
fn extension_fields_accept_context_prefix() {
    let product = Product::new(1, d(100));
    let attrs = Attributes::new().set("channel", "web");
    assert!(applies(&promo_when(field("context.channel").eq("web")), &product, None, &attrs));
    assert!(applies(&promo_when(field("channel").eq("web")), &product, None, &attrs));
}

#[test]
fn nested_extension_attributes() {
    let product = Product::new(1, d(100));
    let attrs = Attributes::new().set("campaign.code", "SPRING");
    assert!(applies(&promo_when(field("campaign.code").eq("SPRING")), &product, None, &attrs));
}

#[test]
fn unknown_operator_never_matches() {
    let record = RuleRecord {
        conditions: vec![ConditionRecord {
            field: "quantity".into(),
            operator: Operator::from_name("between"),
            value: Value::Int(1),
        }],
        adjustment: Some(Adjustment::subtract(d(10))),
        ..RuleRecord::new("broken")
    };
    let engine = PricingEngine::from_records(&[record]);
    assert_eq!(engine.len(), 1);
    assert!(!applies(&engine, &Product::new(1, d(100)), None, &Attributes::new()));
}

#[test]
fn unknown_adjustment_kind_is_noop() {
    let record = RuleRecord {
        adjustment: Some(Adjustment::new(
            AdjustmentKind::Unknown("halve".into()),
            d(2),
        )),
        ..RuleRecord::new("odd")
    };
    let engine = PricingEngine::from_records(&[record]);
    let result = engine.calculate_price(&Product::new(1, d(100)), None, 1, &Attributes::new());
    assert_eq!(result.final_price(), d(100));
}

#[test]
fn unknown_rule_kind_is_dropped() {
    let records = vec![
        RuleRecord {
            kind: RuleKind::from_name("App\\Pricing\\SeasonalRule"),
            ..RuleRecord::new("seasonal")
        },
        RuleRecord {
            adjustment: Some(Adjustment::subtract(d(1))),
            ..RuleRecord::new("kept")
        },
    ];
    let engine = PricingEngine::from_records(&records);
    assert_eq!(engine.rule_names(), vec!["kept"]);
}

#[test]
fn multiply_overflow_leaves_price_unchanged() {
    let engine = PricingEngine::builder()
        .rule("huge", |r| r.then(Adjustment::multiply(Decimal::MAX)))
        .build()
        .unwrap();
    let result = engine.calculate_price(&Product::new(1, d(100)), None, 1, &Attributes::new());
    assert_eq!(result.final_price(), d(100));
}

#[test]
fn segment_lookup_is_case_insensitive() {
    let engine = PricingEngine::builder()
        .rule("segment", |r| r.customer_segment())
        .build()
        .unwrap();
    let customer = Customer::new(1).with_group_code("WholeSale");
    let result = engine.calculate_price(
        &Product::new(1, d(100)),
        Some(&customer),
        1,
        &Attributes::new(),
    );
    assert_eq!(result.final_price(), d(80));
}

#[test]
fn segment_rule_skips_unknown_groups() {
    let engine = PricingEngine::builder()
        .rule("segment", |r| r.customer_segment())
        .build()
        .unwrap();
    let customer = Customer::new(1).with_group_code("staff");
    let result = engine.calculate_price(
        &Product::new(1, d(100)),
        Some(&customer),
        1,
        &Attributes::new(),
    );
    assert!(result.applied_rules().is_empty());
}

#[test]
fn builtin_rule_with_extra_condition() {
    let engine = PricingEngine::builder()
        .rule("bulk_web", |r| {
            r.volume_discount().when(field("channel").eq("web"))
        })
        .build()
        .unwrap();
    let product = Product::new(1, d(100));
    let web = Attributes::new().set("channel", "web");
    let store = Attributes::new().set("channel", "store");
    assert_eq!(engine.calculate_price(&product, None, 50, &web).final_price(), d(90));
    assert_eq!(engine.calculate_price(&product, None, 50, &store).final_price(), d(100));
}

#[test]
fn bounded_last_volume_tier_rejected_at_build() {
    let config = EngineConfig {
        volume_tiers: VolumeTiers::new(vec![
            VolumeTier::new(10, Some(49), d(5)),
            VolumeTier::new(50, Some(99), d(10)),
        ]),
        ..EngineConfig::default()
    };
    let err = PricingEngine::builder()
        .config(config)
        .rule("bulk", |r| r.volume_discount())
        .build()
        .unwrap_err();
    assert_eq!(err, ConfigError::LastTierBounded { index: 1 });
}

#[test]
fn same_priority_keeps_definition_order() {
    let engine = PricingEngine::builder()
        .rule("fix", |r| r.priority(5).then(Adjustment::fixed_price(d(50))))
        .rule("minus", |r| r.priority(5).then(Adjustment::subtract(d(10))))
        .build()
        .unwrap();
    let result = engine.calculate_price(&Product::new(1, d(100)), None, 1, &Attributes::new());
    assert_eq!(result.final_price(), d(40));
}

#[test]
fn negative_priorities_run_last() {
    let engine = PricingEngine::builder()
        .rule("late", |r| r.priority(-1).then(Adjustment::fixed_price(d(1))))
        .rule("default", |r| r.then(Adjustment::subtract(d(10))))
        .build()
        .unwrap();
    assert_eq!(engine.rule_names(), vec!["default", "late"]);
}

#[test]
fn result_serializes_with_derived_fields() {
    let engine = PricingEngine::builder()
        .rule("promo", |r| r.then(Adjustment::percentage_off(d(25))))
        .build()
        .unwrap();
    let result = engine.calculate_price(&Product::new(1, d(40)), None, 2, &Attributes::new());
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["quantity"], 2);
    assert_eq!(json["applied_rules"][0]["rule"], "promo");
    assert!(json.get("total_price").is_some());
    assert!(json.get("discount_percentage").is_some());
}
