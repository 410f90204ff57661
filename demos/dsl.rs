use rust_decimal::Decimal;
use tariff::{Attributes, Customer, PricingEngine, Product};

fn main() {
    let rules = r#"
# Wholesale customers ordering at least 10 units get 20% and nothing else.
rule wholesale_discount (priority 20, exclusive):
    when customer.group_code == "wholesale" and quantity >= 10
    then percentage_off 20

rule bulk (priority 10): volume_discount
rule vip (priority 5): customer_segment

rule clearance (priority 1):
    when product.category_id in [7, 8]
    then fixed_price 9.99
"#;

    let engine = PricingEngine::from_dsl(rules).expect("failed to parse rules");
    println!("{engine}");
    println!("Evaluation order: {:?}", engine.rule_names());

    let product = Product::new(1, Decimal::from(100)).with_category(8);
    let customer = Customer::new(1).with_group_code("vip");

    let result = engine.calculate_price(&product, Some(&customer), 12, &Attributes::new());
    println!("Result: {result}");

    println!();
    println!("Tier preview:");
    for tier in engine.tiered_pricing(&product, Some(&customer), &Attributes::new()) {
        println!("  {:>6}  {}", tier.label, tier.unit_price);
    }
}
