use rust_decimal::Decimal;
use tariff::{field, Adjustment, Attributes, Customer, PricingEngine, Product};

fn main() {
    let engine = PricingEngine::builder()
        .rule("staff_price", |r| {
            r.priority(100)
                .exclusive()
                .when(field("customer.group_code").eq("staff"))
                .then(Adjustment::multiply(Decimal::new(6, 1)))
        })
        .rule("segment", |r| r.priority(20).customer_segment())
        .rule("bulk", |r| r.priority(10).volume_discount())
        .rule("coupon", |r| {
            r.priority(5)
                .when(field("coupon").eq("WELCOME5"))
                .then(Adjustment::subtract(Decimal::from(5)))
        })
        .build()
        .expect("failed to build pricing engine");

    let product = Product::new(1, Decimal::new(4999, 2));
    let customer = Customer::new(7).with_group_code("retail");
    let attrs = Attributes::new().set("coupon", "WELCOME5");

    let report = engine.explain(&product, Some(&customer), 12, &attrs);

    println!("{report}");
    println!();
    for (rule, outcome) in report.outcomes() {
        println!("  {rule:<12} {outcome}");
    }
    println!("Duration: {:?}", report.duration());
    println!(
        "{}",
        serde_json::to_string_pretty(report.result()).expect("result serializes")
    );
}
