use rust_decimal::Decimal;
use tariff::{field, Adjustment, Attributes, Customer, PricingEngine, Product};

fn main() {
    // Define rules
    let engine = PricingEngine::builder()
        .rule("wholesale", |r| {
            r.priority(20)
                .when(field("customer.group_code").eq("wholesale"))
                .then(Adjustment::percentage_off(Decimal::from(20)))
        })
        .rule("bulk", |r| r.priority(10).volume_discount())
        .build()
        .expect("failed to build pricing engine");

    println!("{engine}");

    // Price one product for one customer
    let product = Product::new(1, Decimal::from(100));
    let customer = Customer::new(42).with_group(3, "wholesale");

    let result = engine.calculate_price(&product, Some(&customer), 50, &Attributes::new());
    println!("Result: {result}");
    println!(
        "Unit price {} (-{}%), total {}",
        result.final_price(),
        result.discount_percentage(),
        result.total_price()
    );
}
