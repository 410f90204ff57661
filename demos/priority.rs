use rust_decimal::Decimal;
use tariff::{field, Adjustment, Attributes, Customer, PricingEngine, Product};

fn main() {
    // A flash sale on the app beats every other discount. Without it, the
    // segment and volume discounts compound.
    let engine = PricingEngine::builder()
        .rule("flash_sale", |r| {
            r.priority(100)
                .exclusive()
                .when(field("channel").eq("app"))
                .then(Adjustment::percentage_off(Decimal::from(40)))
        })
        .rule("segment", |r| r.priority(20).customer_segment())
        .rule("bulk", |r| r.priority(10).volume_discount())
        .build()
        .expect("failed to build pricing engine");

    let product = Product::new(1, Decimal::from(100));
    let vip = Customer::new(1).with_group_code("vip");

    let app = Attributes::new().set("channel", "app");
    let result = engine.calculate_price(&product, Some(&vip), 50, &app);
    println!("VIP on the app, 50 units: {result}");

    let web = Attributes::new().set("channel", "web");
    let result = engine.calculate_price(&product, Some(&vip), 50, &web);
    println!("VIP on the web, 50 units: {result}");

    let result = engine.calculate_price(&product, None, 1, &web);
    println!("Guest on the web, 1 unit: {result}");
}
