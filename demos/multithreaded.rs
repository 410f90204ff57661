use std::sync::Arc;
use std::thread;

use rust_decimal::Decimal;
use tariff::{field, Adjustment, Attributes, Customer, EngineHandle, PricingEngine, Product};

fn build(extra_off: i64) -> PricingEngine {
    PricingEngine::builder()
        .rule("segment", |r| r.priority(20).customer_segment())
        .rule("bulk", |r| r.priority(10).volume_discount())
        .rule("weekend", |r| {
            r.when(field("weekend").eq(true))
                .then(Adjustment::subtract(Decimal::from(extra_off)))
        })
        .build()
        .expect("failed to build pricing engine")
}

fn main() {
    let handle = Arc::new(EngineHandle::new(build(1)));
    let product = Product::new(1, Decimal::from(100));

    let workers: Vec<_> = ["wholesale", "vip", "retail", "guest"]
        .into_iter()
        .enumerate()
        .map(|(i, group)| {
            let handle = Arc::clone(&handle);
            let product = product.clone();
            thread::spawn(move || {
                let customer = Customer::new(i as i64).with_group_code(group);
                let attrs = Attributes::new().set("weekend", true);
                let engine = handle.load();
                let result = engine.calculate_price(&product, Some(&customer), 25, &attrs);
                format!("Thread {i} ({group}): {result}")
            })
        })
        .collect();

    for worker in workers {
        println!("{}", worker.join().expect("worker panicked"));
    }

    // Swap in new rules; later loads see them.
    handle.replace(build(5));
    let customer = Customer::new(9).with_group_code("vip");
    let attrs = Attributes::new().set("weekend", true);
    let result = handle.load().calculate_price(&product, Some(&customer), 25, &attrs);
    println!("After reload (vip): {result}");

    // Bulk pricing across scoped worker threads keeps input order.
    let items: Vec<(Product, u32)> = (1..=6)
        .map(|i| (Product::new(i, Decimal::from(10 * i)), (i * 20) as u32))
        .collect();
    for result in handle.load().calculate_bulk_parallel(&items, None, &attrs, 3) {
        println!("  {result}");
    }
}
