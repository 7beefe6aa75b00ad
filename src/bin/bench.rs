//! Benchmark for the reflow engine.
//!
//! Run with: cargo run --release --bin bench

use std::time::Instant;

use wo_reflow::{checker, demo_data, reflow};

fn main() {
    let (orders, centers) = demo_data::generate(demo_data::DemoData::Large);
    let n_orders = orders.len();
    let n_centers = centers.len();

    println!("Benchmark: Reflow Engine");
    println!("  Work orders: {}", n_orders);
    println!("  Work centers: {}", n_centers);
    println!();

    let verify_start = Instant::now();
    let violations = checker::verify(&orders, &centers, None);
    println!("Initial violations: {} ({:?})", violations.len(), verify_start.elapsed());
    println!();

    let reflow_start = Instant::now();
    let result = reflow::reflow(&orders, &centers).expect("demo data is always fixable");
    let elapsed = reflow_start.elapsed();

    println!("Results:");
    println!("  Changes: {}", result.changes.len());
    println!("  Time: {:.2?}", elapsed);
    println!(
        "  Orders/sec: {:.0}",
        n_orders as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );

    let residual = checker::verify(&result.updated_work_orders, &centers, None);
    println!("  Residual violations: {}", residual.len());
}
