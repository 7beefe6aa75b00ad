//! End-to-end scenarios against a single Work Center with `Mon 08-17` and
//! `Tue 08-17` shifts, run through the public `reflow`/`verify` surface.

use chrono::{DateTime, TimeZone, Utc};

use wo_reflow::checker::verify;
use wo_reflow::domain::{ViolationKind, WorkCenter, WorkOrder};
use wo_reflow::error::EngineError;
use wo_reflow::reflow::reflow;

fn utc(y: i32, m: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, mi, 0).unwrap()
}

fn center() -> WorkCenter {
    WorkCenter::new("wc-1", "Line 1").with_shift(1, 8, 17).with_shift(2, 8, 17)
}

#[test]
fn circular_dependency_refuses_to_reflow() {
    let a = WorkOrder::new("a", "A", "wc-1", utc(2026, 2, 9, 8, 0), utc(2026, 2, 9, 9, 0), 60).depending_on("b");
    let b = WorkOrder::new("b", "B", "wc-1", utc(2026, 2, 9, 9, 0), utc(2026, 2, 9, 10, 0), 60).depending_on("a");

    let violations = verify(&[a.clone(), b.clone()], &[center()], None);
    let fatal = violations
        .iter()
        .find(|v| v.kind == ViolationKind::DependencyError && v.is_fatal)
        .expect("fatal dependency cycle expected");
    assert!(fatal.message.contains('a') && fatal.message.contains('b'));

    let err = reflow(&[a, b], &[center()]).unwrap_err();
    assert!(matches!(err, EngineError::NotFixable(_)));
}

#[test]
fn fixed_vs_fixed_overlap_refuses_to_reflow() {
    let a = WorkOrder::maintenance("a", "A", "wc-1", utc(2026, 2, 9, 8, 0), utc(2026, 2, 9, 10, 0));
    let b = WorkOrder::maintenance("b", "B", "wc-1", utc(2026, 2, 9, 9, 0), utc(2026, 2, 9, 11, 0));

    let violations = verify(&[a.clone(), b.clone()], &[center()], None);
    assert!(violations
        .iter()
        .any(|v| v.kind == ViolationKind::MaintenanceCollision && v.is_fatal));

    let err = reflow(&[a, b], &[center()]).unwrap_err();
    assert!(matches!(err, EngineError::NotFixable(_)));
}

#[test]
fn production_order_is_routed_around_a_maintenance_sandwich() {
    let wc = center().with_maintenance_window(utc(2026, 2, 9, 8, 0), utc(2026, 2, 9, 9, 0));
    let fixed = WorkOrder::maintenance("m", "M", "wc-1", utc(2026, 2, 9, 9, 0), utc(2026, 2, 9, 10, 0));
    let production = WorkOrder::new("p", "P", "wc-1", utc(2026, 2, 9, 8, 0), utc(2026, 2, 9, 9, 0), 60);

    let result = reflow(&[fixed, production], &[wc.clone()]).unwrap();
    let out = result.updated_work_orders.iter().find(|o| o.id == "p").unwrap();
    assert_eq!(out.start, utc(2026, 2, 9, 10, 0));
    assert_eq!(out.end, utc(2026, 2, 9, 11, 0));
    assert_eq!(result.changes.len(), 1);
    assert!(result.explanation[0].contains("MAINTENANCE_COLLISION"));
}

#[test]
fn order_starting_before_shift_is_pulled_forward() {
    let wo = WorkOrder::new("a", "A", "wc-1", utc(2026, 2, 9, 6, 0), utc(2026, 2, 9, 9, 0), 60);

    let violations = verify(&[wo.clone()], &[center()], None);
    assert!(violations.iter().any(|v| v.message == "Invalid Start"));
    assert!(violations.iter().any(|v| v.message == "Total work time mismatch"));

    let result = reflow(&[wo], &[center()]).unwrap();
    let out = &result.updated_work_orders[0];
    assert_eq!(out.start, utc(2026, 2, 9, 8, 0));
    assert_eq!(out.end, utc(2026, 2, 9, 9, 0));
}

#[test]
fn order_ending_after_shift_is_pulled_back() {
    let wo = WorkOrder::new("a", "A", "wc-1", utc(2026, 2, 9, 15, 0), utc(2026, 2, 9, 19, 0), 120);

    let violations = verify(&[wo.clone()], &[center()], None);
    assert!(violations.iter().any(|v| v.message == "Invalid End"));
    assert!(violations.iter().any(|v| v.message == "Total work time mismatch"));

    let result = reflow(&[wo], &[center()]).unwrap();
    let out = &result.updated_work_orders[0];
    assert_eq!(out.start, utc(2026, 2, 9, 15, 0));
    assert_eq!(out.end, utc(2026, 2, 9, 17, 0));
}

#[test]
fn insufficient_window_extends_the_order() {
    let wo = WorkOrder::new("a", "A", "wc-1", utc(2026, 2, 9, 8, 0), utc(2026, 2, 9, 9, 0), 120);

    let violations = verify(&[wo.clone()], &[center()], None);
    assert!(violations.iter().any(|v| v.message == "Total work time mismatch"));

    let result = reflow(&[wo], &[center()]).unwrap();
    let out = &result.updated_work_orders[0];
    assert_eq!(out.start, utc(2026, 2, 9, 8, 0));
    assert_eq!(out.end, utc(2026, 2, 9, 10, 0));
}

#[test]
fn three_colliding_orders_cascade_one_hour_apart() {
    let a = WorkOrder::new("a", "A", "wc-1", utc(2026, 2, 9, 8, 0), utc(2026, 2, 9, 9, 0), 60);
    let b = WorkOrder::new("b", "B", "wc-1", utc(2026, 2, 9, 8, 0), utc(2026, 2, 9, 9, 0), 60);
    let c = WorkOrder::new("c", "C", "wc-1", utc(2026, 2, 9, 8, 0), utc(2026, 2, 9, 9, 0), 60);

    let result = reflow(&[a, b, c], &[center()]).unwrap();
    assert!(verify(&result.updated_work_orders, &[center()], None).is_empty());
    assert_eq!(result.changes.len(), 2);

    let mut out = result.updated_work_orders.clone();
    out.sort_by_key(|o| o.start);
    assert_eq!(out[0].start, utc(2026, 2, 9, 8, 0));
    assert_eq!(out[1].start, utc(2026, 2, 9, 9, 0));
    assert_eq!(out[2].start, utc(2026, 2, 9, 10, 0));

    assert!(result
        .explanation
        .iter()
        .any(|e| e.contains("Cascading") || e.contains("Collision with previous order")));
}

#[test]
fn multi_parent_child_waits_for_the_later_parent() {
    let parent_a = WorkOrder::new("a", "A", "wc-1", utc(2026, 2, 9, 8, 0), utc(2026, 2, 9, 10, 0), 120);
    let parent_b = WorkOrder::new("b", "B", "wc-1", utc(2026, 2, 9, 10, 0), utc(2026, 2, 9, 12, 0), 120);
    let child = WorkOrder::new("c", "C", "wc-1", utc(2026, 2, 9, 8, 0), utc(2026, 2, 9, 9, 0), 60)
        .depending_on("a")
        .depending_on("b");

    let result = reflow(&[parent_a, parent_b, child], &[center()]).unwrap();
    assert!(verify(&result.updated_work_orders, &[center()], None).is_empty());
    let out = result.updated_work_orders.iter().find(|o| o.id == "c").unwrap();
    assert!(out.start >= utc(2026, 2, 9, 12, 0));
}
