//! Constraint Checker: classifies an arbitrary schedule into zero or more
//! typed violations and flags fatal states (dependency cycles, fixed-vs-fixed
//! overlap). `verify` never fails; it only reports.

use std::collections::{HashMap, HashSet};

use crate::calendar::{self, ShiftEdge};
use crate::domain::{Violation, ViolationKind, WorkCenter, WorkOrder};

/// Runs all seven passes described in the design and returns every
/// violation found, in pass order. Pass order does not change semantics
/// but does make the output deterministic and test-reproducible.
pub fn verify(orders: &[WorkOrder], centers: &[WorkCenter], originals: Option<&[WorkOrder]>) -> Vec<Violation> {
    let center_by_id: HashMap<&str, &WorkCenter> = centers.iter().map(|c| (c.id.as_str(), c)).collect();
    let order_by_id: HashMap<&str, &WorkOrder> = orders.iter().map(|o| (o.id.as_str(), o)).collect();

    let mut violations = Vec::new();

    maintenance_window_collisions(orders, &center_by_id, &mut violations);
    fixed_order_displacement(orders, originals, &mut violations);
    overlaps(orders, &mut violations);
    shift_adherence(orders, &center_by_id, &mut violations);
    dependency_ordering(orders, &order_by_id, &mut violations);
    fatal_fixed_vs_fixed_overlap(orders, &mut violations);
    fatal_dependency_cycles(orders, &mut violations);

    violations
}

fn maintenance_window_collisions(
    orders: &[WorkOrder],
    center_by_id: &HashMap<&str, &WorkCenter>,
    violations: &mut Vec<Violation>,
) {
    for order in orders {
        if order.is_maintenance {
            continue;
        }
        let Some(center) = center_by_id.get(order.work_center_id.as_str()) else {
            continue;
        };
        for window in &center.maintenance_windows {
            if calendar::intervals_overlap(order.start, order.end, window.start, window.end) {
                violations.push(Violation::new(
                    &order.id,
                    ViolationKind::MaintenanceCollision,
                    format!("Work order {} collides with a maintenance window", order.number),
                ));
                break;
            }
        }
    }
}

fn fixed_order_displacement(orders: &[WorkOrder], originals: Option<&[WorkOrder]>, violations: &mut Vec<Violation>) {
    let Some(originals) = originals else {
        return;
    };
    let original_by_id: HashMap<&str, &WorkOrder> = originals.iter().map(|o| (o.id.as_str(), o)).collect();

    for order in orders {
        if !order.is_maintenance {
            continue;
        }
        if let Some(original) = original_by_id.get(order.id.as_str()) {
            if original.start != order.start {
                violations.push(Violation::new(
                    &order.id,
                    ViolationKind::FixedOrderMoved,
                    format!("Fixed order {} was moved from its original start", order.number),
                ));
            }
        }
    }
}

fn overlaps(orders: &[WorkOrder], violations: &mut Vec<Violation>) {
    for (_, group) in group_by_work_center(orders) {
        let mut sorted = group;
        sorted.sort_by_key(|o| o.start);
        for pair in sorted.windows(2) {
            let (current, next) = (pair[0], pair[1]);
            if next.start < current.end {
                violations.push(Violation::new(
                    &next.id,
                    ViolationKind::Overlap,
                    format!(
                        "Work order {} starts before work order {} ends",
                        next.number, current.number
                    ),
                ));
            }
        }
    }
}

fn shift_adherence(orders: &[WorkOrder], center_by_id: &HashMap<&str, &WorkCenter>, violations: &mut Vec<Violation>) {
    for order in orders {
        if order.is_maintenance {
            continue;
        }
        let Some(center) = center_by_id.get(order.work_center_id.as_str()) else {
            continue;
        };

        let elapsed = (order.end - order.start).num_minutes();
        if (elapsed - order.duration_minutes).abs() > 1 {
            violations.push(Violation::new(
                &order.id,
                ViolationKind::OutsideShift,
                "Total work time mismatch",
            ));
        }
        if !calendar::is_time_in_shift(order.start, &center.shifts, ShiftEdge::Start) {
            violations.push(Violation::new(&order.id, ViolationKind::OutsideShift, "Invalid Start"));
        }
        if !calendar::is_time_in_shift(order.end, &center.shifts, ShiftEdge::End) {
            violations.push(Violation::new(&order.id, ViolationKind::OutsideShift, "Invalid End"));
        }
    }
}

fn dependency_ordering(orders: &[WorkOrder], order_by_id: &HashMap<&str, &WorkOrder>, violations: &mut Vec<Violation>) {
    for child in orders {
        for parent_id in &child.depends_on {
            let Some(parent) = order_by_id.get(parent_id.as_str()) else {
                continue;
            };
            if child.start < parent.end {
                violations.push(Violation::new(
                    &child.id,
                    ViolationKind::DependencyError,
                    format!(
                        "Work order {} starts before its dependency {} ends",
                        child.number, parent.number
                    ),
                ));
            }
        }
    }
}

fn fatal_fixed_vs_fixed_overlap(orders: &[WorkOrder], violations: &mut Vec<Violation>) {
    for (_, group) in group_by_work_center(orders) {
        let mut fixed: Vec<&WorkOrder> = group.into_iter().filter(|o| o.is_maintenance).collect();
        fixed.sort_by_key(|o| o.start);
        for pair in fixed.windows(2) {
            let (current, next) = (pair[0], pair[1]);
            if next.start < current.end {
                violations.push(
                    Violation::new(
                        &next.id,
                        ViolationKind::MaintenanceCollision,
                        format!(
                            "Fixed orders {} and {} overlap and cannot both be honored",
                            current.number, next.number
                        ),
                    )
                    .fatal(),
                );
            }
        }
    }
}

/// DFS cycle detection over the dependency graph (`child -> depends_on -> parent`
/// edges). Each work order is a DFS root at most once; unresolvable parent ids
/// are not traversed.
fn fatal_dependency_cycles(orders: &[WorkOrder], violations: &mut Vec<Violation>) {
    let order_by_id: HashMap<&str, &WorkOrder> = orders.iter().map(|o| (o.id.as_str(), o)).collect();
    let mut visited: HashSet<&str> = HashSet::new();

    for order in orders {
        if visited.contains(order.id.as_str()) {
            continue;
        }
        let mut stack: Vec<&str> = Vec::new();
        if let Some(cycle) = dfs_find_cycle(order.id.as_str(), &order_by_id, &mut visited, &mut stack) {
            violations.push(
                Violation::new(
                    order.id.as_str(),
                    ViolationKind::DependencyError,
                    format!("Circular dependency detected: {}", cycle.join(" -> ")),
                )
                .fatal(),
            );
        }
    }
}

fn dfs_find_cycle<'a>(
    id: &'a str,
    order_by_id: &HashMap<&'a str, &'a WorkOrder>,
    visited: &mut HashSet<&'a str>,
    stack: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    if let Some(pos) = stack.iter().position(|&s| s == id) {
        let mut cycle: Vec<String> = stack[pos..].iter().map(|s| s.to_string()).collect();
        cycle.push(id.to_string());
        return Some(cycle);
    }
    if visited.contains(id) {
        return None;
    }

    stack.push(id);
    let result = if let Some(order) = order_by_id.get(id) {
        let mut found = None;
        for parent_id in &order.depends_on {
            if !order_by_id.contains_key(parent_id.as_str()) {
                continue;
            }
            if let Some(cycle) = dfs_find_cycle(parent_id.as_str(), order_by_id, visited, stack) {
                found = Some(cycle);
                break;
            }
        }
        found
    } else {
        None
    };
    stack.pop();
    visited.insert(id);
    result
}

fn group_by_work_center(orders: &[WorkOrder]) -> Vec<(&str, Vec<&WorkOrder>)> {
    let mut groups: Vec<(&str, Vec<&WorkOrder>)> = Vec::new();
    for order in orders {
        let wc_id = order.work_center_id.as_str();
        match groups.iter_mut().find(|(id, _)| *id == wc_id) {
            Some((_, members)) => members.push(order),
            None => groups.push((wc_id, vec![order])),
        }
    }
    groups
}
