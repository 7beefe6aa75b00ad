//! Reflow Engine: walks each Work Center's processing order and places
//! every work order at the earliest shift-valid, maintenance-free,
//! predecessor-safe slot, tracking the root cause of every move it makes.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, Utc};

use crate::calendar;
use crate::checker::verify;
use crate::domain::{Change, ReflowResult, ViolationKind, Violation, WorkCenter, WorkOrder};
use crate::error::EngineError;
use crate::sequence::SequencePreserver;

const WATCHDOG_LIMIT: u32 = 10_000;
const FIXPOINT_PASS_LIMIT: u32 = 8;

/// Repairs `orders` against `centers`, one single pass over each Work
/// Center in input order. Returns the input unchanged when it is already
/// valid; fails with [`EngineError::NotFixable`] when any violation is
/// fatal (a dependency cycle, or two fixed orders overlapping).
///
/// Does not resolve dependency chains that cross more than one Work
/// Center boundary in one pass — see [`reflow_to_fixpoint`].
pub fn reflow(orders: &[WorkOrder], centers: &[WorkCenter]) -> Result<ReflowResult, EngineError> {
    let violations = verify(orders, centers, None);
    if violations.is_empty() {
        return Ok(ReflowResult::unchanged(orders.to_vec()));
    }

    let fatal_messages: Vec<&str> = violations
        .iter()
        .filter(|v| v.is_fatal)
        .map(|v| v.message.as_str())
        .collect();
    if !fatal_messages.is_empty() {
        return Err(EngineError::NotFixable(fatal_messages.join("; ")));
    }

    let mut working: Vec<WorkOrder> = orders.to_vec();
    let mut changes = Vec::new();
    let mut explanation = Vec::new();

    for center in centers {
        reschedule_by_center(center, &violations, &mut working, &mut changes, &mut explanation)?;
    }

    Ok(ReflowResult {
        updated_work_orders: working,
        changes,
        explanation,
    })
}

/// Additive convenience on top of [`reflow`]: repeats the single pass up
/// to `8` times while a `DependencyError` remains (the symptom of a
/// dependency chain spanning more than one Work Center). Logs a warning
/// and returns the best schedule found if the cap is hit without settling.
pub fn reflow_to_fixpoint(orders: &[WorkOrder], centers: &[WorkCenter]) -> Result<ReflowResult, EngineError> {
    let mut current = orders.to_vec();
    let mut all_changes = Vec::new();
    let mut all_explanation = Vec::new();

    for pass in 0..FIXPOINT_PASS_LIMIT {
        let result = reflow(&current, centers)?;
        let made_changes = !result.changes.is_empty();
        current = result.updated_work_orders;
        all_changes.extend(result.changes);
        all_explanation.extend(result.explanation);

        let residual_dependency_error = verify(&current, centers, None)
            .iter()
            .any(|v| v.kind == ViolationKind::DependencyError);

        if !residual_dependency_error || !made_changes {
            break;
        }
        if pass == FIXPOINT_PASS_LIMIT - 1 {
            tracing::warn!(
                passes = FIXPOINT_PASS_LIMIT,
                "reflow_to_fixpoint exhausted its pass budget with a dependency error still outstanding"
            );
        }
    }

    Ok(ReflowResult {
        updated_work_orders: current,
        changes: all_changes,
        explanation: all_explanation,
    })
}

fn reschedule_by_center(
    center: &WorkCenter,
    original_violations: &[Violation],
    working: &mut [WorkOrder],
    changes: &mut Vec<Change>,
    explanation: &mut Vec<String>,
) -> Result<(), EngineError> {
    let wc_indices: Vec<usize> = working
        .iter()
        .enumerate()
        .filter(|(_, o)| o.work_center_id == center.id && !o.is_maintenance)
        .map(|(i, _)| i)
        .collect();
    if wc_indices.is_empty() {
        return Ok(());
    }

    let wc_orders: Vec<WorkOrder> = wc_indices.iter().map(|&i| working[i].clone()).collect();
    let index_by_id: HashMap<String, usize> = wc_indices.iter().map(|&i| (working[i].id.clone(), i)).collect();
    let order_ids = SequencePreserver::prepare(&wc_orders);

    let obstacles: Vec<WorkOrder> = working
        .iter()
        .filter(|o| o.work_center_id == center.id && o.is_maintenance)
        .cloned()
        .collect();

    let mut scheduled: Vec<WorkOrder> = Vec::with_capacity(order_ids.len());
    let mut cascade = false;

    for id in &order_ids {
        let widx = index_by_id[id.as_str()];
        let mut curr = working[widx].clone();
        let prev = scheduled.last().cloned();
        let orig = original_violations.iter().find(|v| &v.order_id == id);

        // A cross-WC (or topologically-indirect same-WC) parent is a hard
        // lower bound on `curr.start`, independent of whoever this WC's
        // sequence happened to schedule immediately before it.
        let dependency_floor = curr
            .depends_on
            .iter()
            .filter_map(|parent_id| working.iter().find(|o| &o.id == parent_id))
            .map(|parent| parent.end)
            .max();
        let effective_floor = match (prev.as_ref().map(|p| p.end), dependency_floor) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        };
        let ok = effective_floor.map_or(true, |floor| curr.start >= floor);

        if cascade {
            if ok {
                if let Some(orig) = orig {
                    let from = curr.start;
                    shift(
                        &mut curr,
                        from,
                        center,
                        &obstacles,
                        changes,
                        explanation,
                        format!("Original violation: {}", orig.kind),
                    )?;
                } else if obstacle_overlaps(&curr, center, &obstacles) {
                    let from = curr.start;
                    shift(
                        &mut curr,
                        from,
                        center,
                        &obstacles,
                        changes,
                        explanation,
                        "Cascading shift changes due to earlier violations".to_string(),
                    )?;
                } else {
                    cascade = false;
                }
            } else {
                let floor = effective_floor.expect("ok is false only when a floor exists");
                shift(
                    &mut curr,
                    floor,
                    center,
                    &obstacles,
                    changes,
                    explanation,
                    "Cascading shift changes due to earlier violations".to_string(),
                )?;
            }
        } else if ok {
            if let Some(orig) = orig {
                let from = curr.start;
                shift(
                    &mut curr,
                    from,
                    center,
                    &obstacles,
                    changes,
                    explanation,
                    format!("Original violation: {}", orig.kind),
                )?;
                cascade = true;
            }
        } else {
            let floor = effective_floor.expect("ok is false only when a floor exists");
            let message = match orig {
                Some(orig) => format!("Original violation: {}", orig.kind),
                None => blocking_reason(&curr, &prev, dependency_floor, working),
            };
            shift(&mut curr, floor, center, &obstacles, changes, explanation, message)?;
            cascade = true;
        }

        working[widx] = curr.clone();
        scheduled.push(curr);
    }

    Ok(())
}

/// Names the actual root cause of a non-cascading collision: whichever
/// `depends_on` parent's `end` drove the floor, if a dependency (rather than
/// the same-WC predecessor) is what pushed `curr` past its requested start.
fn blocking_reason(
    curr: &WorkOrder,
    prev: &Option<WorkOrder>,
    dependency_floor: Option<DateTime<Utc>>,
    working: &[WorkOrder],
) -> String {
    let driven_by_dependency = match (dependency_floor, prev.as_ref().map(|p| p.end)) {
        (Some(d), Some(p_end)) => d >= p_end,
        (Some(_), None) => true,
        (None, _) => false,
    };

    if driven_by_dependency {
        let floor = dependency_floor.expect("driven_by_dependency implies dependency_floor is Some");
        let mut blocking: Vec<&str> = curr
            .depends_on
            .iter()
            .filter_map(|parent_id| working.iter().find(|o| &o.id == parent_id))
            .filter(|parent| parent.end == floor)
            .map(|parent| parent.number.as_str())
            .collect();
        blocking.sort_unstable();
        if !blocking.is_empty() {
            return format!("Collision with dependency {}", blocking.join(", "));
        }
    }

    match prev {
        Some(p) => format!("Collision with previous order {}", p.number),
        None => "Collision with an unresolved dependency".to_string(),
    }
}

fn shift(
    curr: &mut WorkOrder,
    from: DateTime<Utc>,
    wc: &WorkCenter,
    obstacles: &[WorkOrder],
    changes: &mut Vec<Change>,
    explanation: &mut Vec<String>,
    reason: String,
) -> Result<(), EngineError> {
    let old_start = curr.start;
    let old_end = curr.end;

    let new_start = find_next_available_start(from, wc, obstacles)?;
    let new_end = find_end_date(new_start, curr.duration_minutes, wc, obstacles)?;

    curr.start = new_start;
    curr.end = new_end;

    changes.push(Change {
        order_id: curr.id.clone(),
        old_start,
        old_end,
        new_start,
        new_end,
    });
    explanation.push(reason);
    Ok(())
}

fn obstacle_overlaps(curr: &WorkOrder, wc: &WorkCenter, obstacles: &[WorkOrder]) -> bool {
    wc.maintenance_windows
        .iter()
        .any(|w| calendar::intervals_overlap(curr.start, curr.end, w.start, w.end))
        || obstacles
            .iter()
            .any(|o| calendar::intervals_overlap(curr.start, curr.end, o.start, o.end))
}

/// Earliest `t' >= t` that lies inside a shift and is not covered by a
/// maintenance window or a fixed work order on `wc`. The search cursor
/// only ever moves forward; `WatchdogExceeded` guards against a future
/// regression that would make it loop forever.
pub fn find_next_available_start(
    t: DateTime<Utc>,
    wc: &WorkCenter,
    obstacles: &[WorkOrder],
) -> Result<DateTime<Utc>, EngineError> {
    let mut current = t;

    for _ in 0..WATCHDOG_LIMIT {
        let day = current.date_naive();
        let dow = day.weekday().num_days_from_sunday() as u8;

        let Some(shift) = wc.shift_on(dow) else {
            current = calendar::next_midnight(day);
            continue;
        };
        let shift_start = calendar::hour_boundary(day, shift.start_hour);
        let shift_end = calendar::hour_boundary(day, shift.end_hour);

        if current < shift_start {
            current = shift_start;
            continue;
        }
        if current >= shift_end {
            current = calendar::next_midnight(day);
            continue;
        }
        if let Some(obstacle) = obstacles.iter().find(|o| current >= o.start && current < o.end) {
            current = obstacle.end;
            continue;
        }
        if let Some(window) = wc
            .maintenance_windows
            .iter()
            .find(|w| current >= w.start && current < w.end)
        {
            current = window.end;
            continue;
        }

        return Ok(current);
    }

    Err(EngineError::WatchdogExceeded(WATCHDOG_LIMIT))
}

/// Consumes `duration_minutes` of on-shift, obstacle-free time starting at
/// `start`, returning the resulting end timestamp.
pub fn find_end_date(
    start: DateTime<Utc>,
    duration_minutes: i64,
    wc: &WorkCenter,
    obstacles: &[WorkOrder],
) -> Result<DateTime<Utc>, EngineError> {
    let mut current = start;
    let mut remaining_seconds = duration_minutes.max(0) * 60;

    if remaining_seconds == 0 {
        return Ok(current);
    }

    for _ in 0..WATCHDOG_LIMIT {
        let day = current.date_naive();
        let dow = day.weekday().num_days_from_sunday() as u8;

        let Some(shift) = wc.shift_on(dow) else {
            current = calendar::next_midnight(day);
            continue;
        };
        let shift_start = calendar::hour_boundary(day, shift.start_hour);
        let shift_end = calendar::hour_boundary(day, shift.end_hour);

        if current < shift_start {
            current = shift_start;
            continue;
        }
        if current >= shift_end {
            current = calendar::next_midnight(day);
            continue;
        }

        let next_obstacle = wc
            .maintenance_windows
            .iter()
            .map(|w| (w.start, w.end))
            .chain(obstacles.iter().map(|o| (o.start, o.end)))
            .filter(|(start, _)| *start >= current && *start < shift_end)
            .min_by_key(|(start, _)| *start);

        let deadline = next_obstacle.map(|(start, _)| start).unwrap_or(shift_end);
        let available_seconds = (deadline - current).num_seconds();

        if available_seconds >= remaining_seconds {
            return Ok(current + Duration::seconds(remaining_seconds));
        }

        remaining_seconds -= available_seconds;
        match next_obstacle {
            Some((obstacle_start, obstacle_end)) if obstacle_start == deadline => {
                current = obstacle_end;
            }
            _ => {
                current = calendar::next_midnight(day);
            }
        }
    }

    Err(EngineError::WatchdogExceeded(WATCHDOG_LIMIT))
}
