//! Domain model for the Work Order reflow engine.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scheduled unit of work on a single Work Center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: String,
    pub number: String,
    pub work_center_id: String,
    pub manufacturing_order_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Net required working minutes. Must equal `working_minutes(start, end, wc)`
    /// on a valid, non-maintenance order.
    pub duration_minutes: i64,
    /// Fixed work orders are immutable and may run outside shifts.
    pub is_maintenance: bool,
    pub depends_on: HashSet<String>,
}

impl WorkOrder {
    pub fn new(
        id: impl Into<String>,
        number: impl Into<String>,
        work_center_id: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        duration_minutes: i64,
    ) -> Self {
        Self {
            id: id.into(),
            number: number.into(),
            work_center_id: work_center_id.into(),
            manufacturing_order_id: String::new(),
            start,
            end,
            duration_minutes,
            is_maintenance: false,
            depends_on: HashSet::new(),
        }
    }

    pub fn maintenance(
        id: impl Into<String>,
        number: impl Into<String>,
        work_center_id: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        let duration_minutes = (end - start).num_minutes().max(0);
        let mut wo = Self::new(id, number, work_center_id, start, end, duration_minutes);
        wo.is_maintenance = true;
        wo
    }

    pub fn with_manufacturing_order(mut self, manufacturing_order_id: impl Into<String>) -> Self {
        self.manufacturing_order_id = manufacturing_order_id.into();
        self
    }

    pub fn depending_on(mut self, parent_id: impl Into<String>) -> Self {
        self.depends_on.insert(parent_id.into());
        self
    }
}

/// A recurring weekly production window. `day_of_week` is `0..=6`, Sunday = 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub day_of_week: u8,
    pub start_hour: u8,
    pub end_hour: u8,
}

impl Shift {
    pub fn new(day_of_week: u8, start_hour: u8, end_hour: u8) -> Self {
        Self {
            day_of_week,
            start_hour,
            end_hour,
        }
    }
}

/// A one-off blackout interval on a Work Center, during which only
/// maintenance work orders may run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// A resource that runs one work order at a time, on a weekly shift pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCenter {
    pub id: String,
    pub name: String,
    pub shifts: Vec<Shift>,
    #[serde(default)]
    pub maintenance_windows: Vec<MaintenanceWindow>,
}

impl WorkCenter {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            shifts: Vec::new(),
            maintenance_windows: Vec::new(),
        }
    }

    pub fn with_shift(mut self, day_of_week: u8, start_hour: u8, end_hour: u8) -> Self {
        self.shifts.push(Shift::new(day_of_week, start_hour, end_hour));
        self
    }

    pub fn with_maintenance_window(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.maintenance_windows.push(MaintenanceWindow {
            start,
            end,
            reason: None,
        });
        self
    }

    pub fn shift_on(&self, day_of_week: u8) -> Option<&Shift> {
        self.shifts.iter().find(|s| s.day_of_week == day_of_week)
    }
}

/// The kind of constraint a Violation reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationKind {
    Overlap,
    OutsideShift,
    MaintenanceCollision,
    DependencyError,
    FixedOrderMoved,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ViolationKind::Overlap => "OVERLAP",
            ViolationKind::OutsideShift => "OUTSIDE_SHIFT",
            ViolationKind::MaintenanceCollision => "MAINTENANCE_COLLISION",
            ViolationKind::DependencyError => "DEPENDENCY_ERROR",
            ViolationKind::FixedOrderMoved => "FIXED_ORDER_MOVED",
        };
        f.write_str(label)
    }
}

/// A single constraint violation found by `verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub order_id: String,
    pub kind: ViolationKind,
    pub message: String,
    pub is_fatal: bool,
}

impl Violation {
    pub fn new(order_id: impl Into<String>, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            kind,
            message: message.into(),
            is_fatal: false,
        }
    }

    pub fn fatal(mut self) -> Self {
        self.is_fatal = true;
        self
    }
}

/// One concrete move the Reflow Engine made to a work order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub order_id: String,
    pub old_start: DateTime<Utc>,
    pub old_end: DateTime<Utc>,
    pub new_start: DateTime<Utc>,
    pub new_end: DateTime<Utc>,
}

/// The output of `reflow`: a repaired schedule plus parallel change/explanation logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflowResult {
    pub updated_work_orders: Vec<WorkOrder>,
    pub changes: Vec<Change>,
    pub explanation: Vec<String>,
}

impl ReflowResult {
    pub fn unchanged(orders: Vec<WorkOrder>) -> Self {
        Self {
            updated_work_orders: orders,
            changes: Vec::new(),
            explanation: Vec::new(),
        }
    }
}
