//! DTOs for the REST API: camelCase wire mirrors of the domain model, with
//! conversions that resolve ids and log anything they have to drop.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Change, MaintenanceWindow, ReflowResult, Shift, Violation, WorkCenter, WorkOrder};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DtoError {
    #[error("work order {0} references unknown work center {1}")]
    UnknownWorkCenter(String, String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderDto {
    pub id: String,
    pub number: String,
    pub work_center_id: String,
    #[serde(default)]
    pub manufacturing_order_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_minutes: i64,
    #[serde(default)]
    pub is_maintenance: bool,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl From<&WorkOrder> for WorkOrderDto {
    fn from(wo: &WorkOrder) -> Self {
        let mut depends_on: Vec<String> = wo.depends_on.iter().cloned().collect();
        depends_on.sort();
        Self {
            id: wo.id.clone(),
            number: wo.number.clone(),
            work_center_id: wo.work_center_id.clone(),
            manufacturing_order_id: wo.manufacturing_order_id.clone(),
            start: wo.start,
            end: wo.end,
            duration_minutes: wo.duration_minutes,
            is_maintenance: wo.is_maintenance,
            depends_on,
        }
    }
}

impl WorkOrderDto {
    /// Converts to a domain `WorkOrder`, dropping any `depends_on` id not
    /// present in `known_ids` (logged, not an error — unresolvable parent
    /// ids are treated as no constraint, per the engine's contract).
    fn to_domain(&self, known_ids: &HashSet<String>) -> WorkOrder {
        let depends_on: HashSet<String> = self
            .depends_on
            .iter()
            .filter(|parent_id| {
                let known = known_ids.contains(*parent_id);
                if !known {
                    tracing::warn!(
                        work_order_id = %self.id,
                        parent_id = %parent_id,
                        "dropping unresolvable dependency id"
                    );
                }
                known
            })
            .cloned()
            .collect();

        WorkOrder {
            id: self.id.clone(),
            number: self.number.clone(),
            work_center_id: self.work_center_id.clone(),
            manufacturing_order_id: self.manufacturing_order_id.clone(),
            start: self.start,
            end: self.end,
            duration_minutes: self.duration_minutes,
            is_maintenance: self.is_maintenance,
            depends_on,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftDto {
    pub day_of_week: u8,
    pub start_hour: u8,
    pub end_hour: u8,
}

impl From<&Shift> for ShiftDto {
    fn from(s: &Shift) -> Self {
        Self {
            day_of_week: s.day_of_week,
            start_hour: s.start_hour,
            end_hour: s.end_hour,
        }
    }
}

impl From<&ShiftDto> for Shift {
    fn from(dto: &ShiftDto) -> Self {
        Shift::new(dto.day_of_week, dto.start_hour, dto.end_hour)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceWindowDto {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl From<&MaintenanceWindow> for MaintenanceWindowDto {
    fn from(w: &MaintenanceWindow) -> Self {
        Self {
            start: w.start,
            end: w.end,
            reason: w.reason.clone(),
        }
    }
}

impl From<&MaintenanceWindowDto> for MaintenanceWindow {
    fn from(dto: &MaintenanceWindowDto) -> Self {
        MaintenanceWindow {
            start: dto.start,
            end: dto.end,
            reason: dto.reason.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkCenterDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub shifts: Vec<ShiftDto>,
    #[serde(default)]
    pub maintenance_windows: Vec<MaintenanceWindowDto>,
}

impl From<&WorkCenter> for WorkCenterDto {
    fn from(wc: &WorkCenter) -> Self {
        Self {
            id: wc.id.clone(),
            name: wc.name.clone(),
            shifts: wc.shifts.iter().map(ShiftDto::from).collect(),
            maintenance_windows: wc.maintenance_windows.iter().map(MaintenanceWindowDto::from).collect(),
        }
    }
}

impl From<&WorkCenterDto> for WorkCenter {
    fn from(dto: &WorkCenterDto) -> Self {
        WorkCenter {
            id: dto.id.clone(),
            name: dto.name.clone(),
            shifts: dto.shifts.iter().map(Shift::from).collect(),
            maintenance_windows: dto.maintenance_windows.iter().map(MaintenanceWindow::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationDto {
    pub order_id: String,
    pub kind: String,
    pub message: String,
    pub is_fatal: bool,
}

impl From<&Violation> for ViolationDto {
    fn from(v: &Violation) -> Self {
        Self {
            order_id: v.order_id.clone(),
            kind: v.kind.to_string(),
            message: v.message.clone(),
            is_fatal: v.is_fatal,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeDto {
    pub order_id: String,
    pub old_start: DateTime<Utc>,
    pub old_end: DateTime<Utc>,
    pub new_start: DateTime<Utc>,
    pub new_end: DateTime<Utc>,
}

impl From<&Change> for ChangeDto {
    fn from(c: &Change) -> Self {
        Self {
            order_id: c.order_id.clone(),
            old_start: c.old_start,
            old_end: c.old_end,
            new_start: c.new_start,
            new_end: c.new_end,
        }
    }
}

/// Request/response envelope for `/verify` and `/reflow`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDto {
    pub work_orders: Vec<WorkOrderDto>,
    pub work_centers: Vec<WorkCenterDto>,
}

impl ScheduleDto {
    pub fn from_domain(orders: &[WorkOrder], centers: &[WorkCenter]) -> Self {
        Self {
            work_orders: orders.iter().map(WorkOrderDto::from).collect(),
            work_centers: centers.iter().map(WorkCenterDto::from).collect(),
        }
    }

    /// Resolves ids and converts every DTO to its domain type. Unresolvable
    /// `work_center_id`s are reported; unresolvable `depends_on` ids are
    /// silently dropped (logged), matching the engine's own contract for
    /// dangling dependency ids.
    pub fn to_domain(&self) -> Result<(Vec<WorkOrder>, Vec<WorkCenter>), DtoError> {
        let centers: Vec<WorkCenter> = self.work_centers.iter().map(WorkCenter::from).collect();
        let center_ids: HashSet<&str> = centers.iter().map(|c| c.id.as_str()).collect();
        let known_order_ids: HashSet<String> = self.work_orders.iter().map(|o| o.id.clone()).collect();

        let orders: Vec<WorkOrder> = self
            .work_orders
            .iter()
            .map(|dto| {
                if !center_ids.contains(dto.work_center_id.as_str()) {
                    return Err(DtoError::UnknownWorkCenter(dto.id.clone(), dto.work_center_id.clone()));
                }
                Ok(dto.to_domain(&known_order_ids))
            })
            .collect::<Result<_, _>>()?;

        Ok((orders, centers))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReflowResultDto {
    pub updated_work_orders: Vec<WorkOrderDto>,
    pub changes: Vec<ChangeDto>,
    pub explanation: Vec<String>,
}

impl From<&ReflowResult> for ReflowResultDto {
    fn from(result: &ReflowResult) -> Self {
        Self {
            updated_work_orders: result.updated_work_orders.iter().map(WorkOrderDto::from).collect(),
            changes: result.changes.iter().map(ChangeDto::from).collect(),
            explanation: result.explanation.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub violations: Vec<ViolationDto>,
}

impl VerifyResponse {
    pub fn from_violations(violations: &[Violation]) -> Self {
        Self {
            violations: violations.iter().map(ViolationDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub engine: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, mi, 0).unwrap()
    }

    #[test]
    fn round_trips_a_schedule_through_json() {
        let center = WorkCenter::new("wc-1", "Line 1").with_shift(1, 8, 17);
        let wo = WorkOrder::new("a", "A", "wc-1", utc(2026, 2, 9, 8, 0), utc(2026, 2, 9, 9, 0), 60);

        let dto = ScheduleDto::from_domain(&[wo], &[center]);
        let json = serde_json::to_string(&dto).unwrap();
        let parsed: ScheduleDto = serde_json::from_str(&json).unwrap();
        let (orders, centers) = parsed.to_domain().unwrap();

        assert_eq!(orders.len(), 1);
        assert_eq!(centers.len(), 1);
        assert_eq!(orders[0].id, "a");
    }

    #[test]
    fn unknown_work_center_is_rejected() {
        let wo = WorkOrderDto {
            id: "a".to_string(),
            number: "A".to_string(),
            work_center_id: "missing".to_string(),
            manufacturing_order_id: String::new(),
            start: utc(2026, 2, 9, 8, 0),
            end: utc(2026, 2, 9, 9, 0),
            duration_minutes: 60,
            is_maintenance: false,
            depends_on: Vec::new(),
        };
        let dto = ScheduleDto {
            work_orders: vec![wo],
            work_centers: Vec::new(),
        };
        assert!(matches!(dto.to_domain(), Err(DtoError::UnknownWorkCenter(_, _))));
    }

    #[test]
    fn dangling_dependency_id_is_dropped_not_rejected() {
        let wo = WorkOrderDto {
            id: "a".to_string(),
            number: "A".to_string(),
            work_center_id: "wc-1".to_string(),
            manufacturing_order_id: String::new(),
            start: utc(2026, 2, 9, 8, 0),
            end: utc(2026, 2, 9, 9, 0),
            duration_minutes: 60,
            is_maintenance: false,
            depends_on: vec!["ghost".to_string()],
        };
        let center = WorkCenterDto {
            id: "wc-1".to_string(),
            name: "Line 1".to_string(),
            shifts: Vec::new(),
            maintenance_windows: Vec::new(),
        };
        let dto = ScheduleDto {
            work_orders: vec![wo],
            work_centers: vec![center],
        };
        let (orders, _) = dto.to_domain().unwrap();
        assert!(orders[0].depends_on.is_empty());
    }
}
