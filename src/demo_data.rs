//! Deterministic demo/scenario data: small, medium and large schedules with
//! intentional violations, for the HTTP demo endpoint and integration tests.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::domain::{WorkCenter, WorkOrder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoData {
    Small,
    Medium,
    Large,
}

impl std::str::FromStr for DemoData {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SMALL" => Ok(DemoData::Small),
            "MEDIUM" => Ok(DemoData::Medium),
            "LARGE" => Ok(DemoData::Large),
            _ => Err(()),
        }
    }
}

impl DemoData {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemoData::Small => "SMALL",
            DemoData::Medium => "MEDIUM",
            DemoData::Large => "LARGE",
        }
    }

    fn parameters(&self) -> DemoDataParameters {
        match self {
            DemoData::Small => DemoDataParameters {
                work_center_count: 3,
                days_in_schedule: 7,
                orders_per_center_per_day: 2,
                violation_rate: 0.3,
                dependency_rate: 0.1,
            },
            DemoData::Medium => DemoDataParameters {
                work_center_count: 8,
                days_in_schedule: 14,
                orders_per_center_per_day: 3,
                violation_rate: 0.25,
                dependency_rate: 0.15,
            },
            DemoData::Large => DemoDataParameters {
                work_center_count: 20,
                days_in_schedule: 28,
                orders_per_center_per_day: 4,
                violation_rate: 0.2,
                dependency_rate: 0.15,
            },
        }
    }
}

struct DemoDataParameters {
    work_center_count: usize,
    days_in_schedule: i64,
    orders_per_center_per_day: usize,
    violation_rate: f64,
    dependency_rate: f64,
}

/// List of available demo data sets.
pub fn list_demo_data() -> Vec<&'static str> {
    vec!["SMALL", "MEDIUM", "LARGE"]
}

/// Generates a deterministic, intentionally-violating schedule for the
/// given size: a mix of overlapping orders, out-of-shift starts, and
/// dependency chains within and across Work Centers.
pub fn generate(demo: DemoData) -> (Vec<WorkOrder>, Vec<WorkCenter>) {
    let params = demo.parameters();
    let mut rng = StdRng::seed_from_u64(7);

    let start_date = find_next_monday(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());

    let centers: Vec<WorkCenter> = (0..params.work_center_count)
        .map(|i| {
            WorkCenter::new(format!("wc-{i}"), format!("Work Center {i}"))
                .with_shift(1, 8, 17)
                .with_shift(2, 8, 17)
                .with_shift(3, 8, 17)
                .with_shift(4, 8, 17)
                .with_shift(5, 8, 17)
        })
        .collect();

    let mut orders = Vec::new();
    let mut order_seq = 0usize;
    let mut previous_id_by_center: Vec<Option<String>> = vec![None; centers.len()];

    for day in 0..params.days_in_schedule {
        let date = start_date + Duration::days(day);
        for (center_idx, center) in centers.iter().enumerate() {
            for slot in 0..params.orders_per_center_per_day {
                let hour = 8 + (slot as u32 * 3) % 8;
                let mut start = date.and_hms_opt(hour, 0, 0).unwrap().and_utc();

                // Deliberately push some orders outside their shift or into
                // an overlap with the previous one on this center.
                if rng.gen_bool(params.violation_rate) {
                    start -= Duration::hours(3);
                }

                let duration_minutes = 60;
                let end = start + Duration::minutes(duration_minutes);
                let id = format!("wo-{order_seq}");
                let number = format!("WO-{order_seq}");

                let mut wo = WorkOrder::new(id.as_str(), number.as_str(), center.id.as_str(), start, end, duration_minutes);

                if rng.gen_bool(params.dependency_rate) {
                    if let Some(parent_id) = &previous_id_by_center[center_idx] {
                        wo = wo.depending_on(parent_id.clone());
                    }
                }

                previous_id_by_center[center_idx] = Some(id);
                orders.push(wo);
                order_seq += 1;
            }
        }
    }

    (orders, centers)
}

fn find_next_monday(date: NaiveDate) -> NaiveDate {
    let days_until_monday = match date.weekday() {
        Weekday::Mon => 0,
        Weekday::Tue => 6,
        Weekday::Wed => 5,
        Weekday::Thu => 4,
        Weekday::Fri => 3,
        Weekday::Sat => 2,
        Weekday::Sun => 1,
    };
    date + Duration::days(days_until_monday)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::verify;

    #[test]
    fn small_scenario_has_plausible_scale() {
        let (orders, centers) = generate(DemoData::Small);
        assert_eq!(centers.len(), 3);
        assert!(orders.len() >= 3 * 7 * 2 / 2);
    }

    #[test]
    fn large_scenario_is_bigger_than_small() {
        let (small_orders, _) = generate(DemoData::Small);
        let (large_orders, _) = generate(DemoData::Large);
        assert!(large_orders.len() > small_orders.len());
    }

    #[test]
    fn generated_schedules_contain_violations_to_repair() {
        let (orders, centers) = generate(DemoData::Small);
        assert!(!verify(&orders, &centers, None).is_empty());
    }

    #[test]
    fn demo_data_from_str_is_case_insensitive() {
        assert_eq!("small".parse::<DemoData>(), Ok(DemoData::Small));
        assert_eq!("LARGE".parse::<DemoData>(), Ok(DemoData::Large));
        assert!("unknown".parse::<DemoData>().is_err());
    }
}
