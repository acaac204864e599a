//! Turns one raw shipment list into the ordered package list.

use chrono::{DateTime, Local};
use tracing::debug;

use crate::models::{Package, PackageStatus, Shipment};

use super::SensorOptions;

const SECONDS_PER_DAY: i64 = 86_400;

/// Result of one pass over the raw shipments.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageSnapshot {
    /// Most recent status change among shipments that could be placed in time,
    /// including ones later hidden as stale or old.
    pub latest_change: Option<DateTime<Local>>,
    pub packages: Vec<Package>,
}

/// Whole days elapsed between `then` and `now`, rounded down.
pub fn age_in_days(then: DateTime<Local>, now: DateTime<Local>) -> i64 {
    (now - then).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// A package paired with the instant of its latest event, the sort key.
type Keyed = (DateTime<Local>, Package);

fn sort_newest_first(packages: &mut [Keyed]) {
    packages.sort_by(|a, b| b.0.cmp(&a.0));
}

/// Classify, filter, order and truncate shipments as of `now`.
pub fn build_snapshot(
    shipments: &[Shipment],
    options: &SensorOptions,
    now: DateTime<Local>,
) -> PackageSnapshot {
    let mut latest_change: Option<DateTime<Local>> = None;
    let mut undelivered: Vec<Keyed> = Vec::new();
    let mut delivered: Vec<Keyed> = Vec::new();

    for shipment in shipments {
        let Some(changed) = shipment.last_status_change() else {
            debug!(shipment = %shipment.shipment_number, "Skipping shipment without event or delivery time");
            continue;
        };

        if latest_change.map_or(true, |latest| changed > latest) {
            latest_change = Some(changed);
        }

        let status = PackageStatus::from_raw(shipment.shipment_status);
        let age = age_in_days(changed, now);
        debug!(shipment = %shipment.shipment_number, status = %status, age, "Classified shipment");

        if !status.is_delivered() && age <= i64::from(options.stale_shipment_day_limit) {
            undelivered.push((changed, Package::from_shipment(shipment, status, changed)));
        } else if status.is_delivered() && age <= i64::from(options.completed_shipment_days_shown) {
            delivered.push((changed, Package::from_shipment(shipment, status, changed)));
        }
    }

    sort_newest_first(&mut undelivered);
    sort_newest_first(&mut delivered);

    let mut packages = undelivered;
    packages.append(&mut delivered);

    if !options.prioritize_undelivered {
        sort_newest_first(&mut packages);
    }

    packages.truncate(options.max_shipments);

    PackageSnapshot {
        latest_change,
        packages: packages.into_iter().map(|(_, package)| package).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LastEvent, ServerTime};
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 6, 15, 12, 0, 0)
            .single()
            .expect("unambiguous test time")
    }

    fn shipment(number: &str, raw_status: i64, event_time: Option<DateTime<Local>>) -> Shipment {
        Shipment {
            sender_name: Some("Sender".to_string()),
            sender_city: Some("HELSINKI".to_string()),
            destination_place_name: Some("Pickup point".to_string()),
            receiver_city: Some("TURKU".to_string()),
            shipment_number: number.to_string(),
            shipment_date: Some(now() - Duration::days(40)),
            shipment_status: raw_status,
            last_event: event_time.map(|time| LastEvent {
                description: Some("Event".to_string()),
                place: Some("TURKU".to_string()),
                time: ServerTime::from(time),
            }),
            delivery_time: None,
        }
    }

    fn options(prioritize_undelivered: bool, max_shipments: usize) -> SensorOptions {
        SensorOptions {
            prioritize_undelivered,
            max_shipments,
            stale_shipment_day_limit: 5,
            completed_shipment_days_shown: 30,
        }
    }

    fn numbers(snapshot: &PackageSnapshot) -> Vec<&str> {
        snapshot
            .packages
            .iter()
            .map(|p| p.shipment_number.as_str())
            .collect()
    }

    fn ago(days: i64, hours: i64) -> Option<DateTime<Local>> {
        Some(now() - Duration::days(days) - Duration::hours(hours))
    }

    #[test]
    fn test_age_in_days_rounds_down() {
        let n = now();
        assert_eq!(age_in_days(n, n), 0);
        assert_eq!(age_in_days(n - Duration::hours(23), n), 0);
        assert_eq!(age_in_days(n - Duration::hours(49), n), 2);
        assert_eq!(age_in_days(n + Duration::hours(1), n), -1);
    }

    #[test]
    fn test_recent_delivered_is_included() {
        let shipments = vec![shipment("D", 65, Some(now()))];
        let snapshot = build_snapshot(&shipments, &options(true, 10), now());

        assert_eq!(numbers(&snapshot), vec!["D"]);
        assert_eq!(snapshot.packages[0].status, PackageStatus::Delivered);
        assert_eq!(snapshot.latest_change, Some(now()));
    }

    #[test]
    fn test_stale_undelivered_is_excluded() {
        let shipments = vec![shipment("R", 25, ago(10, 0))];
        let snapshot = build_snapshot(&shipments, &options(true, 10), now());

        assert!(snapshot.packages.is_empty());
        // Still counts towards the sensor state
        assert_eq!(snapshot.latest_change, ago(10, 0));
    }

    #[test]
    fn test_day_limits_are_inclusive() {
        let shipments = vec![
            shipment("U5", 30, ago(5, 23)),
            shipment("U6", 30, ago(6, 0)),
            shipment("D30", 60, ago(30, 1)),
            shipment("D31", 60, ago(31, 0)),
        ];
        let snapshot = build_snapshot(&shipments, &options(true, 10), now());
        assert_eq!(numbers(&snapshot), vec!["U5", "D30"]);
    }

    #[test]
    fn test_unplaceable_shipment_is_dropped() {
        let shipments = vec![shipment("NOTIME", 45, None), shipment("OK", 45, ago(1, 0))];
        let snapshot = build_snapshot(&shipments, &options(true, 10), now());

        assert_eq!(numbers(&snapshot), vec!["OK"]);
        assert_eq!(snapshot.latest_change, ago(1, 0));
    }

    #[test]
    fn test_delivery_time_is_fallback() {
        let mut delivered = shipment("DT", 60, None);
        delivered.delivery_time = ago(2, 0);
        let snapshot = build_snapshot(&[delivered], &options(true, 10), now());

        assert_eq!(numbers(&snapshot), vec!["DT"]);
        assert_eq!(
            snapshot.packages[0].latest_event_date,
            (now() - Duration::days(2)).to_rfc3339()
        );
        assert_eq!(snapshot.packages[0].latest_event, None);
    }

    #[test]
    fn test_event_time_wins_over_delivery_time() {
        let mut s = shipment("BOTH", 60, ago(1, 0));
        s.delivery_time = ago(3, 0);
        let snapshot = build_snapshot(&[s], &options(true, 10), now());
        assert_eq!(snapshot.latest_change, ago(1, 0));
    }

    #[test]
    fn test_prioritized_keeps_undelivered_first() {
        let shipments = vec![
            shipment("U-old", 40, ago(4, 0)),
            shipment("D-new", 60, ago(0, 1)),
            shipment("U-new", 20, ago(1, 0)),
            shipment("D-old", 60, ago(9, 0)),
        ];
        let snapshot = build_snapshot(&shipments, &options(true, 10), now());
        assert_eq!(numbers(&snapshot), vec!["U-new", "U-old", "D-new", "D-old"]);
    }

    #[test]
    fn test_unprioritized_sorts_by_recency_only() {
        let shipments = vec![
            shipment("U-old", 40, ago(4, 0)),
            shipment("D-new", 60, ago(0, 1)),
            shipment("U-new", 20, ago(1, 0)),
            shipment("D-old", 60, ago(9, 0)),
        ];
        let snapshot = build_snapshot(&shipments, &options(false, 10), now());
        assert_eq!(numbers(&snapshot), vec!["D-new", "U-new", "U-old", "D-old"]);
    }

    #[test]
    fn test_truncates_after_ordering() {
        let shipments = vec![
            shipment("D-new", 60, ago(0, 1)),
            shipment("U-old", 40, ago(4, 0)),
            shipment("U-new", 20, ago(1, 0)),
        ];

        let prioritized = build_snapshot(&shipments, &options(true, 2), now());
        assert_eq!(numbers(&prioritized), vec!["U-new", "U-old"]);

        let merged = build_snapshot(&shipments, &options(false, 2), now());
        assert_eq!(numbers(&merged), vec!["D-new", "U-new"]);
    }

    #[test]
    fn test_short_list_is_not_padded() {
        let shipments = vec![shipment("ONLY", 50, ago(1, 0))];
        let snapshot = build_snapshot(&shipments, &options(true, 5), now());
        assert_eq!(snapshot.packages.len(), 1);

        let none = build_snapshot(&shipments, &options(true, 0), now());
        assert!(none.packages.is_empty());
        assert_eq!(none.latest_change, ago(1, 0));
    }

    #[test]
    fn test_empty_input() {
        let snapshot = build_snapshot(&[], &options(true, 5), now());
        assert_eq!(
            snapshot,
            PackageSnapshot {
                latest_change: None,
                packages: Vec::new(),
            }
        );
    }
}
