//! Decide which areas are due for a weather refresh.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use golk_graph::AreaWeatherState;

use crate::coordinates::AreaCoordinate;

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedUpdate {
    pub area: String,
    pub latitude: f64,
    pub longitude: f64,
    pub last_updated: Option<DateTime<Utc>>,
    /// 0 = never updated, 1 = stale.
    pub priority: u8,
}

/// Areas to refresh, never-updated first, then stale ones oldest first.
///
/// Coordinates come from the CSV; the graph only supplies update stamps.
/// An area listed twice in the CSV is planned once.
pub fn plan_updates(
    coords: &[AreaCoordinate],
    states: &[AreaWeatherState],
    cutoff: DateTime<Utc>,
) -> Vec<PlannedUpdate> {
    let last_updates: HashMap<&str, Option<DateTime<Utc>>> = states
        .iter()
        .map(|s| (s.area.as_str(), s.last_updated))
        .collect();

    let mut seen = HashSet::new();
    let mut plan: Vec<PlannedUpdate> = coords
        .iter()
        .filter(|c| seen.insert(c.area.as_str()))
        .filter_map(|c| {
            let last_updated = last_updates.get(c.area.as_str()).copied().flatten();
            let priority = match last_updated {
                None => 0,
                Some(ts) if ts < cutoff => 1,
                Some(_) => return None,
            };
            Some(PlannedUpdate {
                area: c.area.clone(),
                latitude: c.latitude,
                longitude: c.longitude,
                last_updated,
                priority,
            })
        })
        .collect();

    // None sorts before Some, so never-stamped rows lead within a priority.
    plan.sort_by(|a, b| (a.priority, a.last_updated).cmp(&(b.priority, b.last_updated)));
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coord(area: &str) -> AreaCoordinate {
        AreaCoordinate {
            area: area.to_string(),
            latitude: 7.0,
            longitude: 80.0,
        }
    }

    fn state(area: &str, last_updated: Option<DateTime<Utc>>) -> AreaWeatherState {
        AreaWeatherState {
            area: area.to_string(),
            last_updated,
            latitude: None,
            longitude: None,
        }
    }

    #[test]
    fn new_areas_come_before_stale_ones() {
        let now = Utc::now();
        let cutoff = now - Duration::hours(2);
        let coords = vec![coord("Stale"), coord("Fresh"), coord("New"), coord("Unstamped")];
        let states = vec![
            state("Stale", Some(now - Duration::hours(5))),
            state("Fresh", Some(now - Duration::minutes(10))),
            state("Unstamped", None),
        ];

        let plan = plan_updates(&coords, &states, cutoff);
        let areas: Vec<_> = plan.iter().map(|p| p.area.as_str()).collect();
        assert_eq!(areas, ["New", "Unstamped", "Stale"]);
        assert_eq!(plan[0].priority, 0);
        assert_eq!(plan[2].priority, 1);
    }

    #[test]
    fn stale_areas_sort_oldest_first() {
        let now = Utc::now();
        let coords = vec![coord("B"), coord("A")];
        let states = vec![
            state("A", Some(now - Duration::hours(10))),
            state("B", Some(now - Duration::hours(3))),
        ];
        let plan = plan_updates(&coords, &states, now - Duration::hours(2));
        let areas: Vec<_> = plan.iter().map(|p| p.area.as_str()).collect();
        assert_eq!(areas, ["A", "B"]);
    }

    #[test]
    fn duplicate_csv_rows_are_planned_once() {
        let plan = plan_updates(&[coord("Kandy"), coord("Kandy")], &[], Utc::now());
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn nothing_due_yields_empty_plan() {
        let now = Utc::now();
        let plan = plan_updates(
            &[coord("Kandy")],
            &[state("Kandy", Some(now))],
            now - Duration::hours(2),
        );
        assert!(plan.is_empty());
    }
}
