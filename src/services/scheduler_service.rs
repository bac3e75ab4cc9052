//! Day-Bucket Scheduler
//!
//! Greedily partitions the cost-annotated spots into ordered daily visit
//! lists under a travel-time budget. Each day starts at the hub: the first
//! pick is the nearest-to-hub spot still in the pool; every later pick is
//! the nearest-neighbor of the previous stop using the precomputed
//! spot↔spot lookups. A spot missing from the lookup is never chosen ahead
//! of one with a known travel time, but once it is the only option its
//! travel time falls back to zero.
//!
//! The heuristic is intentionally not globally optimal; it trades tour
//! quality for determinism and a termination guarantee.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::distance::{PairDistance, PairMatrix, SpotFeature};
use crate::models::schedule::{DayBucket, ScheduledStop};

pub fn build_day_buckets(
    spots: Vec<SpotFeature>,
    pair_matrix: &PairMatrix,
    max_daily_travel_min: f64,
) -> Vec<DayBucket> {
    let mut pool = spots;
    pool.sort_by(|a, b| {
        a.distance_from_hub_km
            .partial_cmp(&b.distance_from_hub_km)
            .unwrap_or(Ordering::Equal)
    });

    let mut days = Vec::new();
    let mut day = 1u32;

    while !pool.is_empty() {
        let mut stops: Vec<ScheduledStop> = Vec::new();
        let mut travel_used = 0.0;
        // None means "at the hub"; set after the first commit of the day.
        let mut current: Option<String> = None;

        while !pool.is_empty() {
            let (index, travel_time) = match &current {
                None => (0, pool[0].travel_time_min),
                Some(current_id) => {
                    let lookup = pair_matrix.get(current_id);
                    let index = pool
                        .iter()
                        .enumerate()
                        .min_by(|(_, a), (_, b)| {
                            selection_time(lookup, a)
                                .partial_cmp(&selection_time(lookup, b))
                                .unwrap_or(Ordering::Equal)
                        })
                        .map(|(i, _)| i)
                        .unwrap_or(0);
                    let travel_time = lookup
                        .and_then(|edges| edges.get(&pool[index].id))
                        .map(|edge| edge.time_min)
                        .unwrap_or(0.0);
                    (index, travel_time)
                }
            };

            // The first stop of a day is committed even when it alone blows
            // the budget; rejecting it would leave the spot orbiting the
            // pool forever.
            if !stops.is_empty() && travel_used + travel_time > max_daily_travel_min {
                break;
            }

            let spot = pool.remove(index);
            travel_used += travel_time;
            stops.push(ScheduledStop {
                name: spot.name,
                lat: spot.lat,
                lng: spot.lng,
            });
            current = Some(spot.id);
        }

        days.push(DayBucket {
            day,
            stops,
            travel_time_min: travel_used,
        });
        day += 1;
    }

    days
}

// Selection key only: an absent lookup must never beat a known time.
fn selection_time(lookup: Option<&HashMap<String, PairDistance>>, spot: &SpotFeature) -> f64 {
    lookup
        .and_then(|edges| edges.get(&spot.id))
        .map(|edge| edge.time_min)
        .unwrap_or(f64::INFINITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::distance::PairDistance;
    use std::collections::HashMap;

    fn spot(id: &str, hub_km: f64, hub_min: f64) -> SpotFeature {
        SpotFeature {
            id: id.to_string(),
            name: id.to_uppercase(),
            lat: 15.0,
            lng: 73.0,
            distance_from_hub_km: hub_km,
            travel_time_min: hub_min,
            travel_cost: (hub_km * 15.0) as u64,
        }
    }

    fn edge(time_min: f64) -> PairDistance {
        PairDistance {
            distance_km: time_min,
            time_min,
        }
    }

    fn symmetric_matrix(ids: &[&str], time_min: f64) -> PairMatrix {
        let mut matrix = PairMatrix::new();
        for from in ids {
            let mut edges = HashMap::new();
            for to in ids {
                if from != to {
                    edges.insert(to.to_string(), edge(time_min));
                }
            }
            matrix.insert(from.to_string(), edges);
        }
        matrix
    }

    #[test]
    fn close_spots_share_one_day() {
        // Three spots 100 min from the hub, 50 min apart: 100+50+50 = 200
        // fits well inside the 480 min budget.
        let spots = vec![spot("a", 10.0, 100.0), spot("b", 11.0, 100.0), spot("c", 12.0, 100.0)];
        let matrix = symmetric_matrix(&["a", "b", "c"], 50.0);

        let days = build_day_buckets(spots, &matrix, 480.0);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].stops.len(), 3);
        assert_eq!(days[0].travel_time_min, 200.0);
    }

    #[test]
    fn budget_overflow_starts_a_new_day() {
        let spots = vec![spot("a", 10.0, 100.0), spot("b", 11.0, 100.0), spot("c", 12.0, 100.0)];
        let matrix = symmetric_matrix(&["a", "b", "c"], 300.0);

        // 100 + 300 = 400 fits, adding the third (another 300) does not.
        let days = build_day_buckets(spots, &matrix, 480.0);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].stops.len(), 2);
        assert_eq!(days[1].stops.len(), 1);
    }

    #[test]
    fn every_spot_is_assigned_exactly_once() {
        let spots = vec![
            spot("a", 2.0, 5.0),
            spot("b", 5.0, 12.0),
            spot("c", 9.0, 20.0),
            spot("d", 40.0, 70.0),
            spot("e", 120.0, 210.0),
        ];
        let matrix = symmetric_matrix(&["a", "b", "c", "d", "e"], 90.0);

        let days = build_day_buckets(spots, &matrix, 480.0);
        let mut seen: Vec<String> = days
            .iter()
            .flat_map(|d| d.stops.iter().map(|s| s.name.clone()))
            .collect();
        seen.sort();
        assert_eq!(seen, vec!["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn budget_is_respected_for_multi_stop_days() {
        let spots: Vec<SpotFeature> = (0..8)
            .map(|i| spot(&format!("s{}", i), i as f64, 30.0 + i as f64 * 10.0))
            .collect();
        let ids: Vec<String> = (0..8).map(|i| format!("s{}", i)).collect();
        let id_refs: Vec<&str> = ids.iter().map(|s| s.as_str()).collect();
        let matrix = symmetric_matrix(&id_refs, 110.0);

        for day in build_day_buckets(spots, &matrix, 480.0) {
            if day.stops.len() > 1 {
                assert!(day.travel_time_min <= 480.0, "day over budget: {:?}", day);
            }
        }
    }

    #[test]
    fn oversized_first_stop_still_gets_its_own_day() {
        // Hub travel alone exceeds the budget; the spot is placed anyway so
        // the scheduler terminates.
        let spots = vec![spot("far", 140.0, 520.0)];
        let days = build_day_buckets(spots, &PairMatrix::new(), 480.0);

        assert_eq!(days.len(), 1);
        assert_eq!(days[0].stops.len(), 1);
        assert_eq!(days[0].travel_time_min, 520.0);
    }

    #[test]
    fn pool_head_is_nearest_to_hub() {
        let spots = vec![spot("far", 90.0, 150.0), spot("near", 2.0, 5.0)];
        let days = build_day_buckets(spots, &symmetric_matrix(&["far", "near"], 60.0), 480.0);
        assert_eq!(days[0].stops[0].name, "NEAR");
    }

    #[test]
    fn known_travel_times_win_over_missing_lookups() {
        let spots = vec![spot("a", 1.0, 10.0), spot("b", 2.0, 20.0), spot("c", 3.0, 30.0)];
        // From "a" only the edge to "c" is known; "b" must not be chosen
        // second despite being closer to the hub.
        let mut matrix = PairMatrix::new();
        let mut from_a = HashMap::new();
        from_a.insert("c".to_string(), edge(15.0));
        matrix.insert("a".to_string(), from_a);

        let days = build_day_buckets(spots, &matrix, 480.0);
        let order: Vec<&str> = days[0].stops.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(order[0], "A");
        assert_eq!(order[1], "C");
    }

    #[test]
    fn missing_lookup_accumulates_zero_when_unavoidable() {
        // No pair data at all: after the first stop every selection falls
        // back to zero travel time, so everything lands on day one.
        let spots = vec![spot("a", 1.0, 10.0), spot("b", 2.0, 20.0)];
        let days = build_day_buckets(spots, &PairMatrix::new(), 480.0);

        assert_eq!(days.len(), 1);
        assert_eq!(days[0].travel_time_min, 10.0);
    }

    #[test]
    fn empty_pool_yields_no_days() {
        assert!(build_day_buckets(Vec::new(), &PairMatrix::new(), 480.0).is_empty());
    }
}
