//! Convex hull reduction of operator clicks (Andrew's monotone chain).
//!
//! Points are treated as planar with `lng` on the x-axis and `lat` on the
//! y-axis. Turns with a cross product `<= 0` are popped, so collinear boundary
//! points never survive into the hull. The resulting winding is
//! counter-clockwise in (lng, lat) space, starting from the lowest-`lng`
//! point. Persisted zones depend on this exact ordering.

use std::cmp::Ordering;

use crate::models::geo_point::{cross, GeoPoint};

/// Reduces `points` to the ordered vertices of their convex hull.
///
/// Fewer than three points are returned unchanged so an operator can keep
/// adding clicks to a not-yet-meaningful outline.
pub fn hull_reduce(points: &[GeoPoint]) -> Vec<GeoPoint> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut sorted = points.to_vec();
    sorted.sort_by(lng_then_lat);

    let mut lower = chain(sorted.iter());
    let mut upper = chain(sorted.iter().rev());

    // each chain ends where the other begins
    lower.pop();
    upper.pop();

    lower.extend(upper);
    lower
}

fn chain<'a>(points: impl Iterator<Item = &'a GeoPoint>) -> Vec<GeoPoint> {
    let mut stack: Vec<GeoPoint> = Vec::new();
    for &p in points {
        while let [.., a, b] = stack.as_slice() {
            if cross(*a, *b, p) > 0.0 {
                break;
            }
            stack.pop();
        }
        stack.push(p);
    }
    stack
}

fn lng_then_lat(a: &GeoPoint, b: &GeoPoint) -> Ordering {
    a.lng
        .total_cmp(&b.lng)
        .then_with(|| a.lat.total_cmp(&b.lat))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::Fake;

    fn p(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng)
    }

    fn random_cloud(n: usize) -> Vec<GeoPoint> {
        (0..n)
            .map(|_| p((-5.0..5.0).fake::<f64>(), (-5.0..5.0).fake::<f64>()))
            .collect()
    }

    /// Even-odd test that also rejects points on an edge.
    fn strictly_inside(hull: &[GeoPoint], q: GeoPoint) -> bool {
        let n = hull.len();
        (0..n).all(|i| cross(hull[i], hull[(i + 1) % n], q) > 0.0)
    }

    #[test]
    fn test_small_inputs_are_returned_unchanged() {
        assert!(hull_reduce(&[]).is_empty());

        let one = vec![p(1.0, 1.0)];
        assert_eq!(hull_reduce(&one), one);

        // order is not normalized below three points
        let two = vec![p(5.0, 5.0), p(1.0, 1.0)];
        assert_eq!(hull_reduce(&two), two);
    }

    #[test]
    fn test_square_with_interior_point() {
        let clicks = vec![
            p(0.0, 0.0),
            p(0.0, 2.0),
            p(2.0, 2.0),
            p(2.0, 0.0),
            p(1.0, 1.0),
        ];

        let hull = hull_reduce(&clicks);

        assert_eq!(
            hull,
            vec![p(0.0, 0.0), p(0.0, 2.0), p(2.0, 2.0), p(2.0, 0.0)]
        );
        assert!(!hull.contains(&p(1.0, 1.0)));
    }

    #[test]
    fn test_triangle_winding_is_counter_clockwise() {
        let hull = hull_reduce(&[p(2.0, 1.0), p(0.0, 2.0), p(0.0, 0.0)]);
        assert_eq!(hull, vec![p(0.0, 0.0), p(0.0, 2.0), p(2.0, 1.0)]);
        assert!(cross(hull[0], hull[1], hull[2]) > 0.0);
    }

    #[test]
    fn test_collinear_points_are_dropped() {
        let hull = hull_reduce(&[p(0.0, 0.0), p(0.0, 1.0), p(0.0, 2.0), p(2.0, 1.0)]);
        assert_eq!(hull, vec![p(0.0, 0.0), p(0.0, 2.0), p(2.0, 1.0)]);
    }

    #[test]
    fn test_fully_collinear_input_collapses_to_endpoints() {
        let hull = hull_reduce(&[p(0.0, 1.0), p(0.0, 0.0), p(0.0, 2.0)]);
        assert_eq!(hull, vec![p(0.0, 0.0), p(0.0, 2.0)]);
    }

    #[test]
    fn test_duplicate_clicks_collapse() {
        let hull = hull_reduce(&[p(0.0, 0.0), p(0.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)]);
        assert_eq!(hull.len(), 3);
    }

    #[test]
    fn test_tie_on_lng_is_broken_by_lat() {
        let hull = hull_reduce(&[p(3.0, 0.0), p(1.0, 0.0), p(2.0, 4.0)]);
        assert_eq!(hull[0], p(1.0, 0.0));
    }

    #[test]
    fn test_random_clouds_hull_is_subset_and_encloses_all() {
        for _ in 0..50 {
            let cloud = random_cloud((3..40).fake::<usize>());
            let hull = hull_reduce(&cloud);

            assert!(hull.iter().all(|v| cloud.contains(v)));
            if hull.len() >= 3 {
                for q in &cloud {
                    if hull.contains(q) {
                        continue;
                    }
                    // q is inside or on the hull, never outside
                    let n = hull.len();
                    assert!((0..n).all(|i| cross(hull[i], hull[(i + 1) % n], *q) >= -1e-9));
                }
                for v in &hull {
                    let others: Vec<GeoPoint> = hull.iter().copied().filter(|o| o != v).collect();
                    assert!(!strictly_inside(&others, *v));
                }
            }
        }
    }

    #[test]
    fn test_random_clouds_idempotent() {
        for _ in 0..50 {
            let cloud = random_cloud((3..40).fake::<usize>());
            let once = hull_reduce(&cloud);
            assert_eq!(hull_reduce(&once), once);
        }
    }
}
