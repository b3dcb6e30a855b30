//! Geodesic fallback line
//!
//! Not a true great circle: points are interpolated linearly in lon/lat, which
//! is what the map draws as a straight segment anyway.

use crate::models::{Coordinates, RouteResult, RouteSource};

/// Interpolate `points_per_segment` points between each consecutive pair of
/// waypoints. Shared joints appear once; the first and last points are the
/// first and last waypoints.
#[must_use]
pub fn interpolate(waypoints: &[Coordinates], points_per_segment: usize) -> Vec<[f64; 2]> {
    let steps = points_per_segment.max(2) - 1;
    let mut path = Vec::with_capacity(waypoints.len().saturating_sub(1) * steps + 1);

    for (i, pair) in waypoints.windows(2).enumerate() {
        let (from, to) = (pair[0], pair[1]);
        let skip_first = usize::from(i > 0);
        for step in skip_first..steps {
            let t = step as f64 / steps as f64;
            path.push([
                from.longitude + (to.longitude - from.longitude) * t,
                from.latitude + (to.latitude - from.latitude) * t,
            ]);
        }
        // exact endpoint, not subject to rounding
        path.push(to.to_lon_lat());
    }

    if path.is_empty()
        && let Some(only) = waypoints.first()
    {
        path.push(only.to_lon_lat());
    }
    path
}

/// Sum of great-circle distances between consecutive waypoints
#[must_use]
pub fn total_distance_km(waypoints: &[Coordinates]) -> f64 {
    waypoints
        .windows(2)
        .map(|pair| pair[0].distance_km(&pair[1]))
        .sum()
}

/// Fallback route through `waypoints`
#[must_use]
pub fn geodesic_route(waypoints: &[Coordinates], points_per_segment: usize) -> RouteResult {
    RouteResult {
        path: interpolate(waypoints, points_per_segment),
        source: RouteSource::Geodesic,
        distance_km: total_distance_km(waypoints),
        duration_seconds: None,
    }
}
