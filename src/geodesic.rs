//! Great-circle distance on a spherical Earth.

use geo::{point, HaversineDistance};

/// Haversine distance in metres between two `(latitude, longitude)` pairs
/// given in degrees.
///
/// Uses the mean Earth radius of the `geo` crate (6 371 008.8 m). Inputs are
/// expected to be finite and within range; the track point parser rejects
/// anything else before it gets here.
pub fn haversine_distance(from: (f64, f64), to: (f64, f64)) -> f64 {
    let a = point!(x: from.1, y: from.0);
    let b = point!(x: to.1, y: to.0);
    a.haversine_distance(&b)
}
