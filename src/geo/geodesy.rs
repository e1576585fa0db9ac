/// Mean Earth radius used for the spherical model, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A point reached by [`destination`], in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DestinationPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Great-circle destination from a start point, initial bearing and distance.
///
/// Spherical Earth of radius [`EARTH_RADIUS_M`]. The result longitude is not
/// wrapped into `[-180, 180]`. NaN or infinite input propagates into the output.
///
/// # Example
/// ```rust
/// use photo_geotag::geo::destination;
///
/// let p = destination(-33.0, 146.5, 90.0, 100.0);
/// assert!(p.longitude > 146.5);
/// ```
pub fn destination(lat: f64, lon: f64, bearing: f64, distance: f64) -> DestinationPoint {
    let phi1 = lat.to_radians();
    let lambda1 = lon.to_radians();
    let theta = bearing.to_radians();
    let delta = distance / EARTH_RADIUS_M;

    let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
    let lambda2 = lambda1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * phi2.sin());

    DestinationPoint {
        latitude: phi2.to_degrees(),
        longitude: lambda2.to_degrees(),
    }
}
