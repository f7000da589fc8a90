//! World positions and the flat-earth projection.

/// A particle position: `[longitude, latitude, depth]`.
///
/// Longitude and latitude are in decimal degrees; depth is in meters,
/// zero at the surface and positive downward.
pub type WorldPoint = [f64; 3];

/// Local flat-earth conversion between meters and degrees.
///
/// One degree of latitude is 60 nautical miles. Longitude degrees shrink
/// with `cos(latitude)` of the reference position. Adequate for the
/// per-step displacements movers produce; not meant for long distances.
#[derive(Clone, Copy, Debug)]
pub struct FlatEarth;

impl FlatEarth {
    /// Meters per degree of latitude (60 nmi).
    pub const METERS_PER_DEGREE: f64 = 1852.0 * 60.0;

    /// Convert a displacement in meters `(dx, dy, dz)` at `reference`
    /// into `(dlon, dlat, dz)`. The vertical component passes through.
    pub fn meters_to_lonlat(delta: [f64; 3], reference: &WorldPoint) -> [f64; 3] {
        let cos_lat = reference[1].to_radians().cos();
        [
            delta[0] / (Self::METERS_PER_DEGREE * cos_lat),
            delta[1] / Self::METERS_PER_DEGREE,
            delta[2],
        ]
    }

    /// Inverse of [`meters_to_lonlat`](Self::meters_to_lonlat).
    pub fn lonlat_to_meters(delta: [f64; 3], reference: &WorldPoint) -> [f64; 3] {
        let cos_lat = reference[1].to_radians().cos();
        [
            delta[0] * Self::METERS_PER_DEGREE * cos_lat,
            delta[1] * Self::METERS_PER_DEGREE,
            delta[2],
        ]
    }

    /// Row-wise [`meters_to_lonlat`](Self::meters_to_lonlat) in place.
    ///
    /// `deltas` and `references` must have the same length; extra rows
    /// in either are ignored.
    pub fn meters_to_lonlat_in_place(deltas: &mut [[f64; 3]], references: &[WorldPoint]) {
        for (d, p) in deltas.iter_mut().zip(references) {
            *d = Self::meters_to_lonlat(*d, p);
        }
    }
}
