//! Coordinates, map viewports, and great-circle distance.
//!
//! A [`Viewport`] is what the map reports: a center plus latitude/longitude
//! spans in degrees. The Search API works in bounding boxes, so every
//! viewport can be projected to a [`BoundingBox`] of center ± half-span.

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Arc length of one degree on a sphere of [`EARTH_RADIUS_KM`] (~111.19 km).
pub const KM_PER_DEGREE: f64 = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Builds a point, rejecting coordinates outside the WGS84 ranges.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCoordinate`] if `lat` is outside
    /// `[-90, 90]` or `lng` is outside `[-180, 180]` (NaN included).
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoreError> {
        let point = Self { lat, lng };
        if point.is_valid() {
            Ok(point)
        } else {
            Err(CoreError::InvalidCoordinate { lat, lng })
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Great-circle distance between two points in kilometres (haversine).
///
/// Symmetric, and zero only when both points are equal. Out-of-range input
/// does not panic; it may yield NaN.
#[must_use]
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    // Rounding can push h a hair above 1 for antipodal points. `f64::min`
    // would swallow NaN, so compare explicitly.
    let h = if h > 1.0 { 1.0 } else { h };
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Rectangular lat/lng range sent to the Search API.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub north_lat: f64,
    pub south_lat: f64,
    pub east_lng: f64,
    pub west_lng: f64,
}

/// The visible map region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub center: GeoPoint,
    /// Latitude span in degrees, always `> 0`.
    pub lat_span: f64,
    /// Longitude span in degrees, always `> 0`.
    pub lng_span: f64,
}

impl Viewport {
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCoordinate`] for an out-of-range center and
    /// [`CoreError::InvalidViewport`] when either span is not a finite,
    /// strictly positive number.
    pub fn new(center: GeoPoint, lat_span: f64, lng_span: f64) -> Result<Self, CoreError> {
        if !center.is_valid() {
            return Err(CoreError::InvalidCoordinate {
                lat: center.lat,
                lng: center.lng,
            });
        }
        for (name, span) in [("latitude", lat_span), ("longitude", lng_span)] {
            if !span.is_finite() || span <= 0.0 {
                return Err(CoreError::InvalidViewport(format!(
                    "{name} span must be a positive number, got {span}"
                )));
            }
        }
        Ok(Self {
            center,
            lat_span,
            lng_span,
        })
    }

    /// Viewport reaching `radius_km` from `center` in every direction.
    ///
    /// Longitude span widens with `1 / cos(lat)` so the box stays roughly
    /// square on the ground; it is capped at the full 360 degrees near the poles.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Viewport::new`]; a non-positive radius yields
    /// [`CoreError::InvalidViewport`].
    pub fn around(center: GeoPoint, radius_km: f64) -> Result<Self, CoreError> {
        let lat_span = 2.0 * radius_km / KM_PER_DEGREE;
        let lng_span = (lat_span / center.lat.to_radians().cos().abs()).min(360.0);
        Self::new(center, lat_span, lng_span)
    }

    #[must_use]
    pub fn min_span(&self) -> f64 {
        self.lat_span.min(self.lng_span)
    }

    /// Center ± half-span per axis, clamped to the valid coordinate ranges.
    ///
    /// Boxes are not wrapped across the antimeridian.
    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        let half_lat = self.lat_span / 2.0;
        let half_lng = self.lng_span / 2.0;
        BoundingBox {
            north_lat: (self.center.lat + half_lat).min(90.0),
            south_lat: (self.center.lat - half_lat).max(-90.0),
            east_lng: (self.center.lng + half_lng).min(180.0),
            west_lng: (self.center.lng - half_lng).max(-180.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint { lat, lng }
    }

    #[test]
    fn distance_is_zero_for_identical_points() {
        let p = pt(17.4, 78.5);
        assert!(distance_km(p, p).abs() < f64::EPSILON);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = pt(17.385, 78.486_7);
        let b = pt(12.971_6, 77.594_6);
        assert!((distance_km(a, b) - distance_km(b, a)).abs() < 1e-9);
    }

    #[test]
    fn distance_hyderabad_to_bangalore_is_about_500_km() {
        let d = distance_km(pt(17.385, 78.486_7), pt(12.971_6, 77.594_6));
        assert!((490.0..510.0).contains(&d), "got {d}");
    }

    #[test]
    fn one_degree_of_latitude_matches_km_per_degree() {
        let d = distance_km(pt(0.0, 0.0), pt(1.0, 0.0));
        assert!((d - KM_PER_DEGREE).abs() < 1e-6, "got {d}");
    }

    #[test]
    fn antipodal_points_do_not_produce_nan() {
        let d = distance_km(pt(0.0, 0.0), pt(0.0, 180.0));
        assert!(d.is_finite());
        assert!((d - EARTH_RADIUS_KM * std::f64::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn out_of_range_input_does_not_panic() {
        let d = distance_km(pt(f64::NAN, 0.0), pt(10.0, 10.0));
        assert!(d.is_nan());
    }

    #[test]
    fn geo_point_new_rejects_out_of_range() {
        assert!(GeoPoint::new(91.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, -180.5).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn viewport_new_rejects_non_positive_spans() {
        let c = pt(17.4, 78.5);
        assert!(matches!(
            Viewport::new(c, 0.0, 0.1),
            Err(CoreError::InvalidViewport(_))
        ));
        assert!(matches!(
            Viewport::new(c, 0.1, -1.0),
            Err(CoreError::InvalidViewport(_))
        ));
        assert!(matches!(
            Viewport::new(c, f64::INFINITY, 0.1),
            Err(CoreError::InvalidViewport(_))
        ));
        assert!(matches!(
            Viewport::new(pt(95.0, 0.0), 0.1, 0.1),
            Err(CoreError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn bounding_box_is_center_plus_minus_half_span() {
        let vp = Viewport::new(pt(17.40, 78.50), 0.10, 0.20).unwrap();
        let bbox = vp.bounding_box();
        assert!((bbox.north_lat - 17.45).abs() < 1e-9);
        assert!((bbox.south_lat - 17.35).abs() < 1e-9);
        assert!((bbox.east_lng - 78.60).abs() < 1e-9);
        assert!((bbox.west_lng - 78.40).abs() < 1e-9);
    }

    #[test]
    fn bounding_box_is_clamped_at_the_poles_and_antimeridian() {
        let vp = Viewport::new(pt(89.0, 179.0), 4.0, 4.0).unwrap();
        let bbox = vp.bounding_box();
        assert!((bbox.north_lat - 90.0).abs() < f64::EPSILON);
        assert!((bbox.east_lng - 180.0).abs() < f64::EPSILON);
        assert!((bbox.south_lat - 87.0).abs() < 1e-9);
    }

    #[test]
    fn around_spans_twice_the_radius() {
        let vp = Viewport::around(pt(0.0, 10.0), 10.0).unwrap();
        assert!((vp.lat_span * KM_PER_DEGREE - 20.0).abs() < 1e-9);
        // At the equator cos(lat) == 1, so both spans match.
        assert!((vp.lng_span - vp.lat_span).abs() < 1e-9);
    }

    #[test]
    fn around_widens_longitude_away_from_the_equator() {
        let vp = Viewport::around(pt(60.0, 10.0), 10.0).unwrap();
        assert!((vp.lng_span / vp.lat_span - 2.0).abs() < 1e-6);
    }

    #[test]
    fn around_rejects_zero_radius() {
        assert!(Viewport::around(pt(0.0, 0.0), 0.0).is_err());
    }

    #[test]
    fn viewport_serializes_camel_case() {
        let vp = Viewport::new(pt(1.0, 2.0), 0.5, 0.25).unwrap();
        let json = serde_json::to_value(vp).unwrap();
        assert_eq!(json["latSpan"], 0.5);
        assert_eq!(json["lngSpan"], 0.25);
        assert_eq!(json["center"]["lat"], 1.0);
    }
}
