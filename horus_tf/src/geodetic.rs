//! Geodetic (latitude/longitude) <-> UTM conversions
//!
//! WGS-84 transverse Mercator series expansion. Accurate to millimeters
//! inside a zone, which is far below GNSS noise.

use serde::{Deserialize, Serialize};
use std::fmt;

/// WGS-84 equatorial radius in meters
const WGS84_A: f64 = 6_378_137.0;
/// WGS-84 first eccentricity squared
const WGS84_E2: f64 = 0.006_694_38;
/// UTM scale factor on the central meridian
const UTM_K0: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
/// Added to southern hemisphere northings
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Latitude bands from 80S to 84N, 8 degrees each (X is 12)
const LATITUDE_BANDS: &[u8] = b"CDEFGHJKLMNPQRSTUVWX";

/// A UTM zone: longitude zone number plus latitude band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UtmZone {
    /// Longitude zone, 1 to 60
    pub number: u8,
    /// Latitude band letter, `'Z'` outside the UTM latitude limits
    pub band: char,
    /// Hemisphere, needed to undo the southern false northing
    pub northern: bool,
}

impl UtmZone {
    /// Zone containing the given coordinate
    pub fn from_lat_lon(lat: f64, lon: f64) -> Self {
        let lon = normalize_longitude(lon);
        let mut number = ((lon + 180.0) / 6.0).floor() as i32 + 1;

        // Southwest Norway
        if (56.0..64.0).contains(&lat) && (3.0..12.0).contains(&lon) {
            number = 32;
        }

        // Svalbard
        if (72.0..84.0).contains(&lat) {
            number = match lon {
                l if (0.0..9.0).contains(&l) => 31,
                l if (9.0..21.0).contains(&l) => 33,
                l if (21.0..33.0).contains(&l) => 35,
                l if (33.0..42.0).contains(&l) => 37,
                _ => number,
            };
        }

        Self {
            number: number.clamp(1, 60) as u8,
            band: latitude_band(lat),
            northern: lat >= 0.0,
        }
    }

    /// Longitude of the zone's central meridian in degrees
    pub fn central_meridian(&self) -> f64 {
        (self.number as f64 - 1.0) * 6.0 - 180.0 + 3.0
    }
}

impl fmt::Display for UtmZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.number, self.band)
    }
}

/// A projected coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UtmCoordinate {
    pub easting: f64,
    pub northing: f64,
    pub zone: UtmZone,
}

/// Latitude band letter for a latitude in degrees
pub fn latitude_band(lat: f64) -> char {
    if !(-80.0..=84.0).contains(&lat) {
        return 'Z';
    }
    let index = (((lat + 80.0) / 8.0).floor() as usize).min(LATITUDE_BANDS.len() - 1);
    LATITUDE_BANDS[index] as char
}

/// Convert latitude/longitude (degrees) to UTM in the zone containing the point
pub fn ll_to_utm(lat: f64, lon: f64) -> UtmCoordinate {
    let zone = UtmZone::from_lat_lon(lat, lon);
    let (easting, northing) = ll_to_utm_in_zone(lat, lon, &zone);
    UtmCoordinate {
        easting,
        northing,
        zone,
    }
}

/// Convert latitude/longitude (degrees) to UTM in a given zone
///
/// Points outside `zone` are projected onto its central meridian's
/// cylinder, which stays continuous across the zone border.
pub fn ll_to_utm_in_zone(lat: f64, lon: f64, zone: &UtmZone) -> (f64, f64) {
    let ecc_prime_sq = WGS84_E2 / (1.0 - WGS84_E2);
    let lat_rad = lat.to_radians();
    let lon_rad = normalize_longitude(lon).to_radians();
    let origin_rad = zone.central_meridian().to_radians();

    let (sin_lat, cos_lat) = lat_rad.sin_cos();
    let tan_lat = lat_rad.tan();

    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    let t = tan_lat * tan_lat;
    let c = ecc_prime_sq * cos_lat * cos_lat;
    let a = cos_lat * (lon_rad - origin_rad);
    let m = meridian_arc(lat_rad);

    let easting = UTM_K0
        * n
        * (a + (1.0 - t + c) * a.powi(3) / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ecc_prime_sq) * a.powi(5) / 120.0)
        + FALSE_EASTING;

    let mut northing = UTM_K0
        * (m + n
            * tan_lat
            * (a * a / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ecc_prime_sq) * a.powi(6)
                    / 720.0));

    if !zone.northern {
        northing += FALSE_NORTHING_SOUTH;
    }

    (easting, northing)
}

/// Convert UTM easting/northing in `zone` back to latitude/longitude (degrees)
pub fn utm_to_ll(easting: f64, northing: f64, zone: &UtmZone) -> (f64, f64) {
    let ecc_prime_sq = WGS84_E2 / (1.0 - WGS84_E2);
    let e1 = (1.0 - (1.0 - WGS84_E2).sqrt()) / (1.0 + (1.0 - WGS84_E2).sqrt());

    let x = easting - FALSE_EASTING;
    let y = if zone.northern {
        northing
    } else {
        northing - FALSE_NORTHING_SOUTH
    };

    let m = y / UTM_K0;
    let mu = m
        / (WGS84_A
            * (1.0 - WGS84_E2 / 4.0 - 3.0 * WGS84_E2.powi(2) / 64.0
                - 5.0 * WGS84_E2.powi(3) / 256.0));

    // Footpoint latitude
    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin();

    let (sin_phi1, cos_phi1) = phi1.sin_cos();
    let tan_phi1 = phi1.tan();
    let denom = 1.0 - WGS84_E2 * sin_phi1 * sin_phi1;

    let n1 = WGS84_A / denom.sqrt();
    let t1 = tan_phi1 * tan_phi1;
    let c1 = ecc_prime_sq * cos_phi1 * cos_phi1;
    let r1 = WGS84_A * (1.0 - WGS84_E2) / denom.powf(1.5);
    let d = x / (n1 * UTM_K0);

    let lat = phi1
        - (n1 * tan_phi1 / r1)
            * (d * d / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ecc_prime_sq) * d.powi(4)
                    / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                    - 252.0 * ecc_prime_sq
                    - 3.0 * c1 * c1)
                    * d.powi(6)
                    / 720.0);

    let lon = (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
        + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ecc_prime_sq + 24.0 * t1 * t1)
            * d.powi(5)
            / 120.0)
        / cos_phi1;

    (
        lat.to_degrees(),
        normalize_longitude(zone.central_meridian() + lon.to_degrees()),
    )
}

/// Meridian arc length from the equator
fn meridian_arc(lat_rad: f64) -> f64 {
    let e2 = WGS84_E2;
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    WGS84_A
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat_rad
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat_rad).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat_rad).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * lat_rad).sin())
}

/// Wrap a longitude into [-180, 180)
fn normalize_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_central_meridian_on_equator() {
        let utm = ll_to_utm(0.0, 3.0);
        assert_eq!(utm.zone.number, 31);
        assert_relative_eq!(utm.easting, 500_000.0, epsilon = 1e-6);
        assert_relative_eq!(utm.northing, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_known_points() {
        let prague = ll_to_utm(50.0, 14.4);
        assert_eq!(prague.zone.to_string(), "33U");
        assert_relative_eq!(prague.easting, 456_999.89, epsilon = 0.5);
        assert_relative_eq!(prague.northing, 5_538_803.18, epsilon = 0.5);

        let sydney = ll_to_utm(-33.8688, 151.2093);
        assert_eq!(sydney.zone.to_string(), "56H");
        assert!(!sydney.zone.northern);
        assert_relative_eq!(sydney.easting, 334_368.6, epsilon = 1.0);
        assert_relative_eq!(sydney.northing, 6_250_948.3, epsilon = 1.0);
    }

    #[test]
    fn test_round_trip() {
        for (lat, lon) in [
            (50.0876, 14.4213),
            (-33.8688, 151.2093),
            (40.689247, -74.044502),
            (78.2232, 15.6267),
        ] {
            let utm = ll_to_utm(lat, lon);
            let (lat2, lon2) = utm_to_ll(utm.easting, utm.northing, &utm.zone);
            assert_relative_eq!(lat, lat2, epsilon = 1e-7);
            assert_relative_eq!(lon, lon2, epsilon = 1e-7);
        }
    }

    #[test]
    fn test_zone_exceptions() {
        // Bergen sits in the widened zone 32V
        let bergen = UtmZone::from_lat_lon(60.39, 5.32);
        assert_eq!(bergen.to_string(), "32V");

        // Longyearbyen, Svalbard
        let svalbard = UtmZone::from_lat_lon(78.22, 15.63);
        assert_eq!(svalbard.number, 33);
        assert_eq!(svalbard.band, 'X');
    }

    #[test]
    fn test_bands() {
        assert_eq!(latitude_band(-80.0), 'C');
        assert_eq!(latitude_band(0.0), 'N');
        assert_eq!(latitude_band(-0.1), 'M');
        assert_eq!(latitude_band(83.9), 'X');
        assert_eq!(latitude_band(85.0), 'Z');
    }

    #[test]
    fn test_projection_in_neighbor_zone() {
        // A point just across the border projected in the anchor's zone
        let zone = UtmZone::from_lat_lon(50.0, 17.9);
        let (e, n) = ll_to_utm_in_zone(50.0, 18.1, &zone);
        let (lat, lon) = utm_to_ll(e, n, &zone);
        assert_relative_eq!(lat, 50.0, epsilon = 1e-7);
        assert_relative_eq!(lon, 18.1, epsilon = 1e-7);
    }
}
