//! Low-precision solar ephemeris.
//!
//! Geometric quantities for an Earth-based observer following the
//! low-accuracy solar coordinates and the solar disk ephemeris of Meeus,
//! *Astronomical Algorithms* (2nd ed.), chapters 25 and 29. Good to a few
//! hundredths of a degree, which is far below a pixel at solar image scales.

use tracing::debug;

use crate::{coordinates::HeliographicStonyhurst, internal_util::wrap_360, time::ObsTime};

/// Astronomical unit in metres (IAU 2012).
pub const AU: f64 = 149_597_870_700.0;

/// Inclination of the solar equator on the ecliptic, degrees.
const SOLAR_EQUATOR_INCLINATION: f64 = 7.25;

struct SolarLongitude {
    /// Apparent geocentric ecliptic longitude of the Sun, degrees.
    apparent: f64,
    /// Sun-Earth distance, AU.
    radius_au: f64,
}

fn solar_longitude(t: &ObsTime) -> SolarLongitude {
    let c = t.julian_centuries();

    let mean_longitude = 280.46646 + 36_000.769_83 * c + 0.000_303_2 * c * c;
    let mean_anomaly = 357.529_11 + 35_999.050_29 * c - 0.000_153_7 * c * c;
    let eccentricity = 0.016_708_634 - 0.000_042_037 * c - 0.000_000_126_7 * c * c;

    let m = mean_anomaly.to_radians();
    let equation_of_centre = (1.914_602 - 0.004_817 * c - 0.000_014 * c * c) * m.sin()
        + (0.019_993 - 0.000_101 * c) * (2.0 * m).sin()
        + 0.000_289 * (3.0 * m).sin();

    let true_longitude = mean_longitude + equation_of_centre;
    let true_anomaly = (mean_anomaly + equation_of_centre).to_radians();

    let radius_au = 1.000_001_018 * (1.0 - eccentricity * eccentricity)
        / (1.0 + eccentricity * true_anomaly.cos());

    let omega = (125.04 - 1_934.136 * c).to_radians();
    let apparent = wrap_360(true_longitude - 0.005_69 - 0.004_78 * omega.sin());

    SolarLongitude {
        apparent,
        radius_au,
    }
}

/// Apparent geocentric ecliptic longitude of the Sun in degrees.
pub fn solar_apparent_longitude(t: &ObsTime) -> f64 {
    solar_longitude(t).apparent
}

/// Sun-Earth distance in metres.
pub fn sun_earth_distance(t: &ObsTime) -> f64 {
    solar_longitude(t).radius_au * AU
}

/// Heliographic latitude of the centre of the solar disk as seen from Earth,
/// in degrees.
pub fn solar_b0(t: &ObsTime) -> f64 {
    let node = 73.6667 + 1.395_833_3 * (t.julian_day() - 2_396_758.0) / 36_525.0;
    let lambda = solar_apparent_longitude(t);
    let sin_b0 = (lambda - node).to_radians().sin() * SOLAR_EQUATOR_INCLINATION.to_radians().sin();
    sin_b0.asin().to_degrees()
}

/// Position of the Earth in heliographic Stonyhurst coordinates.
///
/// Stonyhurst longitude is zero toward the Earth by construction.
pub fn earth_observer(t: &ObsTime) -> HeliographicStonyhurst {
    let observer = HeliographicStonyhurst::new(0.0, solar_b0(t), sun_earth_distance(t));
    debug!(
        obstime = %t,
        b0 = observer.lat,
        dsun_au = observer.radius / AU,
        "resolved earth observer"
    );
    observer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solar_longitude_meeus_example() {
        // Meeus example 25.a, 1992 October 13.0 TD.
        let t = ObsTime::parse("1992-10-13").unwrap();
        let sun = solar_longitude(&t);
        assert!((sun.apparent - 199.90895).abs() < 0.01);
        assert!((sun.radius_au - 0.99766).abs() < 1e-4);
    }

    #[test]
    fn test_b0_seasonal_extremes() {
        // B0 peaks near +7.25 deg in early September and -7.25 deg in early March.
        let september = solar_b0(&ObsTime::parse("2013-09-07").unwrap());
        let march = solar_b0(&ObsTime::parse("2013-03-06").unwrap());
        assert!(september > 7.0 && september < 7.3);
        assert!(march < -7.0 && march > -7.3);
    }

    #[test]
    fn test_earth_observer_2013_10_28() {
        let observer = earth_observer(&ObsTime::parse("2013-10-28").unwrap());
        assert_eq!(observer.lon, 0.0);
        assert!(observer.lat > 4.6 && observer.lat < 4.9, "b0 = {}", observer.lat);
        let dsun_au = observer.radius / AU;
        assert!(dsun_au > 0.992 && dsun_au < 0.995, "dsun = {}", dsun_au);
    }
}
