pub const ARCSEC_PER_DEG: f64 = 3600.0;

pub fn arcsec_to_rad(arcsec: f64) -> f64 {
    (arcsec / ARCSEC_PER_DEG).to_radians()
}

pub fn rad_to_arcsec(rad: f64) -> f64 {
    rad.to_degrees() * ARCSEC_PER_DEG
}

/// Wrap an angle in degrees into \[0, 360).
pub fn wrap_360(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

/// Wrap an angle in degrees into (-180, 180\].
pub fn wrap_180(deg: f64) -> f64 {
    let wrapped = wrap_360(deg);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

pub fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_wrap() {
        assert_eq!(wrap_360(-90.0), 270.0);
        assert_eq!(wrap_360(720.0), 0.0);
        assert_eq!(wrap_180(270.0), -90.0);
        assert_eq!(wrap_180(180.0), 180.0);
        assert_eq!(wrap_180(-180.0), 180.0);
    }

    #[test]
    fn test_arcsec_round_trip() {
        let rad = arcsec_to_rad(3600.0);
        assert!((rad - 1f64.to_radians()).abs() < 1e-15);
        assert!((rad_to_arcsec(rad) - 3600.0).abs() < 1e-9);
    }
}
