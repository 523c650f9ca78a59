//! Solar coordinate frames.
//!
//! Heliographic Stonyhurst (HGS) positions are spherical coordinates centred
//! on the Sun with longitude zero toward the Earth. Helioprojective (HPC)
//! positions are the angles (Tx, Ty) measured by an observer from the
//! direction of Sun centre, with Ty along the projected solar north.
//! Conversions go through heliocentric cartesian coordinates (x west, y
//! north, z toward the observer), following Thompson (2006), A&A 449, 791.

use std::f64::consts::TAU;

use crate::{
    ephemeris::earth_observer,
    internal_util::{arcsec_to_rad, dot, rad_to_arcsec, wrap_180},
    time::ObsTime,
};

/// Nominal solar radius in metres (IAU 2015 B3).
pub const RSUN_REF: f64 = 695_700_000.0;

/// Heliographic Stonyhurst coordinate. Angles in degrees, radius in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct HeliographicStonyhurst {
    pub lon: f64,
    pub lat: f64,
    pub radius: f64,
}

impl HeliographicStonyhurst {
    pub fn new(lon: f64, lat: f64, radius: f64) -> Self {
        Self { lon, lat, radius }
    }

    /// A point on the solar surface.
    pub fn on_surface(lon: f64, lat: f64) -> Self {
        Self::new(lon, lat, RSUN_REF)
    }
}

/// Helioprojective coordinate in arcseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Helioprojective {
    pub tx: f64,
    pub ty: f64,
}

impl Helioprojective {
    pub fn new(tx: f64, ty: f64) -> Self {
        Self { tx, ty }
    }

    pub fn is_finite(&self) -> bool {
        self.tx.is_finite() && self.ty.is_finite()
    }
}

/// Where the observer of a helioprojective frame sits.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Observer {
    Earth,
    Coordinate(HeliographicStonyhurst),
}

impl Observer {
    pub fn resolve(&self, obstime: &ObsTime) -> HeliographicStonyhurst {
        match self {
            Observer::Earth => earth_observer(obstime),
            Observer::Coordinate(coord) => *coord,
        }
    }
}

/// Helioprojective frame: an observation time, a resolved observer position
/// and the solar radius used for limb and surface computations.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct HelioprojectiveFrame {
    pub obstime: ObsTime,
    pub observer: HeliographicStonyhurst,
    pub rsun: f64,
}

impl HelioprojectiveFrame {
    pub fn new(obstime: ObsTime, observer: Observer) -> Self {
        Self {
            obstime,
            observer: observer.resolve(&obstime),
            rsun: RSUN_REF,
        }
    }

    pub fn with_rsun(mut self, rsun: f64) -> Self {
        self.rsun = rsun;
        self
    }

    /// Heliocentric cartesian position (metres) of a heliographic point.
    fn to_heliocentric(&self, point: &HeliographicStonyhurst) -> [f64; 3] {
        let b0 = self.observer.lat.to_radians();
        let dlon = (point.lon - self.observer.lon).to_radians();
        let lat = point.lat.to_radians();
        let r = point.radius;

        [
            r * lat.cos() * dlon.sin(),
            r * (lat.sin() * b0.cos() - lat.cos() * dlon.cos() * b0.sin()),
            r * (lat.sin() * b0.sin() + lat.cos() * dlon.cos() * b0.cos()),
        ]
    }

    /// Project a heliographic point into this frame.
    ///
    /// The flag is true when the point lies on the hemisphere facing the
    /// observer (`z > R^2 / D`).
    pub fn from_heliographic(&self, point: &HeliographicStonyhurst) -> (Helioprojective, bool) {
        let [x, y, z] = self.to_heliocentric(point);
        let dobs = self.observer.radius;
        let distance = (x * x + y * y + (dobs - z).powi(2)).sqrt();

        let tx = x.atan2(dobs - z);
        let ty = (y / distance).asin();
        let visible = z * dobs > self.rsun * self.rsun;

        (
            Helioprojective::new(rad_to_arcsec(tx), rad_to_arcsec(ty)),
            visible,
        )
    }

    /// Intersect the line of sight through `coord` with the solar surface.
    /// Returns `None` off the disk.
    pub fn to_heliographic(&self, coord: &Helioprojective) -> Option<HeliographicStonyhurst> {
        let tx = arcsec_to_rad(coord.tx);
        let ty = arcsec_to_rad(coord.ty);
        let dobs = self.observer.radius;

        let origin = [0.0, 0.0, dobs];
        let direction = [ty.cos() * tx.sin(), ty.sin(), -ty.cos() * tx.cos()];

        let b = dot(&origin, &direction);
        let discriminant = b * b - (dobs * dobs - self.rsun * self.rsun);
        if discriminant < 0.0 {
            return None;
        }
        let s = -b - discriminant.sqrt();
        let [x, y, z] = [
            origin[0] + s * direction[0],
            origin[1] + s * direction[1],
            origin[2] + s * direction[2],
        ];

        let b0 = self.observer.lat.to_radians();
        let lat = ((y * b0.cos() + z * b0.sin()) / self.rsun).clamp(-1.0, 1.0).asin();
        let dlon = x.atan2(z * b0.cos() - y * b0.sin());

        Some(HeliographicStonyhurst::new(
            wrap_180(self.observer.lon + dlon.to_degrees()),
            lat.to_degrees(),
            self.rsun,
        ))
    }

    /// Apparent angular radius of the solar disk in arcseconds.
    pub fn angular_radius(&self) -> f64 {
        rad_to_arcsec((self.rsun / self.observer.radius).asin())
    }

    /// `n` points tracing the limb, counter-clockwise from solar west.
    pub fn limb(&self, n: usize) -> Vec<Helioprojective> {
        let alpha = (self.rsun / self.observer.radius).asin();
        (0..n)
            .map(|i| {
                let theta = TAU * i as f64 / n as f64;
                let tx = (alpha.sin() * theta.cos()).atan2(alpha.cos());
                let ty = (alpha.sin() * theta.sin()).asin();
                Helioprojective::new(rad_to_arcsec(tx), rad_to_arcsec(ty))
            })
            .collect()
    }
}

/// A helioprojective coordinate tied to the frame it was measured in.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SkyCoord {
    pub coord: Helioprojective,
    pub frame: HelioprojectiveFrame,
}

impl SkyCoord {
    pub fn new(tx: f64, ty: f64, obstime: ObsTime, observer: Observer) -> Self {
        Self {
            coord: Helioprojective::new(tx, ty),
            frame: HelioprojectiveFrame::new(obstime, observer),
        }
    }

    pub fn from_frame(tx: f64, ty: f64, frame: HelioprojectiveFrame) -> Self {
        Self {
            coord: Helioprojective::new(tx, ty),
            frame,
        }
    }

    /// Build one coordinate per `(tx, ty)` pair, all in `frame`.
    pub fn in_frame(points: &[(f64, f64)], frame: &HelioprojectiveFrame) -> Vec<Self> {
        points
            .iter()
            .map(|&(tx, ty)| Self::from_frame(tx, ty, *frame))
            .collect()
    }

    /// Express this coordinate in another helioprojective frame.
    ///
    /// Between different observers the point is taken to lie on the solar
    /// surface; `None` when it is off the disk or hidden from the new
    /// observer.
    pub fn transform_to(&self, frame: &HelioprojectiveFrame) -> Option<Self> {
        if self.frame.observer == frame.observer {
            return Some(Self::from_frame(self.coord.tx, self.coord.ty, *frame));
        }
        let surface = self.frame.to_heliographic(&self.coord)?;
        let (coord, visible) = frame.from_heliographic(&surface);
        visible.then_some(Self {
            coord,
            frame: *frame,
        })
    }

    pub fn tx(&self) -> f64 {
        self.coord.tx
    }

    pub fn ty(&self) -> f64 {
        self.coord.ty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::AU;

    fn earth_frame() -> HelioprojectiveFrame {
        HelioprojectiveFrame::new(ObsTime::parse("2013-10-28").unwrap(), Observer::Earth)
    }

    fn fixed_frame(b0: f64) -> HelioprojectiveFrame {
        HelioprojectiveFrame::new(
            ObsTime::parse("2013-10-28").unwrap(),
            Observer::Coordinate(HeliographicStonyhurst::new(0.0, b0, AU)),
        )
    }

    #[test]
    fn test_disk_centre_projects_to_origin() {
        let frame = earth_frame();
        let centre = HeliographicStonyhurst::on_surface(0.0, frame.observer.lat);
        let (hpc, visible) = frame.from_heliographic(&centre);
        assert!(visible);
        assert!(hpc.tx.abs() < 1e-9);
        assert!(hpc.ty.abs() < 1e-9);
    }

    #[test]
    fn test_far_side_is_hidden() {
        let frame = earth_frame();
        let (_, visible) = frame.from_heliographic(&HeliographicStonyhurst::on_surface(180.0, 0.0));
        assert!(!visible);
        let (_, visible) = frame.from_heliographic(&HeliographicStonyhurst::on_surface(89.9, 0.0));
        assert!(!visible);
        let (_, visible) = frame.from_heliographic(&HeliographicStonyhurst::on_surface(80.0, 0.0));
        assert!(visible);
    }

    #[test]
    fn test_west_and_north_signs() {
        let frame = fixed_frame(0.0);
        let (west, _) = frame.from_heliographic(&HeliographicStonyhurst::on_surface(30.0, 0.0));
        assert!(west.tx > 0.0);
        assert!(west.ty.abs() < 1e-9);
        let (north, _) = frame.from_heliographic(&HeliographicStonyhurst::on_surface(0.0, 30.0));
        assert!(north.ty > 0.0);
        assert!(north.tx.abs() < 1e-9);
    }

    #[test]
    fn test_heliographic_inverse() {
        let frame = earth_frame();
        for &(lon, lat) in &[(0.0, 0.0), (25.0, -10.0), (-60.0, 45.0), (10.0, 70.0)] {
            let point = HeliographicStonyhurst::on_surface(lon, lat);
            let (hpc, visible) = frame.from_heliographic(&point);
            assert!(visible);
            let back = frame.to_heliographic(&hpc).unwrap();
            assert!((back.lon - lon).abs() < 1e-6, "{} vs {}", back.lon, lon);
            assert!((back.lat - lat).abs() < 1e-6, "{} vs {}", back.lat, lat);
        }
    }

    #[test]
    fn test_off_disk_has_no_surface_point() {
        let frame = earth_frame();
        assert!(frame
            .to_heliographic(&Helioprojective::new(1500.0, 0.0))
            .is_none());
    }

    #[test]
    fn test_limb_radius() {
        let frame = fixed_frame(0.0);
        // asin(R_sun / 1 AU) is about 959.2 arcsec.
        let radius = frame.angular_radius();
        assert!((radius - 959.2).abs() < 0.5, "radius = {}", radius);

        for point in frame.limb(64) {
            let r = (point.tx.powi(2) + point.ty.powi(2)).sqrt();
            assert!((r - radius).abs() < 0.05);
        }
    }

    #[test]
    fn test_transform_between_observers() {
        let earth = earth_frame();
        let west_observer = HelioprojectiveFrame::new(
            earth.obstime,
            Observer::Coordinate(HeliographicStonyhurst::new(60.0, 0.0, AU)),
        );

        let centre = SkyCoord::from_frame(0.0, 0.0, earth);
        let seen = centre.transform_to(&west_observer).unwrap();
        // Earth's disk centre sits east of the western observer's disk centre.
        assert!(seen.tx() < 0.0);
        assert_eq!(seen.frame, west_observer);

        let same = centre.transform_to(&earth).unwrap();
        assert_eq!(same, centre);

        let off_disk = SkyCoord::from_frame(2000.0, 0.0, earth);
        assert!(off_disk.transform_to(&west_observer).is_none());
    }

    #[test]
    fn test_in_frame_keeps_order() {
        let frame = earth_frame();
        let coords = SkyCoord::in_frame(&[(0.0, 0.0), (50.0, 100.0), (400.0, 400.0)], &frame);
        assert_eq!(coords.len(), 3);
        assert_eq!(coords[1].tx(), 50.0);
        assert_eq!(coords[2].ty(), 400.0);
        assert!(coords.iter().all(|c| c.frame == frame));
    }
}
