//! Positions marked on a blank map.
//!
//! Builds an all-zero image, attaches a helioprojective header for the
//! configured observer, then plots the transparent map with the solar limb,
//! a Stonyhurst grid and one marker per configured position.

use std::path::Path;

use ndarray::Array2;
use tracing::info;

use crate::{
    config::BlankMapConfig,
    coordinates::SkyCoord,
    error::Result,
    header::{make_fitswcs_header, HeaderOptions},
    map::GenericMap,
    plot::Figure,
    time::ObsTime,
};

pub struct BlankMapScene {
    map: GenericMap,
    marks: Vec<SkyCoord>,
    marked_pixels: Vec<Option<(f64, f64)>>,
    figure: Figure,
}

impl BlankMapScene {
    pub fn build(config: &BlankMapConfig) -> Result<Self> {
        let data = Array2::<f64>::zeros(config.shape);

        let obstime = ObsTime::parse(&config.obstime)?;
        let reference = SkyCoord::new(
            config.reference.0,
            config.reference.1,
            obstime,
            config.observer,
        );
        let header = make_fitswcs_header(
            data.dim(),
            &reference,
            &HeaderOptions::default().with_scale(config.scale.0, config.scale.1),
        )?;
        let map = GenericMap::new(data, header)?;
        info!(
            obstime = %map.date(),
            rsun_obs = map.rsun_obs(),
            "built blank map"
        );

        let marks = SkyCoord::in_frame(&config.marks, map.coordinate_frame());

        let (width, height) = config.figure_size;
        let mut figure = Figure::new(width, height)?;
        let marked_pixels = {
            let mut axes = figure.add_map_axes(&map)?;
            axes.plot_map(config.data_alpha)?;
            axes.draw_limb(config.limb_color);
            axes.draw_grid(config.grid_color, config.grid_spacing_deg)?;
            let marked = axes.plot_coord(&marks, config.marker, config.marker_color);
            axes.set_title(&config.title);
            marked
        };

        Ok(Self {
            map,
            marks,
            marked_pixels,
            figure,
        })
    }

    pub fn map(&self) -> &GenericMap {
        &self.map
    }

    pub fn marks(&self) -> &[SkyCoord] {
        &self.marks
    }

    /// 0-based map pixel of each mark, `None` where it fell off the map.
    pub fn marked_pixels(&self) -> &[Option<(f64, f64)>] {
        &self.marked_pixels
    }

    pub fn figure(&self) -> &Figure {
        &self.figure
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.figure.save_png(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{coordinates::Observer, ephemeris::sun_earth_distance, error::MapError};

    #[test]
    fn test_default_scene() {
        let scene = BlankMapScene::build(&BlankMapConfig::default()).unwrap();

        let map = scene.map();
        assert_eq!(map.data().dim(), (1000, 1000));
        assert!(map.data().iter().all(|&v| v == 0.0));
        assert_eq!(map.scale(), (2.0, 2.0));
        assert_eq!(map.date().to_fits_string(), "2013-10-28T00:00:00.000");
        let earth = Observer::Earth.resolve(&map.date());
        assert_eq!(map.observer_coordinate(), earth);
        assert_eq!(map.dsun(), sun_earth_distance(&map.date()));
        assert!(scene.marks().iter().all(|m| m.frame == *map.coordinate_frame()));

        assert_eq!(scene.marks().len(), 3);
        let expected = [(499.5, 499.5), (524.5, 549.5), (699.5, 699.5)];
        for (placed, (ex, ey)) in scene.marked_pixels().iter().zip(expected) {
            let (x, y) = placed.unwrap();
            assert!((x - ex).abs() < 0.01, "x = {}", x);
            assert!((y - ey).abs() < 0.01, "y = {}", y);
        }

        assert_eq!(
            scene.figure().title(),
            Some("Plotting random points on a blank map")
        );
        assert_eq!(scene.figure().width(), 800);
    }

    #[test]
    fn test_scene_is_deterministic() {
        let config = BlankMapConfig::default();
        let a = BlankMapScene::build(&config).unwrap();
        let b = BlankMapScene::build(&config).unwrap();
        assert_eq!(a.map().data(), b.map().data());
        assert_eq!(a.map(), b.map());
        assert_eq!(
            a.figure().encode_png().unwrap(),
            b.figure().encode_png().unwrap()
        );
    }

    #[test]
    fn test_out_of_view_mark_is_reported() {
        let config = BlankMapConfig {
            marks: vec![(0.0, 0.0), (1500.0, 0.0)],
            ..BlankMapConfig::default()
        };
        let scene = BlankMapScene::build(&config).unwrap();
        assert!(scene.marked_pixels()[0].is_some());
        assert!(scene.marked_pixels()[1].is_none());
    }

    #[test]
    fn test_bad_obstime() {
        let config = BlankMapConfig {
            obstime: "not a date".to_string(),
            ..BlankMapConfig::default()
        };
        assert!(matches!(
            BlankMapScene::build(&config),
            Err(MapError::InvalidTime(_))
        ));
    }

    #[test]
    fn test_save_png() {
        let scene = BlankMapScene::build(&BlankMapConfig::default()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank_map.png");
        scene.save_png(&path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes, scene.figure().encode_png().unwrap());
    }
}
