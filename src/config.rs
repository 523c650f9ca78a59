use crate::{
    coordinates::Observer,
    plot::{Color, Marker},
};

/// Everything the blank-map plot is built from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct BlankMapConfig {
    /// Image shape as (rows, columns).
    pub shape: (usize, usize),
    /// Pixel scale in arcsec/pixel along (x, y).
    pub scale: (f64, f64),
    /// Helioprojective coordinate of the image centre, arcsec.
    pub reference: (f64, f64),
    pub obstime: String,
    pub observer: Observer,
    /// Helioprojective positions to mark, arcsec.
    pub marks: Vec<(f64, f64)>,
    pub marker: Marker,
    pub marker_color: Color,
    pub limb_color: Color,
    pub grid_color: Color,
    pub grid_spacing_deg: f64,
    pub data_alpha: f32,
    pub title: String,
    pub figure_size: (u32, u32),
}

impl Default for BlankMapConfig {
    fn default() -> Self {
        Self {
            shape: (1000, 1000),
            // puts the whole solar limb inside the field of view
            scale: (2.0, 2.0),
            reference: (0.0, 0.0),
            obstime: "2013-10-28".to_string(),
            observer: Observer::Earth,
            marks: vec![(0.0, 0.0), (50.0, 100.0), (400.0, 400.0)],
            marker: Marker::Circle,
            marker_color: Color::TAB_BLUE,
            limb_color: Color::BLACK,
            grid_color: Color::BLACK,
            grid_spacing_deg: 15.0,
            data_alpha: 0.0,
            title: "Plotting random points on a blank map".to_string(),
            figure_size: (800, 800),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BlankMapConfig::default();
        assert_eq!(config.shape, (1000, 1000));
        assert_eq!(config.scale, (2.0, 2.0));
        assert_eq!(config.observer, Observer::Earth);
        assert_eq!(
            config.marks,
            vec![(0.0, 0.0), (50.0, 100.0), (400.0, 400.0)]
        );
        assert_eq!(config.data_alpha, 0.0);
    }

    #[cfg(feature = "serialize")]
    #[test]
    fn test_serde_cbor() {
        let config = BlankMapConfig {
            marker: Marker::Plus,
            ..BlankMapConfig::default()
        };
        let bytes = serde_cbor::to_vec(&config).unwrap();
        let back: BlankMapConfig = serde_cbor::from_slice(&bytes).unwrap();
        assert_eq!(back, config);
    }
}
