use ndarray::Array2;
use tracing::debug;

use crate::{
    coordinates::{
        HeliographicStonyhurst, Helioprojective, HelioprojectiveFrame, Observer, SkyCoord,
        RSUN_REF,
    },
    error::{MapError, Result},
    header::MapHeader,
    time::ObsTime,
    wcs::Wcs,
};

/// An image paired with the helioprojective coordinate system it was taken
/// in. Data are indexed `[row, column]`, i.e. `[y, x]`.
#[derive(Debug, Clone)]
pub struct GenericMap {
    data: Array2<f64>,
    header: MapHeader,
    wcs: Wcs,
    frame: HelioprojectiveFrame,
}

fn frame_from_header(header: &MapHeader) -> Result<HelioprojectiveFrame> {
    let obstime = ObsTime::parse(&header.get_as::<String>("DATE-OBS")?)?;

    let observer_keys = ["HGLN_OBS", "HGLT_OBS", "DSUN_OBS"];
    let observer = if observer_keys.iter().all(|key| header.contains(key)) {
        Observer::Coordinate(HeliographicStonyhurst::new(
            header.get_as::<f64>("HGLN_OBS")?,
            header.get_as::<f64>("HGLT_OBS")?,
            header.get_as::<f64>("DSUN_OBS")?,
        ))
    } else {
        debug!("header carries no observer location, assuming earth");
        Observer::Earth
    };

    let rsun = if header.contains("RSUN_REF") {
        header.get_as::<f64>("RSUN_REF")?
    } else {
        RSUN_REF
    };

    Ok(HelioprojectiveFrame::new(obstime, observer).with_rsun(rsun))
}

impl GenericMap {
    /// Pair `data` with `header`; the data shape must match `NAXIS2` x `NAXIS1`.
    pub fn new(data: Array2<f64>, header: MapHeader) -> Result<Self> {
        let wcs = Wcs::from_header(&header)?;
        let (naxis1, naxis2) = wcs.naxis();
        if data.dim() != (naxis2, naxis1) {
            return Err(MapError::ShapeMismatch {
                data: data.dim(),
                header: (naxis2, naxis1),
            });
        }
        let frame = frame_from_header(&header)?;

        debug!(
            rows = naxis2,
            cols = naxis1,
            obstime = %frame.obstime,
            "created map"
        );

        Ok(Self {
            data,
            header,
            wcs,
            frame,
        })
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn header(&self) -> &MapHeader {
        &self.header
    }

    pub fn wcs(&self) -> &Wcs {
        &self.wcs
    }

    /// Size as (columns, rows).
    pub fn dimensions(&self) -> (usize, usize) {
        self.wcs.naxis()
    }

    /// Pixel scale in arcsec/pixel.
    pub fn scale(&self) -> (f64, f64) {
        self.wcs.scale()
    }

    /// 0-based pixel of the reference coordinate.
    pub fn reference_pixel(&self) -> (f64, f64) {
        self.wcs.reference_pixel()
    }

    pub fn reference_coordinate(&self) -> SkyCoord {
        let coord = self.wcs.reference_coordinate();
        SkyCoord::from_frame(coord.tx, coord.ty, self.frame)
    }

    pub fn date(&self) -> ObsTime {
        self.frame.obstime
    }

    pub fn observer_coordinate(&self) -> HeliographicStonyhurst {
        self.frame.observer
    }

    /// Observer distance from Sun centre in metres.
    pub fn dsun(&self) -> f64 {
        self.frame.observer.radius
    }

    /// Apparent solar radius in arcsec.
    pub fn rsun_obs(&self) -> f64 {
        self.frame.angular_radius()
    }

    pub fn coordinate_frame(&self) -> &HelioprojectiveFrame {
        &self.frame
    }

    /// 0-based pixel position of `coord`, transformed into this map's frame
    /// first when needed.
    pub fn world_to_pixel(&self, coord: &SkyCoord) -> Option<(f64, f64)> {
        let coord = coord.transform_to(&self.frame)?;
        self.wcs.world_to_pixel(&coord.coord)
    }

    /// 0-based pixel position of a bare coordinate in this map's frame.
    pub fn helioprojective_to_pixel(&self, coord: &Helioprojective) -> Option<(f64, f64)> {
        self.wcs.world_to_pixel(coord)
    }

    pub fn pixel_to_world(&self, x: f64, y: f64) -> SkyCoord {
        let coord = self.wcs.pixel_to_world(x, y);
        SkyCoord::from_frame(coord.tx, coord.ty, self.frame)
    }

    /// World coordinate of the outer corner of the first pixel.
    pub fn bottom_left_coord(&self) -> SkyCoord {
        self.pixel_to_world(-0.5, -0.5)
    }

    /// World coordinate of the outer corner of the last pixel.
    pub fn top_right_coord(&self) -> SkyCoord {
        let (cols, rows) = self.dimensions();
        self.pixel_to_world(cols as f64 - 0.5, rows as f64 - 0.5)
    }

    pub fn center(&self) -> SkyCoord {
        let (cols, rows) = self.dimensions();
        self.pixel_to_world((cols as f64 - 1.0) / 2.0, (rows as f64 - 1.0) / 2.0)
    }

    /// Whether a 0-based pixel position falls on the image.
    pub fn contains_pixel(&self, x: f64, y: f64) -> bool {
        let (cols, rows) = self.dimensions();
        (-0.5..cols as f64 - 0.5).contains(&x) && (-0.5..rows as f64 - 0.5).contains(&y)
    }
}

impl PartialEq for GenericMap {
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header && self.data == other.data
    }
}

#[cfg(feature = "serialize")]
mod serialize {
    use base64::{prelude::BASE64_STANDARD, Engine};
    use ndarray::Array2;
    use serde::{Deserialize, Serialize};

    use super::GenericMap;
    use crate::header::MapHeader;

    #[derive(Serialize, Deserialize)]
    struct RawMap {
        header: MapHeader,
        rows: usize,
        cols: usize,
        /// Row-major little-endian f64 samples, base64 encoded.
        data: String,
    }

    impl Serialize for GenericMap {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            let (rows, cols) = self.data.dim();
            let bytes = self
                .data
                .iter()
                .flat_map(|v| v.to_le_bytes())
                .collect::<Vec<u8>>();
            RawMap {
                header: self.header.clone(),
                rows,
                cols,
                data: BASE64_STANDARD.encode(bytes),
            }
            .serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for GenericMap {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            let raw = RawMap::deserialize(deserializer)?;
            let bytes = BASE64_STANDARD
                .decode(raw.data)
                .map_err(serde::de::Error::custom)?;
            if bytes.len() != raw.rows * raw.cols * 8 {
                return Err(serde::de::Error::custom("map data length does not match shape"));
            }
            let samples = bytes
                .chunks_exact(8)
                .map(|chunk| {
                    let mut buf = [0u8; 8];
                    buf.copy_from_slice(chunk);
                    f64::from_le_bytes(buf)
                })
                .collect::<Vec<_>>();
            let data = Array2::from_shape_vec((raw.rows, raw.cols), samples)
                .map_err(serde::de::Error::custom)?;
            GenericMap::new(data, raw.header).map_err(serde::de::Error::custom)
        }
    }
}
