//! Gnomonic (TAN) world coordinate transform for helioprojective headers.
//!
//! Angles are handled in degrees internally, as in FITS WCS Paper II
//! (Calabretta & Greisen 2002). Pixel coordinates at the API are 0-based;
//! the header stores 1-based `CRPIX`.

use crate::{
    coordinates::Helioprojective,
    error::{MapError, Result},
    header::MapHeader,
    internal_util::{wrap_180, ARCSEC_PER_DEG},
};

const CTYPE_LON: &str = "HPLN-TAN";
const CTYPE_LAT: &str = "HPLT-TAN";

fn unit_to_degrees(header: &MapHeader, keyword: &str) -> Result<f64> {
    if !header.contains(keyword) {
        return Ok(1.0);
    }
    match header.get_as::<String>(keyword)?.trim() {
        "deg" => Ok(1.0),
        "arcmin" => Ok(1.0 / 60.0),
        "arcsec" => Ok(1.0 / ARCSEC_PER_DEG),
        _ => Err(MapError::KeywordType {
            keyword: keyword.to_string(),
            expected: "angular unit",
        }),
    }
}

fn optional_float(header: &MapHeader, keyword: &str, default: f64) -> Result<f64> {
    if header.contains(keyword) {
        header.get_as::<f64>(keyword)
    } else {
        Ok(default)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Wcs {
    naxis: (usize, usize),
    /// 1-based reference pixel.
    crpix: (f64, f64),
    /// Reference coordinate, degrees.
    crval: (f64, f64),
    /// Pixel scale, degrees per pixel.
    cdelt: (f64, f64),
    /// `CDELT * PC`, degrees per pixel.
    matrix: [[f64; 2]; 2],
    inverse: [[f64; 2]; 2],
    lonpole: f64,
}

impl Wcs {
    pub fn from_header(header: &MapHeader) -> Result<Self> {
        let ctype1 = header.get_as::<String>("CTYPE1")?;
        let ctype2 = header.get_as::<String>("CTYPE2")?;
        if ctype1.trim() != CTYPE_LON || ctype2.trim() != CTYPE_LAT {
            return Err(MapError::UnsupportedProjection(ctype1, ctype2));
        }

        let unit1 = unit_to_degrees(header, "CUNIT1")?;
        let unit2 = unit_to_degrees(header, "CUNIT2")?;

        let naxis = (
            header.get_as::<usize>("NAXIS1")?,
            header.get_as::<usize>("NAXIS2")?,
        );
        let crpix = (
            header.get_as::<f64>("CRPIX1")?,
            header.get_as::<f64>("CRPIX2")?,
        );
        let crval = (
            header.get_as::<f64>("CRVAL1")? * unit1,
            header.get_as::<f64>("CRVAL2")? * unit2,
        );
        let cdelt = (
            header.get_as::<f64>("CDELT1")? * unit1,
            header.get_as::<f64>("CDELT2")? * unit2,
        );
        let pc = [
            [
                optional_float(header, "PC1_1", 1.0)?,
                optional_float(header, "PC1_2", 0.0)?,
            ],
            [
                optional_float(header, "PC2_1", 0.0)?,
                optional_float(header, "PC2_2", 1.0)?,
            ],
        ];
        let lonpole = optional_float(header, "LONPOLE", 180.0)?;

        let matrix = [
            [cdelt.0 * pc[0][0], cdelt.0 * pc[0][1]],
            [cdelt.1 * pc[1][0], cdelt.1 * pc[1][1]],
        ];
        let det = matrix[0][0] * matrix[1][1] - matrix[0][1] * matrix[1][0];
        if det == 0.0 || !det.is_finite() {
            return Err(MapError::InvalidScale(
                cdelt.0 * ARCSEC_PER_DEG,
                cdelt.1 * ARCSEC_PER_DEG,
            ));
        }
        let inverse = [
            [matrix[1][1] / det, -matrix[0][1] / det],
            [-matrix[1][0] / det, matrix[0][0] / det],
        ];

        Ok(Self {
            naxis,
            crpix,
            crval,
            cdelt,
            matrix,
            inverse,
            lonpole,
        })
    }

    /// Image size as (NAXIS1, NAXIS2).
    pub fn naxis(&self) -> (usize, usize) {
        self.naxis
    }

    /// 0-based pixel of the reference coordinate.
    pub fn reference_pixel(&self) -> (f64, f64) {
        (self.crpix.0 - 1.0, self.crpix.1 - 1.0)
    }

    pub fn reference_coordinate(&self) -> Helioprojective {
        Helioprojective::new(
            self.crval.0 * ARCSEC_PER_DEG,
            self.crval.1 * ARCSEC_PER_DEG,
        )
    }

    /// Pixel scale in arcsec/pixel.
    pub fn scale(&self) -> (f64, f64) {
        (
            self.cdelt.0 * ARCSEC_PER_DEG,
            self.cdelt.1 * ARCSEC_PER_DEG,
        )
    }

    /// 0-based pixel position of a world coordinate. `None` for coordinates
    /// 90 degrees or more from the reference, which have no gnomonic image.
    pub fn world_to_pixel(&self, coord: &Helioprojective) -> Option<(f64, f64)> {
        let lon = (coord.tx / ARCSEC_PER_DEG).to_radians();
        let lat = (coord.ty / ARCSEC_PER_DEG).to_radians();
        let lon0 = self.crval.0.to_radians();
        let lat0 = self.crval.1.to_radians();
        let dlon = lon - lon0;

        // (a, b) = cos(theta) * (sin, cos) of the native longitude offset from
        // LONPOLE; kept as components so points near the reference stay exact.
        let a = -lat.cos() * dlon.sin();
        let b = lat.sin() * lat0.cos() - lat.cos() * lat0.sin() * dlon.cos();
        let sin_theta = lat.sin() * lat0.sin() + lat.cos() * lat0.cos() * dlon.cos();
        if sin_theta <= 0.0 {
            return None;
        }

        let (sin_pole, cos_pole) = self.lonpole.to_radians().sin_cos();
        let k = 180.0 * std::f64::consts::FRAC_1_PI / sin_theta;
        let x = k * (a * cos_pole + b * sin_pole);
        let y = -k * (b * cos_pole - a * sin_pole);

        let dx = self.inverse[0][0] * x + self.inverse[0][1] * y;
        let dy = self.inverse[1][0] * x + self.inverse[1][1] * y;

        let pixel = (self.crpix.0 + dx - 1.0, self.crpix.1 + dy - 1.0);
        (pixel.0.is_finite() && pixel.1.is_finite()).then_some(pixel)
    }

    /// World coordinate of a 0-based pixel position.
    pub fn pixel_to_world(&self, px: f64, py: f64) -> Helioprojective {
        let dx = px + 1.0 - self.crpix.0;
        let dy = py + 1.0 - self.crpix.1;
        let x = self.matrix[0][0] * dx + self.matrix[0][1] * dy;
        let y = self.matrix[1][0] * dx + self.matrix[1][1] * dy;

        let r = (x * x + y * y).sqrt();
        let phi = x.atan2(-y);
        let theta = (180.0 * std::f64::consts::FRAC_1_PI).atan2(r);

        let lon0 = self.crval.0.to_radians();
        let lat0 = self.crval.1.to_radians();
        let dphi = phi - self.lonpole.to_radians();

        let lon = lon0
            + (-theta.cos() * dphi.sin())
                .atan2(theta.sin() * lat0.cos() - theta.cos() * lat0.sin() * dphi.cos());
        let lat = (theta.sin() * lat0.sin() + theta.cos() * lat0.cos() * dphi.cos())
            .clamp(-1.0, 1.0)
            .asin();

        Helioprojective::new(
            wrap_180(lon.to_degrees()) * ARCSEC_PER_DEG,
            lat.to_degrees() * ARCSEC_PER_DEG,
        )
    }
}
