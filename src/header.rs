//! FITS-WCS header cards for helioprojective maps.

use std::fmt;

use tracing::debug;

use crate::{
    coordinates::SkyCoord,
    error::{MapError, Result},
};

const CARD_WIDTH: usize = 80;
const VALUE_WIDTH: usize = 20;
/// Longest quoted string that still fits in columns 11-80.
const MAX_TEXT_WIDTH: usize = 68;

/// Value of a single header card.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum HeaderValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Logical(bool),
}

fn is_fits_text(s: &str) -> bool {
    s.chars().all(|c| c == ' ' || c.is_ascii_graphic())
}

impl HeaderValue {
    /// Fixed-format value field of a FITS card.
    fn to_fits_field(&self) -> String {
        match self {
            HeaderValue::Integer(v) => format!("{:>width$}", v, width = VALUE_WIDTH),
            HeaderValue::Float(v) => {
                let mut s = format!("{:?}", v);
                if s.len() > VALUE_WIDTH {
                    s = format!("{:E}", v);
                }
                format!("{:>width$}", s, width = VALUE_WIDTH)
            }
            HeaderValue::Logical(v) => {
                format!("{:>width$}", if *v { "T" } else { "F" }, width = VALUE_WIDTH)
            }
            HeaderValue::Text(v) => format!("'{:<8}'", v.replace('\'', "''")),
        }
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::Integer(v) => write!(f, "{}", v),
            HeaderValue::Float(v) => write!(f, "{}", v),
            HeaderValue::Text(v) => write!(f, "{}", v),
            HeaderValue::Logical(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for HeaderValue {
    fn from(value: i64) -> Self {
        HeaderValue::Integer(value)
    }
}

impl From<usize> for HeaderValue {
    fn from(value: usize) -> Self {
        HeaderValue::Integer(value as i64)
    }
}

impl From<f64> for HeaderValue {
    fn from(value: f64) -> Self {
        HeaderValue::Float(value)
    }
}

impl From<bool> for HeaderValue {
    fn from(value: bool) -> Self {
        HeaderValue::Logical(value)
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        HeaderValue::Text(value.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        HeaderValue::Text(value)
    }
}

/// Types that can be read back out of a [`HeaderValue`].
pub trait FromHeaderValue: Sized {
    const TYPE_NAME: &'static str;

    fn from_header_value(value: &HeaderValue) -> Option<Self>;
}

impl FromHeaderValue for f64 {
    const TYPE_NAME: &'static str = "float";

    fn from_header_value(value: &HeaderValue) -> Option<Self> {
        match value {
            HeaderValue::Float(v) => Some(*v),
            HeaderValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl FromHeaderValue for i64 {
    const TYPE_NAME: &'static str = "integer";

    fn from_header_value(value: &HeaderValue) -> Option<Self> {
        match value {
            HeaderValue::Integer(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromHeaderValue for usize {
    const TYPE_NAME: &'static str = "non-negative integer";

    fn from_header_value(value: &HeaderValue) -> Option<Self> {
        match value {
            HeaderValue::Integer(v) => usize::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl FromHeaderValue for String {
    const TYPE_NAME: &'static str = "text";

    fn from_header_value(value: &HeaderValue) -> Option<Self> {
        match value {
            HeaderValue::Text(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromHeaderValue for bool {
    const TYPE_NAME: &'static str = "logical";

    fn from_header_value(value: &HeaderValue) -> Option<Self> {
        match value {
            HeaderValue::Logical(v) => Some(*v),
            _ => None,
        }
    }
}

/// A single header card.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Card {
    keyword: String,
    value: HeaderValue,
    comment: Option<String>,
}

impl Card {
    pub fn new(keyword: &str, value: impl Into<HeaderValue>, comment: Option<&str>) -> Result<Self> {
        let keyword = keyword.trim().to_ascii_uppercase();
        let valid = !keyword.is_empty()
            && keyword.len() <= 8
            && keyword
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '-');
        if !valid {
            return Err(MapError::InvalidKeyword(keyword));
        }

        let value = value.into();
        if let HeaderValue::Text(text) = &value {
            if !is_fits_text(text) {
                return Err(MapError::InvalidCard(format!(
                    "{keyword}: value is not printable ASCII"
                )));
            }
            let quoted = text.len() + text.matches('\'').count();
            if quoted > MAX_TEXT_WIDTH {
                return Err(MapError::InvalidCard(format!(
                    "{keyword}: text value is {quoted} characters, at most {MAX_TEXT_WIDTH} fit"
                )));
            }
        }
        if let Some(comment) = comment {
            if !is_fits_text(comment) {
                return Err(MapError::InvalidCard(format!(
                    "{keyword}: comment is not printable ASCII"
                )));
            }
        }

        Ok(Self {
            keyword,
            value,
            comment: comment.map(str::to_string),
        })
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn value(&self) -> &HeaderValue {
        &self.value
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// 80-column FITS card image. Long comments are cut at column 80.
    pub fn to_fits_string(&self) -> String {
        let mut card = format!("{:<8}= {}", self.keyword, self.value.to_fits_field());
        if let Some(comment) = &self.comment {
            card.push_str(" / ");
            card.push_str(comment);
        }
        card.truncate(CARD_WIDTH);
        format!("{:<width$}", card, width = CARD_WIDTH)
    }
}

/// Ordered collection of header cards.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct MapHeader {
    cards: Vec<Card>,
}

impl MapHeader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a keyword, replacing an existing card in place or appending.
    pub fn set(
        &mut self,
        keyword: &str,
        value: impl Into<HeaderValue>,
        comment: Option<&str>,
    ) -> Result<()> {
        let card = Card::new(keyword, value, comment)?;
        match self.cards.iter_mut().find(|c| c.keyword == card.keyword) {
            Some(existing) => *existing = card,
            None => self.cards.push(card),
        }
        Ok(())
    }

    pub fn get(&self, keyword: &str) -> Option<&Card> {
        let keyword = keyword.to_ascii_uppercase();
        self.cards.iter().find(|c| c.keyword == keyword)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.get(keyword).is_some()
    }

    /// Typed lookup of a card value.
    pub fn get_as<T: FromHeaderValue>(&self, keyword: &str) -> Result<T> {
        let card = self
            .get(keyword)
            .ok_or_else(|| MapError::MissingKeyword(keyword.to_ascii_uppercase()))?;
        T::from_header_value(&card.value).ok_or_else(|| MapError::KeywordType {
            keyword: card.keyword.clone(),
            expected: T::TYPE_NAME,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Header as FITS card images, one per line, terminated by `END`.
    pub fn to_fits_string(&self) -> String {
        self.cards
            .iter()
            .map(Card::to_fits_string)
            .chain(std::iter::once(format!("{:<width$}", "END", width = CARD_WIDTH)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Optional settings for [`make_fitswcs_header`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct HeaderOptions {
    /// Pixel scale along (x, y) in arcsec/pixel.
    pub scale: (f64, f64),
    /// 0-based pixel of the reference coordinate; image centre when `None`.
    pub reference_pixel: Option<(f64, f64)>,
    /// Rotation of the pixel axes relative to solar north, degrees.
    pub rotation_angle: Option<f64>,
    pub instrument: Option<String>,
    pub telescope: Option<String>,
    pub observatory: Option<String>,
    /// Wavelength in Angstrom.
    pub wavelength: Option<f64>,
    /// Exposure time in seconds.
    pub exposure: Option<f64>,
    pub unit: Option<String>,
}

impl Default for HeaderOptions {
    fn default() -> Self {
        Self {
            scale: (1.0, 1.0),
            reference_pixel: None,
            rotation_angle: None,
            instrument: None,
            telescope: None,
            observatory: None,
            wavelength: None,
            exposure: None,
            unit: None,
        }
    }
}

impl HeaderOptions {
    pub fn with_scale(mut self, x: f64, y: f64) -> Self {
        self.scale = (x, y);
        self
    }

    pub fn with_reference_pixel(mut self, x: f64, y: f64) -> Self {
        self.reference_pixel = Some((x, y));
        self
    }

    pub fn with_rotation_angle(mut self, degrees: f64) -> Self {
        self.rotation_angle = Some(degrees);
        self
    }
}

/// Build a helioprojective FITS-WCS header for data of `shape` (rows, cols)
/// whose reference pixel sits at `reference`.
pub fn make_fitswcs_header(
    shape: (usize, usize),
    reference: &SkyCoord,
    options: &HeaderOptions,
) -> Result<MapHeader> {
    let (rows, cols) = shape;
    if rows == 0 || cols == 0 {
        return Err(MapError::EmptyData);
    }
    let (cdelt1, cdelt2) = options.scale;
    if !(cdelt1.is_finite() && cdelt2.is_finite()) || cdelt1 == 0.0 || cdelt2 == 0.0 {
        return Err(MapError::InvalidScale(cdelt1, cdelt2));
    }

    let (ref_x, ref_y) = options
        .reference_pixel
        .unwrap_or(((cols as f64 - 1.0) / 2.0, (rows as f64 - 1.0) / 2.0));
    let angle = options.rotation_angle.unwrap_or(0.0).to_radians();
    let frame = &reference.frame;

    let mut header = MapHeader::new();
    header.set("NAXIS", 2_i64, Some("number of array dimensions"))?;
    header.set("NAXIS1", cols, None)?;
    header.set("NAXIS2", rows, None)?;
    header.set("WCSAXES", 2_i64, Some("Number of coordinate axes"))?;
    header.set("CRPIX1", ref_x + 1.0, Some("Pixel coordinate of reference point"))?;
    header.set("CRPIX2", ref_y + 1.0, Some("Pixel coordinate of reference point"))?;
    header.set("CDELT1", cdelt1, Some("[arcsec] Coordinate increment at reference point"))?;
    header.set("CDELT2", cdelt2, Some("[arcsec] Coordinate increment at reference point"))?;
    header.set("CUNIT1", "arcsec", Some("Units of coordinate increment and value"))?;
    header.set("CUNIT2", "arcsec", Some("Units of coordinate increment and value"))?;
    header.set("CTYPE1", "HPLN-TAN", Some("Helioprojective angle, gnomonic projection"))?;
    header.set("CTYPE2", "HPLT-TAN", Some("Helioprojective angle, gnomonic projection"))?;
    header.set("CRVAL1", reference.tx(), Some("[arcsec] Coordinate value at reference point"))?;
    header.set("CRVAL2", reference.ty(), Some("[arcsec] Coordinate value at reference point"))?;
    header.set("PC1_1", angle.cos(), None)?;
    header.set("PC1_2", -angle.sin(), None)?;
    header.set("PC2_1", angle.sin(), None)?;
    header.set("PC2_2", angle.cos(), None)?;
    header.set("LONPOLE", 180.0, Some("[deg] Native longitude of celestial pole"))?;
    header.set("LATPOLE", 0.0, Some("[deg] Native latitude of celestial pole"))?;
    header.set("DATE-OBS", frame.obstime.to_fits_string(), Some("ISO-8601 time of observation"))?;
    header.set("MJD-OBS", frame.obstime.mjd(), Some("[d] MJD of observation"))?;
    header.set("RSUN_REF", frame.rsun, Some("[m] Solar radius"))?;
    header.set("DSUN_OBS", frame.observer.radius, Some("[m] Distance from centre of Sun to observer"))?;
    header.set("HGLN_OBS", frame.observer.lon, Some("[deg] Stonyhurst heliographic longitude"))?;
    header.set("HGLT_OBS", frame.observer.lat, Some("[deg] Stonyhurst heliographic latitude"))?;
    header.set("RSUN_OBS", frame.angular_radius(), Some("[arcsec] Apparent solar radius"))?;
    header.set("WCSNAME", "Helioprojective-cartesian", None)?;

    if let Some(telescope) = &options.telescope {
        header.set("TELESCOP", telescope.as_str(), None)?;
    }
    if let Some(instrument) = &options.instrument {
        header.set("INSTRUME", instrument.as_str(), None)?;
    }
    if let Some(observatory) = &options.observatory {
        header.set("OBSRVTRY", observatory.as_str(), None)?;
    }
    if let Some(wavelength) = options.wavelength {
        header.set("WAVELNTH", wavelength, None)?;
        header.set("WAVEUNIT", "Angstrom", None)?;
    }
    if let Some(exposure) = options.exposure {
        header.set("EXPTIME", exposure, Some("[s] Exposure time"))?;
    }
    if let Some(unit) = &options.unit {
        header.set("BUNIT", unit.as_str(), None)?;
    }

    debug!(
        naxis1 = cols,
        naxis2 = rows,
        crpix1 = ref_x + 1.0,
        crpix2 = ref_y + 1.0,
        cdelt1,
        cdelt2,
        "built helioprojective header"
    );

    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{coordinates::Observer, time::ObsTime};

    fn reference() -> SkyCoord {
        SkyCoord::new(0.0, 0.0, ObsTime::parse("2013-10-28").unwrap(), Observer::Earth)
    }

    #[test]
    fn test_card_keyword_validation() {
        assert!(Card::new("crpix1", 1.0, None).is_ok());
        assert_eq!(Card::new("crpix1", 1.0, None).unwrap().keyword(), "CRPIX1");
        assert!(matches!(
            Card::new("TOOLONGKEY", 1.0, None),
            Err(MapError::InvalidKeyword(_))
        ));
        assert!(Card::new("BAD KEY", 1.0, None).is_err());
        assert!(Card::new("", 1.0, None).is_err());
    }

    #[test]
    fn test_card_fits_format() {
        let card = Card::new("NAXIS1", 1000_i64, None).unwrap();
        let s = card.to_fits_string();
        assert_eq!(s.len(), 80);
        assert!(s.starts_with("NAXIS1  =                 1000"));

        let card = Card::new("CTYPE1", "HPLN-TAN", Some("x")).unwrap();
        assert!(card.to_fits_string().starts_with("CTYPE1  = 'HPLN-TAN' / x"));

        let card = Card::new("CUNIT1", "deg", None).unwrap();
        assert!(card.to_fits_string().starts_with("CUNIT1  = 'deg     '"));

        let card = Card::new("OBJECT", "it's", None).unwrap();
        assert!(card.to_fits_string().contains("'it''s   '"));
    }

    #[test]
    fn test_card_rejects_non_ascii_text() {
        assert!(matches!(
            Card::new("OBSRVTRY", "Pic du Midi é", None),
            Err(MapError::InvalidCard(_))
        ));
        let comment = format!("{}{}", "x".repeat(46), "é".repeat(10));
        assert!(matches!(
            Card::new("CDELT1", 2.0, Some(&comment)),
            Err(MapError::InvalidCard(_))
        ));
        assert!(Card::new("OBJECT", "tab\there", None).is_err());
    }

    #[test]
    fn test_card_text_length() {
        let card = Card::new("OBJECT", "a".repeat(68), None).unwrap();
        let s = card.to_fits_string();
        assert_eq!(s.len(), 80);
        assert!(s.ends_with('\''));

        assert!(matches!(
            Card::new("OBJECT", "a".repeat(100), None),
            Err(MapError::InvalidCard(_))
        ));
        // doubled quotes count against the field
        assert!(Card::new("OBJECT", format!("{}'", "a".repeat(67)), None).is_err());
    }

    #[test]
    fn test_long_comment_is_cut() {
        let card = Card::new("CDELT1", 2.0, Some(&"c".repeat(100))).unwrap();
        let s = card.to_fits_string();
        assert_eq!(s.len(), 80);
        assert!(s.starts_with("CDELT1  =                  2.0 / ccc"));
        assert!(s.ends_with('c'));
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut header = MapHeader::new();
        header.set("A", 1_i64, None).unwrap();
        header.set("B", 2_i64, None).unwrap();
        header.set("a", 3_i64, Some("replaced")).unwrap();
        assert_eq!(header.len(), 2);
        assert_eq!(header.iter().next().unwrap().keyword(), "A");
        assert_eq!(header.get_as::<i64>("A").unwrap(), 3);
        assert_eq!(header.get("A").unwrap().comment(), Some("replaced"));
    }

    #[test]
    fn test_typed_lookup_errors() {
        let mut header = MapHeader::new();
        header.set("CTYPE1", "HPLN-TAN", None).unwrap();
        header.set("NAXIS1", 10_i64, None).unwrap();

        assert!(matches!(
            header.get_as::<f64>("CTYPE1"),
            Err(MapError::KeywordType { .. })
        ));
        assert!(matches!(
            header.get_as::<f64>("CDELT1"),
            Err(MapError::MissingKeyword(_))
        ));
        // integers widen to floats
        assert_eq!(header.get_as::<f64>("NAXIS1").unwrap(), 10.0);
        assert_eq!(header.get_as::<usize>("NAXIS1").unwrap(), 10);
    }

    #[test]
    fn test_make_fitswcs_header() {
        let header = make_fitswcs_header(
            (1000, 1000),
            &reference(),
            &HeaderOptions::default().with_scale(2.0, 2.0),
        )
        .unwrap();

        assert_eq!(header.get_as::<usize>("NAXIS1").unwrap(), 1000);
        assert_eq!(header.get_as::<usize>("NAXIS2").unwrap(), 1000);
        assert_eq!(header.get_as::<f64>("CRPIX1").unwrap(), 500.5);
        assert_eq!(header.get_as::<f64>("CRPIX2").unwrap(), 500.5);
        assert_eq!(header.get_as::<f64>("CDELT1").unwrap(), 2.0);
        assert_eq!(header.get_as::<f64>("CRVAL1").unwrap(), 0.0);
        assert_eq!(header.get_as::<String>("CTYPE1").unwrap(), "HPLN-TAN");
        assert_eq!(header.get_as::<String>("CTYPE2").unwrap(), "HPLT-TAN");
        assert_eq!(
            header.get_as::<String>("DATE-OBS").unwrap(),
            "2013-10-28T00:00:00.000"
        );
        assert_eq!(header.get_as::<f64>("HGLN_OBS").unwrap(), 0.0);
        assert_eq!(header.get_as::<f64>("PC1_1").unwrap(), 1.0);
        assert_eq!(header.get_as::<f64>("PC2_1").unwrap(), 0.0);
        assert!(!header.contains("INSTRUME"));
    }

    #[test]
    fn test_make_fitswcs_header_options() {
        let options = HeaderOptions {
            instrument: Some("AIA".into()),
            wavelength: Some(171.0),
            ..HeaderOptions::default()
                .with_reference_pixel(10.0, 20.0)
                .with_rotation_angle(90.0)
        };
        let header = make_fitswcs_header((100, 50), &reference(), &options).unwrap();

        assert_eq!(header.get_as::<f64>("CRPIX1").unwrap(), 11.0);
        assert_eq!(header.get_as::<f64>("CRPIX2").unwrap(), 21.0);
        assert_eq!(header.get_as::<usize>("NAXIS1").unwrap(), 50);
        assert!((header.get_as::<f64>("PC1_2").unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(header.get_as::<String>("INSTRUME").unwrap(), "AIA");
        assert_eq!(header.get_as::<String>("WAVEUNIT").unwrap(), "Angstrom");
    }

    #[test]
    fn test_make_fitswcs_header_rejects_bad_input() {
        assert!(matches!(
            make_fitswcs_header((0, 10), &reference(), &HeaderOptions::default()),
            Err(MapError::EmptyData)
        ));
        assert!(matches!(
            make_fitswcs_header(
                (10, 10),
                &reference(),
                &HeaderOptions::default().with_scale(0.0, 1.0)
            ),
            Err(MapError::InvalidScale(..))
        ));
        assert!(make_fitswcs_header(
            (10, 10),
            &reference(),
            &HeaderOptions::default().with_scale(f64::NAN, 1.0)
        )
        .is_err());
    }

    #[test]
    fn test_header_text_ends_with_end_card() {
        let header =
            make_fitswcs_header((4, 4), &reference(), &HeaderOptions::default()).unwrap();
        let text = header.to_fits_string();
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), header.len() + 1);
        assert!(lines.iter().all(|line| line.len() == 80));
        assert!(lines.last().unwrap().starts_with("END"));
    }
}
