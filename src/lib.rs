//! Blank helioprojective solar maps with marked positions.
//!
//! Positions of events seen at different times are often shown together on
//! a blank map, since no single observation fits all of them. This crate
//! builds such a map: an all-zero image with a FITS-WCS header for an
//! observer, drawn with the solar limb, a heliographic grid and markers.
//!
//! ```no_run
//! use blank_solar_map::{BlankMapConfig, BlankMapScene};
//!
//! let scene = BlankMapScene::build(&BlankMapConfig::default())?;
//! scene.save_png("blank_map.png")?;
//! # Ok::<(), blank_solar_map::MapError>(())
//! ```

pub mod config;
pub mod coordinates;
pub mod ephemeris;
pub mod error;
pub mod header;
mod internal_util;
pub mod map;
pub mod plot;
pub mod scene;
pub mod time;
pub mod wcs;

pub use config::BlankMapConfig;
pub use coordinates::{
    HeliographicStonyhurst, Helioprojective, HelioprojectiveFrame, Observer, SkyCoord,
};
pub use error::{MapError, Result};
pub use header::{make_fitswcs_header, HeaderOptions, MapHeader};
pub use map::GenericMap;
pub use scene::BlankMapScene;
pub use time::ObsTime;
