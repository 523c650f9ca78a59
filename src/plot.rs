//! Rasterised plotting of maps with `tiny-skia`.
//!
//! A [`Figure`] owns the canvas; [`Axes`] borrow it together with a map and
//! translate map pixels to canvas positions. The axes extent is always the
//! map extent (no autoscaling), with the image origin at the lower left.

use std::path::Path;

use ab_glyph::{FontRef, PxScale};
use image::{ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use tiny_skia::{
    FillRule, IntSize, Mask, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, StrokeDash,
    Transform,
};
use tracing::{debug, info, warn};

use crate::{
    coordinates::{HeliographicStonyhurst, SkyCoord},
    error::{MapError, Result},
    map::GenericMap,
};

const MARGIN_LEFT: f32 = 70.0;
const MARGIN_RIGHT: f32 = 30.0;
const MARGIN_TOP: f32 = 50.0;
const MARGIN_BOTTOM: f32 = 60.0;
const TICK_LENGTH: f32 = 6.0;
const TICK_EVERY_PIXELS: usize = 100;
const LIMB_SAMPLES: usize = 360;
const GRID_SAMPLE_STEP_DEG: f64 = 1.0;
const TITLE_SIZE: f32 = 18.0;

static TITLE_FONT: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    /// Default colour of the first plotted line/marker series.
    pub const TAB_BLUE: Color = Color::rgb(0x1f, 0x77, 0xb4);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    fn paint(&self) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color_rgba8(self.r, self.g, self.b, self.a);
        paint.anti_alias = true;
        paint
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Marker {
    Circle,
    Cross,
    Plus,
}

pub struct Figure {
    pixmap: Pixmap,
    title: Option<String>,
}

impl Figure {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| MapError::Render(format!("invalid figure size {width}x{height}")))?;
        pixmap.fill(tiny_skia::Color::WHITE);
        Ok(Self {
            pixmap,
            title: None,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Axes showing `map`, placed inside the figure margins with the map's
    /// aspect ratio preserved.
    pub fn add_map_axes<'a>(&'a mut self, map: &'a GenericMap) -> Result<Axes<'a>> {
        let (cols, rows) = map.dimensions();
        let (sx, sy) = map.scale();
        let world_width = cols as f32 * sx.abs() as f32;
        let world_height = rows as f32 * sy.abs() as f32;

        let avail_w = self.width() as f32 - MARGIN_LEFT - MARGIN_RIGHT;
        let avail_h = self.height() as f32 - MARGIN_TOP - MARGIN_BOTTOM;
        let zoom = (avail_w / world_width).min(avail_h / world_height);
        let (w, h) = (world_width * zoom, world_height * zoom);
        let left = MARGIN_LEFT + (avail_w - w) / 2.0;
        let top = MARGIN_TOP + (avail_h - h) / 2.0;

        let rect = Rect::from_xywh(left, top, w, h)
            .ok_or_else(|| MapError::Render("figure too small for axes".to_string()))?;

        let mut clip = Mask::new(self.width(), self.height())
            .ok_or_else(|| MapError::Render("cannot allocate clip mask".to_string()))?;
        clip.fill_path(
            &PathBuilder::from_rect(rect),
            FillRule::Winding,
            false,
            Transform::identity(),
        );

        debug!(left, top, width = w, height = h, "placed map axes");

        Ok(Axes {
            figure: self,
            map,
            rect,
            clip,
        })
    }

    /// Canvas as an RGBA image, with the title centred in the top margin.
    /// The background is opaque, so premultiplied and straight alpha coincide.
    pub fn to_rgba_image(&self) -> Result<RgbaImage> {
        let mut image =
            RgbaImage::from_raw(self.width(), self.height(), self.pixmap.data().to_vec())
                .ok_or_else(|| MapError::Render("canvas buffer has unexpected size".to_string()))?;
        if let Some(title) = self.title.as_deref().filter(|t| !t.is_empty()) {
            draw_title(&mut image, title)?;
        }
        Ok(image)
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.to_rgba_image()?
            .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| MapError::Render(e.to_string()))?;
        Ok(bytes)
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.encode_png()?;
        std::fs::write(path.as_ref(), bytes)?;
        info!(path = %path.as_ref().display(), "saved figure");
        Ok(())
    }
}

pub struct Axes<'a> {
    figure: &'a mut Figure,
    map: &'a GenericMap,
    rect: Rect,
    clip: Mask,
}

impl Axes<'_> {
    /// Canvas rectangle covered by the map.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Canvas position of a 0-based map pixel.
    pub fn pixel_to_canvas(&self, x: f64, y: f64) -> (f32, f32) {
        let (cols, rows) = self.map.dimensions();
        let cx = self.rect.left() + ((x + 0.5) / cols as f64) as f32 * self.rect.width();
        let cy = self.rect.bottom() - ((y + 0.5) / rows as f64) as f32 * self.rect.height();
        (cx, cy)
    }

    /// Draw the map data with a linear grey colour map at opacity `alpha`.
    pub fn plot_map(&mut self, alpha: f32) -> Result<()> {
        let alpha = alpha.clamp(0.0, 1.0);
        let image = greyscale_image(self.map);
        let (width, height) = image.dimensions();
        let size = IntSize::from_wh(width, height)
            .ok_or_else(|| MapError::Render("map has no pixels".to_string()))?;
        let layer = Pixmap::from_vec(image.into_raw(), size)
            .ok_or_else(|| MapError::Render("cannot build map layer".to_string()))?;

        let paint = PixmapPaint {
            opacity: alpha,
            ..PixmapPaint::default()
        };
        let transform = Transform::from_row(
            self.rect.width() / width as f32,
            0.0,
            0.0,
            self.rect.height() / height as f32,
            self.rect.left(),
            self.rect.top(),
        );
        self.figure
            .pixmap
            .draw_pixmap(0, 0, layer.as_ref(), &paint, transform, Some(&self.clip));
        self.draw_frame();

        debug!(alpha, "plotted map data");
        Ok(())
    }

    fn draw_frame(&mut self) {
        let paint = Color::BLACK.paint();
        let stroke = Stroke {
            width: 1.0,
            ..Stroke::default()
        };
        self.figure.pixmap.stroke_path(
            &PathBuilder::from_rect(self.rect),
            &paint,
            &stroke,
            Transform::identity(),
            None,
        );

        let (cols, rows) = self.map.dimensions();
        let mut pb = PathBuilder::new();
        for x in (0..cols).step_by(TICK_EVERY_PIXELS) {
            let (cx, _) = self.pixel_to_canvas(x as f64, 0.0);
            pb.move_to(cx, self.rect.bottom());
            pb.line_to(cx, self.rect.bottom() + TICK_LENGTH);
        }
        for y in (0..rows).step_by(TICK_EVERY_PIXELS) {
            let (_, cy) = self.pixel_to_canvas(0.0, y as f64);
            pb.move_to(self.rect.left(), cy);
            pb.line_to(self.rect.left() - TICK_LENGTH, cy);
        }
        if let Some(ticks) = pb.finish() {
            self.figure
                .pixmap
                .stroke_path(&ticks, &paint, &stroke, Transform::identity(), None);
        }
    }

    fn stroke_polylines(&mut self, lines: &[Vec<(f32, f32)>], color: Color, dashed: bool) {
        let mut pb = PathBuilder::new();
        for line in lines.iter().filter(|line| line.len() > 1) {
            pb.move_to(line[0].0, line[0].1);
            for &(x, y) in &line[1..] {
                pb.line_to(x, y);
            }
        }
        let Some(path) = pb.finish() else {
            return;
        };
        let stroke = Stroke {
            width: 1.0,
            dash: if dashed {
                StrokeDash::new(vec![4.0, 3.0], 0.0)
            } else {
                None
            },
            ..Stroke::default()
        };
        self.figure.pixmap.stroke_path(
            &path,
            &color.paint(),
            &stroke,
            Transform::identity(),
            Some(&self.clip),
        );
    }

    /// Draw the solar limb as seen by the map's observer.
    pub fn draw_limb(&mut self, color: Color) {
        let frame = *self.map.coordinate_frame();
        let mut line = frame
            .limb(LIMB_SAMPLES)
            .iter()
            .filter_map(|coord| self.map.helioprojective_to_pixel(coord))
            .map(|(x, y)| self.pixel_to_canvas(x, y))
            .collect::<Vec<_>>();
        if let Some(&first) = line.first() {
            line.push(first);
        }
        debug!(
            radius_arcsec = frame.angular_radius(),
            points = line.len(),
            "drawing limb"
        );
        self.stroke_polylines(&[line], color, false);
    }

    /// Draw heliographic Stonyhurst meridians and parallels every
    /// `spacing_deg` degrees, on the visible hemisphere only.
    pub fn draw_grid(&mut self, color: Color, spacing_deg: f64) -> Result<()> {
        if !(spacing_deg.is_finite()
            && (GRID_SAMPLE_STEP_DEG..=90.0).contains(&spacing_deg))
        {
            return Err(MapError::Render(format!(
                "grid spacing must be in [{GRID_SAMPLE_STEP_DEG}, 90] degrees, got {spacing_deg}"
            )));
        }

        let mut lines = Vec::new();
        let steps = (180.0 / GRID_SAMPLE_STEP_DEG) as usize;

        let meridians = (360.0 / spacing_deg).round() as usize;
        for i in 0..meridians {
            let lon = -180.0 + i as f64 * spacing_deg;
            let samples = (0..=steps).map(|j| (lon, -90.0 + j as f64 * GRID_SAMPLE_STEP_DEG));
            lines.extend(self.visible_runs(samples));
        }

        let parallels = (180.0 / spacing_deg).round() as usize;
        for i in 1..parallels {
            let lat = -90.0 + i as f64 * spacing_deg;
            let samples = (0..=2 * steps).map(|j| (-180.0 + j as f64 * GRID_SAMPLE_STEP_DEG, lat));
            lines.extend(self.visible_runs(samples));
        }

        debug!(spacing_deg, segments = lines.len(), "drawing grid");
        self.stroke_polylines(&lines, color, true);
        Ok(())
    }

    /// Split a sampled grid line into runs of consecutive visible points.
    fn visible_runs(&self, samples: impl Iterator<Item = (f64, f64)>) -> Vec<Vec<(f32, f32)>> {
        let frame = self.map.coordinate_frame();
        let mut runs = Vec::new();
        let mut current = Vec::new();
        for (lon, lat) in samples {
            let (coord, visible) =
                frame.from_heliographic(&HeliographicStonyhurst::on_surface(lon, lat));
            let pixel = visible
                .then(|| self.map.helioprojective_to_pixel(&coord))
                .flatten();
            match pixel {
                Some((x, y)) => current.push(self.pixel_to_canvas(x, y)),
                None => {
                    if current.len() > 1 {
                        runs.push(std::mem::take(&mut current));
                    } else {
                        current.clear();
                    }
                }
            }
        }
        if current.len() > 1 {
            runs.push(current);
        }
        runs
    }

    /// Mark each coordinate. Returns the 0-based map pixel of every mark
    /// that landed inside the axes, `None` for clipped ones.
    pub fn plot_coord(
        &mut self,
        coords: &[SkyCoord],
        marker: Marker,
        color: Color,
    ) -> Vec<Option<(f64, f64)>> {
        const SIZE: f32 = 4.0;

        let placed = coords
            .iter()
            .map(|coord| {
                let pixel = self
                    .map
                    .world_to_pixel(coord)
                    .filter(|&(x, y)| self.map.contains_pixel(x, y));
                if pixel.is_none() {
                    warn!(
                        tx = coord.tx(),
                        ty = coord.ty(),
                        "coordinate falls outside the map, not drawn"
                    );
                }
                pixel
            })
            .collect::<Vec<_>>();

        let paint = color.paint();
        let stroke = Stroke {
            width: 1.5,
            ..Stroke::default()
        };
        for &(x, y) in placed.iter().flatten() {
            let (cx, cy) = self.pixel_to_canvas(x, y);
            match marker {
                Marker::Circle => {
                    if let Some(circle) = PathBuilder::from_circle(cx, cy, SIZE) {
                        self.figure.pixmap.fill_path(
                            &circle,
                            &paint,
                            FillRule::Winding,
                            Transform::identity(),
                            Some(&self.clip),
                        );
                    }
                }
                Marker::Cross | Marker::Plus => {
                    let mut pb = PathBuilder::new();
                    if marker == Marker::Cross {
                        pb.move_to(cx - SIZE, cy - SIZE);
                        pb.line_to(cx + SIZE, cy + SIZE);
                        pb.move_to(cx - SIZE, cy + SIZE);
                        pb.line_to(cx + SIZE, cy - SIZE);
                    } else {
                        pb.move_to(cx - SIZE, cy);
                        pb.line_to(cx + SIZE, cy);
                        pb.move_to(cx, cy - SIZE);
                        pb.line_to(cx, cy + SIZE);
                    }
                    if let Some(path) = pb.finish() {
                        self.figure.pixmap.stroke_path(
                            &path,
                            &paint,
                            &stroke,
                            Transform::identity(),
                            Some(&self.clip),
                        );
                    }
                }
            }
        }

        debug!(
            requested = coords.len(),
            drawn = placed.iter().flatten().count(),
            "plotted coordinates"
        );
        placed
    }

    /// Replaces any earlier title. It is drawn when the figure is exported.
    pub fn set_title(&mut self, title: &str) {
        debug!(title, "set figure title");
        self.figure.title = Some(title.to_string());
    }
}

fn draw_title(image: &mut RgbaImage, title: &str) -> Result<()> {
    let font = FontRef::try_from_slice(TITLE_FONT).map_err(|e| MapError::Render(e.to_string()))?;
    let scale = PxScale::from(TITLE_SIZE);
    let (w, h) = text_size(scale, &font, title);
    let x = (image.width() as i32 - w as i32) / 2;
    let y = ((MARGIN_TOP - h as f32) / 2.0).max(0.0) as i32;
    draw_text_mut(image, Rgba([0, 0, 0, 255]), x, y, scale, &font, title);
    Ok(())
}

/// Linear grey colour map, minimum black and maximum white, flipped so the
/// first data row ends up at the bottom of the image.
fn greyscale_image(map: &GenericMap) -> RgbaImage {
    let data = map.data();
    let (rows, cols) = data.dim();
    let (min, max) = data
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;

    RgbaImage::from_fn(cols as u32, rows as u32, |x, y| {
        let value = data[[rows - 1 - y as usize, x as usize]];
        let level = if range > 0.0 && value.is_finite() {
            ((value - min) / range * 255.0).round() as u8
        } else {
            0
        };
        Rgba([level, level, level, 255])
    })
}
