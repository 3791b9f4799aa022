//! CPU surface backed by `tiny-skia`, plus a bitmap decoder over the
//! `image` crate. This is the batteries-included path for hosts without
//! their own canvas; embedders with a platform surface implement
//! [`Surface`] directly instead.
//!
//! Text overlays are not supported here (`tiny-skia` has no text stack);
//! they are skipped with a warning.

use tiny_skia as ts;

use crate::error::{SvgaError, SvgaResult};
use crate::host::BitmapDecoder;
use crate::model::{LineCap, LineJoin, Rgba, Transform};
use crate::surface::{CompositeMode, PathSink, StrokeParams, Surface};

#[derive(Clone)]
struct State {
    transform: ts::Transform,
    alpha: f32,
    clip: Option<ts::Mask>,
}

pub struct RasterSurface {
    pixmap: ts::Pixmap,
    state: State,
    stack: Vec<State>,
    builder: ts::PathBuilder,
    composite: CompositeMode,
    warned_text: bool,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> SvgaResult<Self> {
        let pixmap = ts::Pixmap::new(width, height)
            .ok_or_else(|| SvgaError::surface(format!("invalid surface size {width}x{height}")))?;
        Ok(Self {
            pixmap,
            state: State {
                transform: ts::Transform::identity(),
                alpha: 1.0,
                clip: None,
            },
            stack: Vec::new(),
            builder: ts::PathBuilder::new(),
            composite: CompositeMode::SourceOver,
            warned_text: false,
        })
    }

    pub fn pixmap(&self) -> &ts::Pixmap {
        &self.pixmap
    }

    pub fn into_pixmap(self) -> ts::Pixmap {
        self.pixmap
    }

    fn color(&self, rgba: Rgba) -> ts::Color {
        ts::Color::from_rgba(
            rgba.r.clamp(0.0, 1.0),
            rgba.g.clamp(0.0, 1.0),
            rgba.b.clamp(0.0, 1.0),
            (rgba.a * self.state.alpha).clamp(0.0, 1.0),
        )
        .unwrap_or(ts::Color::TRANSPARENT)
    }

    fn finished_path(&self) -> Option<ts::Path> {
        self.builder.clone().finish()
    }

    fn coverage_scratch(&self) -> Option<ts::Pixmap> {
        ts::Pixmap::new(self.pixmap.width(), self.pixmap.height())
    }

    /// Destination-in over the whole surface: every destination pixel's
    /// alpha is scaled by the coverage drawn into `coverage`, so pixels
    /// the mask never touched are cleared, not left as-is. tiny-skia's
    /// per-draw `BlendMode::DestinationIn` only blends covered pixels and
    /// cannot express this.
    fn apply_destination_in(&mut self, coverage: &ts::Pixmap) {
        let coverage = coverage.pixels();
        for (px, c) in self.pixmap.data_mut().chunks_exact_mut(4).zip(coverage) {
            let a = u16::from(c.alpha());
            for ch in px.iter_mut() {
                *ch = ((u16::from(*ch) * a) / 255) as u8;
            }
        }
    }
}

impl PathSink for RasterSurface {
    fn move_to(&mut self, x: f64, y: f64) {
        self.builder.move_to(x as f32, y as f32);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.builder.line_to(x as f32, y as f32);
    }

    fn cubic_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) {
        self.builder.cubic_to(
            x1 as f32, y1 as f32, x2 as f32, y2 as f32, x as f32, y as f32,
        );
    }

    fn quad_to(&mut self, x1: f64, y1: f64, x: f64, y: f64) {
        self.builder
            .quad_to(x1 as f32, y1 as f32, x as f32, y as f32);
    }

    fn close_path(&mut self) {
        self.builder.close();
    }
}

impl Surface for RasterSurface {
    type Image = ts::Pixmap;

    fn size(&self) -> (f64, f64) {
        (
            f64::from(self.pixmap.width()),
            f64::from(self.pixmap.height()),
        )
    }

    fn clear(&mut self) {
        self.pixmap.fill(ts::Color::TRANSPARENT);
    }

    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn concat_transform(&mut self, transform: &Transform) {
        let t = ts::Transform::from_row(
            transform.a as f32,
            transform.b as f32,
            transform.c as f32,
            transform.d as f32,
            transform.tx as f32,
            transform.ty as f32,
        );
        self.state.transform = self.state.transform.pre_concat(t);
    }

    fn set_alpha(&mut self, alpha: f64) {
        self.state.alpha = alpha.clamp(0.0, 1.0) as f32;
    }

    fn set_composite(&mut self, mode: CompositeMode) {
        self.composite = mode;
    }

    fn begin_path(&mut self) {
        self.builder = ts::PathBuilder::new();
    }

    fn clip(&mut self) {
        // The renderer applies at most one clip per saved scope, so the
        // mask replaces rather than intersects.
        let Some(path) = self.finished_path() else {
            return;
        };
        let Some(mut mask) = ts::Mask::new(self.pixmap.width(), self.pixmap.height()) else {
            return;
        };
        mask.fill_path(&path, ts::FillRule::Winding, true, self.state.transform);
        self.state.clip = Some(mask);
    }

    fn fill(&mut self, color: Rgba) {
        let Some(path) = self.finished_path() else {
            return;
        };
        let mut paint = ts::Paint::default();
        paint.set_color(self.color(color));
        paint.anti_alias = true;
        match self.composite {
            CompositeMode::SourceOver => {
                self.pixmap.fill_path(
                    &path,
                    &paint,
                    ts::FillRule::Winding,
                    self.state.transform,
                    self.state.clip.as_ref(),
                );
            }
            CompositeMode::DestinationIn => {
                let Some(mut coverage) = self.coverage_scratch() else {
                    return;
                };
                coverage.fill_path(
                    &path,
                    &paint,
                    ts::FillRule::Winding,
                    self.state.transform,
                    self.state.clip.as_ref(),
                );
                self.apply_destination_in(&coverage);
            }
        }
    }

    fn stroke(&mut self, color: Rgba, params: &StrokeParams) {
        let Some(path) = self.finished_path() else {
            return;
        };
        let mut paint = ts::Paint::default();
        paint.set_color(self.color(color));
        paint.anti_alias = true;
        let stroke = ts::Stroke {
            width: params.width.max(0.0) as f32,
            miter_limit: if params.miter_limit > 0.0 {
                params.miter_limit as f32
            } else {
                ts::Stroke::default().miter_limit
            },
            line_cap: match params.cap {
                LineCap::Butt => ts::LineCap::Butt,
                LineCap::Round => ts::LineCap::Round,
                LineCap::Square => ts::LineCap::Square,
            },
            line_join: match params.join {
                LineJoin::Miter => ts::LineJoin::Miter,
                LineJoin::Round => ts::LineJoin::Round,
                LineJoin::Bevel => ts::LineJoin::Bevel,
            },
            dash: params.dash.and_then(|d| {
                ts::StrokeDash::new(
                    vec![d.intervals[0] as f32, d.intervals[1] as f32],
                    d.phase as f32,
                )
            }),
        };
        match self.composite {
            CompositeMode::SourceOver => {
                self.pixmap.stroke_path(
                    &path,
                    &paint,
                    &stroke,
                    self.state.transform,
                    self.state.clip.as_ref(),
                );
            }
            CompositeMode::DestinationIn => {
                let Some(mut coverage) = self.coverage_scratch() else {
                    return;
                };
                coverage.stroke_path(
                    &path,
                    &paint,
                    &stroke,
                    self.state.transform,
                    self.state.clip.as_ref(),
                );
                self.apply_destination_in(&coverage);
            }
        }
    }

    fn draw_image(&mut self, image: &Self::Image, width: f64, height: f64) {
        if image.width() == 0 || image.height() == 0 || width <= 0.0 || height <= 0.0 {
            return;
        }
        let sx = (width / f64::from(image.width())) as f32;
        let sy = (height / f64::from(image.height())) as f32;
        let transform = self.state.transform.pre_scale(sx, sy);
        let paint = ts::PixmapPaint {
            opacity: self.state.alpha,
            blend_mode: ts::BlendMode::SourceOver,
            quality: ts::FilterQuality::Bilinear,
        };
        match self.composite {
            CompositeMode::SourceOver => {
                self.pixmap.draw_pixmap(
                    0,
                    0,
                    image.as_ref(),
                    &paint,
                    transform,
                    self.state.clip.as_ref(),
                );
            }
            CompositeMode::DestinationIn => {
                let Some(mut coverage) = self.coverage_scratch() else {
                    return;
                };
                coverage.draw_pixmap(
                    0,
                    0,
                    image.as_ref(),
                    &paint,
                    transform,
                    self.state.clip.as_ref(),
                );
                self.apply_destination_in(&coverage);
            }
        }
    }

    fn measure_text(&mut self, _text: &str, _size: f64, _family: &str) -> f64 {
        0.0
    }

    fn draw_text(&mut self, text: &str, _x: f64, _y: f64, _size: f64, _family: &str, _color: Rgba) {
        if !self.warned_text {
            self.warned_text = true;
            tracing::warn!(
                text,
                "raster surface cannot draw text overlays, skipping them"
            );
        }
    }
}

/// Decodes encoded bitmap bytes (PNG/JPEG) into premultiplied pixmaps.
#[derive(Clone, Copy, Debug, Default)]
pub struct PixmapDecoder;

impl BitmapDecoder for PixmapDecoder {
    type Image = ts::Pixmap;

    fn decode(&mut self, bytes: &[u8]) -> SvgaResult<Self::Image> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| SvgaError::asset_load(e.to_string()))?
            .to_rgba8();
        let (width, height) = decoded.dimensions();
        let mut data = decoded.into_raw();
        for px in data.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            px[0] = ((u16::from(px[0]) * a) / 255) as u8;
            px[1] = ((u16::from(px[1]) * a) / 255) as u8;
            px[2] = ((u16::from(px[2]) * a) / 255) as u8;
        }
        let size = ts::IntSize::from_wh(width, height)
            .ok_or_else(|| SvgaError::asset_load("bitmap has zero dimension"))?;
        ts::Pixmap::from_vec(data, size)
            .ok_or_else(|| SvgaError::asset_load("bitmap buffer size mismatch"))
    }
}
