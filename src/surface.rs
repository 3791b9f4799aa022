//! Canvas-style drawing abstraction the renderer composites onto.
//!
//! Acquiring a real surface is the host's concern; the crate ships a CPU
//! implementation in [`crate::raster`] and tests use a recording impl.
//! State (transform, alpha, clip, composite mode) follows the familiar
//! save/restore stack discipline and the renderer keeps every pair
//! balanced.

use crate::model::{LineCap, LineDash, LineJoin, Rgba, Style, Transform};

/// Receiver for path geometry emitted by the command interpreter.
pub trait PathSink {
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn cubic_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64);
    fn quad_to(&mut self, x1: f64, y1: f64, x: f64, y: f64);
    fn close_path(&mut self);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompositeMode {
    #[default]
    SourceOver,
    /// Keep destination pixels only where the source is opaque; used for
    /// matte mask application.
    DestinationIn,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeParams {
    pub width: f64,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f64,
    pub dash: Option<LineDash>,
}

impl StrokeParams {
    pub fn from_style(style: &Style) -> Self {
        Self {
            width: style.stroke_width,
            cap: style.line_cap,
            join: style.line_join,
            miter_limit: style.miter_limit,
            dash: style.dash,
        }
    }
}

pub trait Surface: PathSink {
    /// Host-decoded drawable image type.
    type Image;

    /// Surface pixel size.
    fn size(&self) -> (f64, f64);

    /// Clear the full surface rectangle.
    fn clear(&mut self);

    fn save(&mut self);
    fn restore(&mut self);

    /// Concatenate onto the current transform.
    fn concat_transform(&mut self, transform: &Transform);

    /// Set the opacity multiplier for subsequent draws.
    fn set_alpha(&mut self, alpha: f64);

    fn set_composite(&mut self, mode: CompositeMode);

    /// Start a fresh path; geometry then arrives through [`PathSink`].
    fn begin_path(&mut self);

    /// Use the current path as a clip for subsequent draws (until restore).
    fn clip(&mut self);

    fn fill(&mut self, color: Rgba);
    fn stroke(&mut self, color: Rgba, params: &StrokeParams);

    /// Draw `image` scaled into a `width` x `height` rectangle at the
    /// current origin.
    fn draw_image(&mut self, image: &Self::Image, width: f64, height: f64);

    /// Advance width of `text`, used to center dynamic text overlays.
    fn measure_text(&mut self, text: &str, size: f64, family: &str) -> f64;

    fn draw_text(&mut self, text: &str, x: f64, y: f64, size: f64, family: &str, color: Rgba);
}
