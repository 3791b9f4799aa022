//! Shared test support: a surface that records every draw call so tests
//! can assert on compositing order, grouping and save/restore balance.

#![allow(dead_code)]

use svgaplay::{CompositeMode, PathSink, Rgba, StrokeParams, Surface, Transform};

/// Route tracing output through the test harness; safe to call from every
/// test, only the first install wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Clear,
    Save,
    Restore,
    Transform(Transform),
    Alpha(f64),
    Composite(CompositeMode),
    BeginPath,
    MoveTo(f64, f64),
    LineTo(f64, f64),
    CubicTo(f64, f64, f64, f64, f64, f64),
    QuadTo(f64, f64, f64, f64),
    ClosePath,
    Clip,
    Fill(Rgba),
    Stroke(Rgba),
    DrawImage {
        name: String,
        width: f64,
        height: f64,
    },
    DrawText {
        text: String,
        x: f64,
        y: f64,
        family: String,
    },
}

pub struct RecordingSurface {
    pub width: f64,
    pub height: f64,
    pub calls: Vec<Call>,
}

impl RecordingSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            calls: Vec::new(),
        }
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn position(&self, pred: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls.iter().position(|c| pred(c))
    }

    pub fn drawn_images(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::DrawImage { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl PathSink for RecordingSurface {
    fn move_to(&mut self, x: f64, y: f64) {
        self.calls.push(Call::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.calls.push(Call::LineTo(x, y));
    }

    fn cubic_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) {
        self.calls.push(Call::CubicTo(x1, y1, x2, y2, x, y));
    }

    fn quad_to(&mut self, x1: f64, y1: f64, x: f64, y: f64) {
        self.calls.push(Call::QuadTo(x1, y1, x, y));
    }

    fn close_path(&mut self) {
        self.calls.push(Call::ClosePath);
    }
}

impl Surface for RecordingSurface {
    /// Images are just names; tests only care which one was drawn.
    type Image = String;

    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.calls.push(Call::Clear);
    }

    fn save(&mut self) {
        self.calls.push(Call::Save);
    }

    fn restore(&mut self) {
        self.calls.push(Call::Restore);
    }

    fn concat_transform(&mut self, transform: &Transform) {
        self.calls.push(Call::Transform(*transform));
    }

    fn set_alpha(&mut self, alpha: f64) {
        self.calls.push(Call::Alpha(alpha));
    }

    fn set_composite(&mut self, mode: CompositeMode) {
        self.calls.push(Call::Composite(mode));
    }

    fn begin_path(&mut self) {
        self.calls.push(Call::BeginPath);
    }

    fn clip(&mut self) {
        self.calls.push(Call::Clip);
    }

    fn fill(&mut self, color: Rgba) {
        self.calls.push(Call::Fill(color));
    }

    fn stroke(&mut self, color: Rgba, _params: &StrokeParams) {
        self.calls.push(Call::Stroke(color));
    }

    fn draw_image(&mut self, image: &Self::Image, width: f64, height: f64) {
        self.calls.push(Call::DrawImage {
            name: image.clone(),
            width,
            height,
        });
    }

    fn measure_text(&mut self, text: &str, size: f64, _family: &str) -> f64 {
        // Deterministic fake metrics: half the font size per character.
        text.chars().count() as f64 * size / 2.0
    }

    fn draw_text(&mut self, text: &str, x: f64, y: f64, _size: f64, family: &str, _color: Rgba) {
        self.calls.push(Call::DrawText {
            text: text.to_string(),
            x,
            y,
            family: family.to_string(),
        });
    }
}
