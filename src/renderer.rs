//! Per-frame compositor.
//!
//! A `Renderer` is scoped to one [`Movie`] and draws one requested frame
//! per call onto a [`Surface`]. Decoded bitmaps and dynamic overrides are
//! not owned here; the player passes them into every draw by reference.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::model::{Layout, Movie, Rgba, Shape, Sprite, Transform};
use crate::path::{trace_ellipse, trace_path, trace_rounded_rect};
use crate::surface::{CompositeMode, StrokeParams, Surface};

/// Frames below this alpha contribute nothing. A documented approximation
/// inherited from the format's reference renderer, not an exact-zero test.
pub const ALPHA_CUTOFF: f64 = 0.05;

/// Runtime text substitution drawn centered in a sprite's layout rect.
#[derive(Clone, Debug)]
pub struct DynamicText {
    pub text: String,
    pub size: f64,
    /// Empty means a generic sans-serif.
    pub family: String,
    pub color: Rgba,
    pub offset_x: f64,
    pub offset_y: f64,
}

pub struct Renderer {
    movie: Rc<Movie>,
}

impl Renderer {
    pub fn new(movie: Rc<Movie>) -> Self {
        Self { movie }
    }

    pub fn movie(&self) -> &Movie {
        &self.movie
    }

    /// Composite `frame_index` onto `surface`: one full clear, then
    /// sprites in declared order with matte grouping.
    pub fn draw_frame<S: Surface>(
        &self,
        surface: &mut S,
        frame_index: usize,
        global_transform: &Transform,
        images: &BTreeMap<String, S::Image>,
        dynamic_images: &BTreeMap<String, S::Image>,
        dynamic_texts: &BTreeMap<String, DynamicText>,
    ) {
        surface.clear();

        // Mask sources are set aside by their full image key and never
        // drawn in the main pass.
        let mask_sources: BTreeMap<&str, &Sprite> = self
            .movie
            .sprites
            .iter()
            .filter(|s| s.is_mask_source())
            .filter_map(|s| s.image_key.as_deref().map(|k| (k, s)))
            .collect();

        let mut active_group: Option<&str> = None;
        for sprite in &self.movie.sprites {
            if sprite.is_mask_source() {
                continue;
            }
            let group_key = sprite.group_key();
            if let Some(current) = active_group
                && group_key != Some(current)
            {
                self.finish_matte_group(
                    surface,
                    current,
                    frame_index,
                    global_transform,
                    &mask_sources,
                    images,
                    dynamic_images,
                    dynamic_texts,
                );
                active_group = None;
            }
            if let Some(key) = group_key
                && active_group.is_none()
            {
                surface.save();
                active_group = Some(key);
            }
            self.draw_sprite(
                surface,
                sprite,
                frame_index,
                global_transform,
                images,
                dynamic_images,
                dynamic_texts,
            );
        }
        if let Some(current) = active_group {
            self.finish_matte_group(
                surface,
                current,
                frame_index,
                global_transform,
                &mask_sources,
                images,
                dynamic_images,
                dynamic_texts,
            );
        }
    }

    /// Apply the group's mask under destination-in compositing, then drop
    /// the saved state that opened the group.
    #[allow(clippy::too_many_arguments)]
    fn finish_matte_group<S: Surface>(
        &self,
        surface: &mut S,
        matte_key: &str,
        frame_index: usize,
        global_transform: &Transform,
        mask_sources: &BTreeMap<&str, &Sprite>,
        images: &BTreeMap<String, S::Image>,
        dynamic_images: &BTreeMap<String, S::Image>,
        dynamic_texts: &BTreeMap<String, DynamicText>,
    ) {
        match mask_sources.get(matte_key) {
            Some(mask) => {
                surface.set_composite(CompositeMode::DestinationIn);
                self.draw_sprite(
                    surface,
                    mask,
                    frame_index,
                    global_transform,
                    images,
                    dynamic_images,
                    dynamic_texts,
                );
                surface.set_composite(CompositeMode::SourceOver);
            }
            None => {
                tracing::warn!(matte_key, "matte group has no matching mask source");
            }
        }
        surface.restore();
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_sprite<S: Surface>(
        &self,
        surface: &mut S,
        sprite: &Sprite,
        frame_index: usize,
        global_transform: &Transform,
        images: &BTreeMap<String, S::Image>,
        dynamic_images: &BTreeMap<String, S::Image>,
        dynamic_texts: &BTreeMap<String, DynamicText>,
    ) {
        let Some(frame) = sprite.frames.get(frame_index) else {
            return;
        };
        if frame.alpha < ALPHA_CUTOFF {
            return;
        }
        surface.save();
        surface.concat_transform(global_transform);
        surface.set_alpha(frame.alpha);
        surface.concat_transform(&frame.transform);

        if let Some(d) = &frame.clip_path {
            surface.begin_path();
            trace_path(surface, d);
            surface.clip();
        }

        let bitmap_key = sprite.bitmap_key();
        if let Some(key) = bitmap_key {
            // Dynamic override wins over the decoded asset.
            let image = dynamic_images.get(key).or_else(|| images.get(key));
            if let Some(image) = image {
                surface.draw_image(image, frame.layout.width, frame.layout.height);
            }
        }

        for shape in &frame.shapes {
            draw_shape(surface, shape);
        }

        if let Some(key) = bitmap_key
            && let Some(text) = dynamic_texts.get(key)
        {
            draw_text_overlay(surface, text, &frame.layout);
        }

        surface.restore();
    }
}

fn draw_shape<S: Surface>(surface: &mut S, shape: &Shape) {
    surface.save();
    if let Some(transform) = &shape.transform {
        surface.concat_transform(transform);
    }
    surface.begin_path();
    match &shape.geometry {
        crate::model::Geometry::Path { d } => trace_path(surface, d),
        crate::model::Geometry::Ellipse {
            x,
            y,
            radius_x,
            radius_y,
        } => trace_ellipse(surface, *x, *y, *radius_x, *radius_y),
        crate::model::Geometry::Rect {
            x,
            y,
            width,
            height,
            corner_radius,
        } => trace_rounded_rect(surface, *x, *y, *width, *height, *corner_radius),
    }
    if let Some(fill) = shape.style.fill {
        surface.fill(fill);
    }
    if let Some(stroke) = shape.style.stroke {
        surface.stroke(stroke, &StrokeParams::from_style(&shape.style));
    }
    surface.restore();
}

fn draw_text_overlay<S: Surface>(surface: &mut S, text: &DynamicText, layout: &Layout) {
    let family = if text.family.is_empty() {
        "sans-serif"
    } else {
        text.family.as_str()
    };
    let offset_x = if text.offset_x.is_finite() {
        text.offset_x
    } else {
        0.0
    };
    let offset_y = if text.offset_y.is_finite() {
        text.offset_y
    } else {
        0.0
    };
    let text_width = surface.measure_text(&text.text, text.size, family);
    surface.draw_text(
        &text.text,
        (layout.width - text_width) / 2.0 + offset_x,
        layout.height / 2.0 + offset_y,
        text.size,
        family,
        text.color,
    );
}
