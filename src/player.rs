//! Playback orchestration: binds a decoded movie to a surface, resolves
//! bitmap assets through the host, drives the animator from host ticks and
//! owns the dynamic overlay maps.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::animator::{AnimatorEvent, FillRule, ValueAnimator};
use crate::host::{BitmapDecoder, Clock, SystemClock};
use crate::model::{Movie, Transform};
use crate::renderer::{DynamicText, Renderer};
use crate::surface::Surface;

/// How the movie canvas is mapped onto the surface before every draw.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ContentMode {
    /// Independent per-axis scale; exactly covers the surface.
    Fill,
    /// Uniform scale, whole canvas visible, remaining axis centered.
    #[default]
    AspectFit,
    /// Uniform scale, surface fully covered, overflowing axis centered.
    AspectFill,
}

/// A playback sub-range: frames `location ..= location + length`, clamped
/// to the movie's bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameRange {
    pub location: usize,
    pub length: usize,
}

pub struct Player<S: Surface> {
    surface: S,
    clock: Box<dyn Clock>,
    renderer: Option<Renderer>,
    decoded_images: BTreeMap<String, S::Image>,
    dynamic_images: BTreeMap<String, S::Image>,
    dynamic_texts: BTreeMap<String, DynamicText>,
    animator: ValueAnimator,
    current_frame: usize,
    content_mode: ContentMode,
    /// Loop count for subsequent starts; non-positive means infinite.
    pub loops: i32,
    /// Sticky default for [`Player::stop_animation`].
    pub clears_after_stop: bool,
    pub fill_mode: FillRule,
    on_finished: Option<Box<dyn FnMut()>>,
    on_frame: Option<Box<dyn FnMut(usize)>>,
    on_percentage: Option<Box<dyn FnMut(f64)>>,
}

impl<S: Surface> Player<S> {
    pub fn new(surface: S) -> Self {
        Self::with_clock(surface, Box::new(SystemClock::new()))
    }

    pub fn with_clock(surface: S, clock: Box<dyn Clock>) -> Self {
        Self {
            surface,
            clock,
            renderer: None,
            decoded_images: BTreeMap::new(),
            dynamic_images: BTreeMap::new(),
            dynamic_texts: BTreeMap::new(),
            animator: ValueAnimator::default(),
            current_frame: 0,
            content_mode: ContentMode::default(),
            loops: 0,
            clears_after_stop: true,
            fill_mode: FillRule::Forward,
            on_finished: None,
            on_frame: None,
            on_percentage: None,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn movie(&self) -> Option<&Movie> {
        self.renderer.as_ref().map(Renderer::movie)
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn is_animating(&self) -> bool {
        self.animator.is_running()
    }

    /// Bind a movie (or unbind with `None`): resets to frame 0, resolves
    /// every referenced bitmap through `decoder` — per-asset failures are
    /// tolerated and leave the asset absent — then builds a fresh renderer
    /// and draws frame 0.
    pub fn set_movie<D>(&mut self, movie: Option<Movie>, decoder: &mut D)
    where
        D: BitmapDecoder<Image = S::Image>,
    {
        self.animator.stop();
        self.current_frame = 0;
        self.decoded_images.clear();
        match movie {
            Some(movie) => {
                for (key, bytes) in &movie.images {
                    match decoder.decode(bytes) {
                        Ok(image) => {
                            self.decoded_images.insert(key.clone(), image);
                        }
                        Err(error) => tracing::warn!(
                            key = %key,
                            %error,
                            "asset decode failed, continuing without it"
                        ),
                    }
                }
                self.renderer = Some(Renderer::new(Rc::new(movie)));
            }
            None => self.renderer = None,
        }
        self.surface.clear();
        self.update();
    }

    pub fn set_content_mode(&mut self, mode: ContentMode) {
        self.content_mode = mode;
        self.update();
    }

    pub fn start_animation(&mut self, reverse: bool) {
        self.stop_animation(Some(false));
        self.do_start(None, reverse, None);
    }

    pub fn start_animation_with_range(&mut self, range: FrameRange, reverse: bool) {
        self.stop_animation(Some(false));
        self.do_start(Some(range), reverse, None);
    }

    pub fn pause_animation(&mut self) {
        self.stop_animation(Some(false));
    }

    /// Stop ticking. `clear` overrides the sticky [`clears_after_stop`]
    /// default when given.
    ///
    /// [`clears_after_stop`]: Player::clears_after_stop
    pub fn stop_animation(&mut self, clear: Option<bool>) {
        self.animator.stop();
        if clear.unwrap_or(self.clears_after_stop) {
            self.clear();
        }
    }

    pub fn clear(&mut self) {
        self.surface.clear();
    }

    /// Jump to `frame`; out-of-range frames are silently ignored.
    pub fn step_to_frame(&mut self, frame: usize, and_play: bool) {
        let Some(frames) = self.movie().map(|m| m.frames) else {
            return;
        };
        if frame >= frames {
            return;
        }
        self.pause_animation();
        self.current_frame = frame;
        self.update();
        if and_play {
            self.do_start(None, false, Some(frame as f64));
        }
    }

    /// Jump to `percentage` of the timeline. A full 1.0 resolves to the
    /// last frame, never one past it.
    pub fn step_to_percentage(&mut self, percentage: f64, and_play: bool) {
        let Some(frames) = self.movie().map(|m| m.frames) else {
            return;
        };
        let mut frame = percentage * frames as f64;
        if frame >= frames as f64 && percentage > 0.0 {
            frame = frames as f64 - 1.0;
        }
        if !frame.is_finite() || frame < 0.0 {
            return;
        }
        self.step_to_frame(frame as usize, and_play);
    }

    /// Register a per-key bitmap override consulted before decoded assets.
    pub fn set_image(&mut self, key: impl Into<String>, image: S::Image) {
        self.dynamic_images.insert(key.into(), image);
        self.update();
    }

    /// Register a per-key text overlay drawn centered in the sprite layout.
    pub fn set_text(&mut self, key: impl Into<String>, text: DynamicText) {
        self.dynamic_texts.insert(key.into(), text);
        self.update();
    }

    pub fn clear_dynamic_objects(&mut self) {
        self.dynamic_images.clear();
        self.dynamic_texts.clear();
        self.update();
    }

    pub fn on_finished(&mut self, callback: impl FnMut() + 'static) {
        self.on_finished = Some(Box::new(callback));
    }

    /// One call per distinct displayed frame.
    pub fn on_frame(&mut self, callback: impl FnMut(usize) + 'static) {
        self.on_frame = Some(Box::new(callback));
    }

    /// Fired together with `on_frame`, with `frame + 1/frames` (the
    /// format's observed increment value, not a normalized ratio).
    pub fn on_percentage(&mut self, callback: impl FnMut(f64) + 'static) {
        self.on_percentage = Some(Box::new(callback));
    }

    /// Advance playback; the host calls this once per display refresh.
    /// Stopping takes effect here, at the tick boundary.
    pub fn tick(&mut self) {
        if self.renderer.is_none() {
            return;
        }
        let now = self.clock.now_ms();
        match self.animator.tick(now) {
            Some(AnimatorEvent::Update(value)) => self.apply_animator_value(value),
            Some(AnimatorEvent::Finished(value)) => {
                self.apply_animator_value(value);
                if self.clears_after_stop {
                    self.clear();
                }
                if let Some(callback) = self.on_finished.as_mut() {
                    callback();
                }
            }
            None => {}
        }
    }

    fn apply_animator_value(&mut self, value: f64) {
        let frame = value.max(0.0).floor() as usize;
        if frame == self.current_frame {
            return;
        }
        self.current_frame = frame;
        self.update();
        let frames = self.movie().map(|m| m.frames).unwrap_or(0);
        if let Some(callback) = self.on_frame.as_mut() {
            callback(frame);
        }
        if frames > 0
            && let Some(callback) = self.on_percentage.as_mut()
        {
            callback(frame as f64 + 1.0 / frames as f64);
        }
    }

    fn do_start(&mut self, range: Option<FrameRange>, reverse: bool, from_value: Option<f64>) {
        let Some(movie) = self.movie() else {
            return;
        };
        let frames = movie.frames;
        let fps = movie.fps;
        if frames == 0 {
            return;
        }
        let frame_ms = 1000.0 / f64::from(fps);
        let mut animator = ValueAnimator::default();
        match range {
            Some(range) => {
                let start = range.location.min(frames - 1);
                let end = range
                    .location
                    .saturating_add(range.length)
                    .min(frames - 1)
                    .max(start);
                animator.start_value = start as f64;
                animator.end_value = end as f64;
                animator.duration_ms = (end - start + 1) as f64 * frame_ms;
            }
            None => {
                animator.start_value = 0.0;
                animator.end_value = (frames - 1) as f64;
                animator.duration_ms = frames as f64 * frame_ms;
            }
        }
        animator.set_loops(self.loops);
        animator.fill_rule = self.fill_mode;
        let now = self.clock.now_ms();
        if reverse {
            animator.start_reversed(now, from_value);
        } else {
            animator.start(now, from_value);
        }
        self.current_frame = from_value.unwrap_or(animator.start_value).max(0.0) as usize;
        self.animator = animator;
        self.update();
    }

    /// Recompute the fit transform and redraw the current frame.
    fn update(&mut self) {
        let Some(renderer) = self.renderer.as_ref() else {
            return;
        };
        let surface_size = self.surface.size();
        let movie = renderer.movie();
        let global = fit_transform(self.content_mode, surface_size, (movie.width, movie.height));
        renderer.draw_frame(
            &mut self.surface,
            self.current_frame,
            &global,
            &self.decoded_images,
            &self.dynamic_images,
            &self.dynamic_texts,
        );
    }
}

/// Global transform mapping a movie canvas onto a surface for a content
/// mode. Degenerate movie sizes fall back to identity.
pub fn fit_transform(
    mode: ContentMode,
    surface_size: (f64, f64),
    movie_size: (f64, f64),
) -> Transform {
    let (sw, sh) = surface_size;
    let (mw, mh) = movie_size;
    if mw <= 0.0 || mh <= 0.0 {
        return Transform::IDENTITY;
    }
    match mode {
        ContentMode::Fill => Transform {
            a: sw / mw,
            d: sh / mh,
            ..Transform::IDENTITY
        },
        ContentMode::AspectFit | ContentMode::AspectFill => {
            let ratio_x = sw / mw;
            let ratio_y = sh / mh;
            let scale = if mode == ContentMode::AspectFit {
                ratio_x.min(ratio_y)
            } else {
                ratio_x.max(ratio_y)
            };
            Transform {
                a: scale,
                d: scale,
                tx: (sw - mw * scale) / 2.0,
                ty: (sh - mh * scale) / 2.0,
                ..Transform::IDENTITY
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_fit_centers_remaining_axis() {
        let t = fit_transform(ContentMode::AspectFit, (400.0, 400.0), (100.0, 200.0));
        assert_eq!(t.a, 2.0);
        assert_eq!(t.d, 2.0);
        assert_eq!(t.tx, 100.0);
        assert_eq!(t.ty, 0.0);
        assert_eq!(t.b, 0.0);
        assert_eq!(t.c, 0.0);
    }

    #[test]
    fn aspect_fill_covers_surface() {
        let t = fit_transform(ContentMode::AspectFill, (400.0, 400.0), (100.0, 200.0));
        assert_eq!(t.a, 4.0);
        assert_eq!(t.d, 4.0);
        assert_eq!(t.tx, 0.0);
        // 200 * 4 = 800 overflows by 400, centered at -200.
        assert_eq!(t.ty, -200.0);
    }

    #[test]
    fn fill_scales_axes_independently() {
        let t = fit_transform(ContentMode::Fill, (400.0, 300.0), (100.0, 200.0));
        assert_eq!(t.a, 4.0);
        assert_eq!(t.d, 1.5);
        assert_eq!(t.tx, 0.0);
        assert_eq!(t.ty, 0.0);
    }

    #[test]
    fn degenerate_movie_size_is_identity() {
        let t = fit_transform(ContentMode::AspectFit, (400.0, 400.0), (0.0, 200.0));
        assert_eq!(t, Transform::IDENTITY);
    }
}
