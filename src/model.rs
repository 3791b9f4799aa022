//! Immutable entity tree decoded from an SVGA container.
//!
//! `Movie` owns its whole subtree and is never mutated after construction;
//! drawable images and runtime overrides live outside the tree (see
//! [`crate::player::Player`]) so one decoded movie can be replayed with
//! different content.

use std::collections::BTreeMap;

use crate::error::{SvgaError, SvgaResult};

/// Image keys ending in this suffix mark a sprite as a matte mask source.
pub const MATTE_SUFFIX: &str = ".matte";

#[derive(Clone, Debug)]
pub struct Movie {
    pub version: String,
    pub width: f64,
    pub height: f64,
    pub fps: u32,
    pub frames: usize,
    pub sprites: Vec<Sprite>,
    /// Parsed but never played.
    pub audios: Vec<Audio>,
    /// Raw encoded bitmap bytes keyed by asset name.
    pub images: BTreeMap<String, Vec<u8>>,
}

#[derive(Clone, Debug)]
pub struct Sprite {
    pub image_key: Option<String>,
    pub matte_key: Option<String>,
    pub frames: Vec<Frame>,
}

#[derive(Clone, Debug)]
pub struct Frame {
    pub alpha: f64,
    pub transform: Transform,
    pub layout: Layout,
    /// Raw path-command string applied as a clip before drawing.
    pub clip_path: Option<String>,
    pub shapes: Vec<Shape>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Layout {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Debug)]
pub struct Shape {
    pub geometry: Geometry,
    pub transform: Option<Transform>,
    pub style: Style,
}

#[derive(Clone, Debug)]
pub enum Geometry {
    Path {
        d: String,
    },
    Ellipse {
        x: f64,
        y: f64,
        radius_x: f64,
        radius_y: f64,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        corner_radius: f64,
    },
}

/// Fractional RGBA, each channel in `0..=1`. Mapped to the surface's native
/// representation at draw time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineDash {
    pub intervals: [f64; 2],
    pub phase: f64,
}

/// Absent fill/stroke means the corresponding pass is skipped entirely;
/// there is no implicit default color.
#[derive(Clone, Debug, Default)]
pub struct Style {
    pub fill: Option<Rgba>,
    pub stroke: Option<Rgba>,
    pub stroke_width: f64,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub miter_limit: f64,
    pub dash: Option<LineDash>,
}

#[derive(Clone, Debug)]
pub struct Audio {
    pub audio_key: String,
    pub start_frame: u32,
    pub end_frame: u32,
    pub start_time: u32,
    pub total_time: u32,
}

impl Sprite {
    /// True when this sprite is a matte mask source and must be excluded
    /// from the normal compositing pass.
    pub fn is_mask_source(&self) -> bool {
        self.image_key
            .as_deref()
            .is_some_and(|k| k.ends_with(MATTE_SUFFIX))
    }

    /// Image key with the matte suffix stripped; the key used to look up
    /// bitmaps and dynamic overlays.
    pub fn bitmap_key(&self) -> Option<&str> {
        self.image_key
            .as_deref()
            .map(|k| k.strip_suffix(MATTE_SUFFIX).unwrap_or(k))
    }

    /// Matte key when present and non-empty.
    pub fn group_key(&self) -> Option<&str> {
        self.matte_key.as_deref().filter(|k| !k.is_empty())
    }
}

impl Movie {
    pub fn validate(&self) -> SvgaResult<()> {
        if self.fps == 0 {
            return Err(SvgaError::decode("movie fps must be > 0"));
        }
        for (i, sprite) in self.sprites.iter().enumerate() {
            if sprite.frames.len() != self.frames {
                return Err(SvgaError::decode(format!(
                    "sprite {i} has {} frames, movie declares {}",
                    sprite.frames.len(),
                    self.frames
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sprite(image_key: Option<&str>, matte_key: Option<&str>) -> Sprite {
        Sprite {
            image_key: image_key.map(str::to_string),
            matte_key: matte_key.map(str::to_string),
            frames: vec![],
        }
    }

    #[test]
    fn mask_source_detection() {
        assert!(sprite(Some("overlay.matte"), None).is_mask_source());
        assert!(!sprite(Some("overlay"), None).is_mask_source());
        assert!(!sprite(None, None).is_mask_source());
    }

    #[test]
    fn bitmap_key_strips_suffix() {
        assert_eq!(
            sprite(Some("overlay.matte"), None).bitmap_key(),
            Some("overlay")
        );
        assert_eq!(sprite(Some("overlay"), None).bitmap_key(), Some("overlay"));
        assert_eq!(sprite(None, None).bitmap_key(), None);
    }

    #[test]
    fn empty_matte_key_is_no_group() {
        assert_eq!(sprite(Some("a"), Some("")).group_key(), None);
        assert_eq!(sprite(Some("a"), Some("g")).group_key(), Some("g"));
    }

    #[test]
    fn validate_rejects_frame_count_mismatch() {
        let movie = Movie {
            version: "2.0.0".to_string(),
            width: 100.0,
            height: 100.0,
            fps: 20,
            frames: 3,
            sprites: vec![Sprite {
                image_key: Some("a".to_string()),
                matte_key: None,
                frames: vec![],
            }],
            audios: vec![],
            images: BTreeMap::new(),
        };
        assert!(movie.validate().is_err());
    }
}
