//! Decoder and frame-accurate player for the SVGA binary animation
//! container.
//!
//! Pipeline: [`Decoder`] turns compressed container bytes into an immutable
//! [`Movie`]; a [`Player`] binds the movie to a [`Surface`], resolves its
//! bitmap assets through a host-provided [`BitmapDecoder`], and drives a
//! [`ValueAnimator`] from host refresh ticks; the internal renderer
//! composites each requested frame, including matte mask groups, vector
//! shape overlays and dynamic image/text substitutions.
//!
//! Host concerns (surface acquisition, remote fetching, bitmap decoding,
//! tick scheduling) are explicit trait seams in [`host`] and [`surface`].
//! With the default `raster` feature a self-contained CPU surface is
//! available in [`raster`].

#![forbid(unsafe_code)]

pub mod animator;
pub mod decode;
pub mod error;
pub mod host;
pub mod model;
pub mod path;
pub mod player;
pub mod proto;
#[cfg(feature = "raster")]
pub mod raster;
pub mod renderer;
pub mod surface;

pub use animator::{AnimatorEvent, FillRule, ValueAnimator};
pub use decode::Decoder;
pub use error::{SvgaError, SvgaResult};
pub use host::{BitmapDecoder, Clock, FileLoader, ResourceLoader, SystemClock};
pub use model::{
    Audio, Frame, Geometry, Layout, LineCap, LineDash, LineJoin, Movie, Rgba, Shape, Sprite, Style,
    Transform,
};
pub use player::{ContentMode, FrameRange, Player, fit_transform};
pub use renderer::{ALPHA_CUTOFF, DynamicText, Renderer};
pub use surface::{CompositeMode, PathSink, StrokeParams, Surface};

#[cfg(feature = "raster")]
pub use raster::{PixmapDecoder, RasterSurface};
