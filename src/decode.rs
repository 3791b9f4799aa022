//! Container decoding: compressed bytes -> [`Movie`].
//!
//! The pipeline is fetch, inflate, wire-decode, map, validate. Any stage
//! failing rejects the whole call with the first error; a partial `Movie`
//! is never produced.

use std::io::Read;

use prost::Message;

use crate::error::{SvgaError, SvgaResult};
use crate::host::ResourceLoader;
use crate::model::{
    Frame, Geometry, Layout, LineCap, LineDash, LineJoin, Movie, Rgba, Shape, Sprite, Style,
    Transform,
};
use crate::proto;
use crate::proto::shape_entity::{Args, ShapeType};

/// Frame rate assumed when the container omits one.
const DEFAULT_FPS: u32 = 20;

pub struct Decoder<L> {
    loader: L,
}

impl<L: ResourceLoader> Decoder<L> {
    pub fn new(loader: L) -> Self {
        Self { loader }
    }

    /// Fetch, inflate and decode the container at `locator`.
    pub fn load(&mut self, locator: &str) -> SvgaResult<Movie> {
        let compressed = self.loader.fetch(locator)?;
        let payload = inflate(&compressed)?;
        let entity = proto::MovieEntity::decode(payload.as_slice())?;
        let movie = map_movie(entity)?;
        tracing::debug!(
            version = %movie.version,
            width = movie.width,
            height = movie.height,
            fps = movie.fps,
            frames = movie.frames,
            sprites = movie.sprites.len(),
            "decoded movie"
        );
        Ok(movie)
    }
}

/// Inflate a zlib stream, falling back to raw DEFLATE for containers
/// written without the zlib wrapper.
pub fn inflate(bytes: &[u8]) -> SvgaResult<Vec<u8>> {
    let mut out = Vec::new();
    match flate2::read::ZlibDecoder::new(bytes).read_to_end(&mut out) {
        Ok(_) => Ok(out),
        Err(zlib_err) => {
            out.clear();
            flate2::read::DeflateDecoder::new(bytes)
                .read_to_end(&mut out)
                .map_err(|_| SvgaError::decompression(zlib_err.to_string()))?;
            Ok(out)
        }
    }
}

pub(crate) fn map_movie(entity: proto::MovieEntity) -> SvgaResult<Movie> {
    let params = entity.params.unwrap_or_default();
    let fps = if params.fps > 0 {
        params.fps as u32
    } else {
        DEFAULT_FPS
    };
    let movie = Movie {
        version: entity.version,
        width: f64::from(params.view_box_width.max(0.0)),
        height: f64::from(params.view_box_height.max(0.0)),
        fps,
        frames: params.frames.max(0) as usize,
        sprites: entity.sprites.into_iter().map(map_sprite).collect(),
        audios: entity
            .audios
            .into_iter()
            .map(|a| crate::model::Audio {
                audio_key: a.audio_key,
                start_frame: a.start_frame.max(0) as u32,
                end_frame: a.end_frame.max(0) as u32,
                start_time: a.start_time.max(0) as u32,
                total_time: a.total_time.max(0) as u32,
            })
            .collect(),
        images: entity.images,
    };
    movie.validate()?;
    Ok(movie)
}

fn map_sprite(entity: proto::SpriteEntity) -> Sprite {
    let mut frames = Vec::with_capacity(entity.frames.len());
    let mut last_shapes: Vec<Shape> = Vec::new();
    for frame in entity.frames {
        let mapped = map_frame(frame, &last_shapes);
        last_shapes = mapped.shapes.clone();
        frames.push(mapped);
    }
    Sprite {
        image_key: non_empty(entity.image_key),
        matte_key: non_empty(entity.matte_key),
        frames,
    }
}

fn map_frame(entity: proto::FrameEntity, last_shapes: &[Shape]) -> Frame {
    // A KEEP record repeats the previous frame's shape list; it is resolved
    // here so the renderer never sees it.
    let keep = entity
        .shapes
        .first()
        .is_some_and(|s| s.r#type == ShapeType::Keep as i32);
    let shapes = if keep {
        last_shapes.to_vec()
    } else {
        entity.shapes.into_iter().filter_map(map_shape).collect()
    };
    Frame {
        alpha: f64::from(entity.alpha.clamp(0.0, 1.0)),
        transform: entity.transform.map(map_transform).unwrap_or_default(),
        layout: entity
            .layout
            .map(|l| Layout {
                x: f64::from(l.x),
                y: f64::from(l.y),
                width: f64::from(l.width.max(0.0)),
                height: f64::from(l.height.max(0.0)),
            })
            .unwrap_or_default(),
        clip_path: non_empty(entity.clip_path),
        shapes,
    }
}

fn map_shape(entity: proto::ShapeEntity) -> Option<Shape> {
    let geometry = match entity.args? {
        Args::Shape(args) => Geometry::Path { d: args.d },
        Args::Ellipse(args) => Geometry::Ellipse {
            x: f64::from(args.x),
            y: f64::from(args.y),
            radius_x: f64::from(args.radius_x.max(0.0)),
            radius_y: f64::from(args.radius_y.max(0.0)),
        },
        Args::Rect(args) => Geometry::Rect {
            x: f64::from(args.x),
            y: f64::from(args.y),
            width: f64::from(args.width.max(0.0)),
            height: f64::from(args.height.max(0.0)),
            corner_radius: f64::from(args.corner_radius.max(0.0)),
        },
    };
    Some(Shape {
        geometry,
        transform: entity.transform.map(map_transform),
        style: entity.styles.map(map_style).unwrap_or_default(),
    })
}

fn map_style(style: proto::shape_entity::ShapeStyle) -> Style {
    let dash = (style.line_dash_i > 0.0 || style.line_dash_ii > 0.0).then(|| LineDash {
        intervals: [f64::from(style.line_dash_i), f64::from(style.line_dash_ii)],
        phase: f64::from(style.line_dash_iii),
    });
    Style {
        fill: style.fill.map(map_color),
        stroke: style.stroke.map(map_color),
        stroke_width: f64::from(style.stroke_width),
        line_cap: match style.line_cap {
            1 => LineCap::Round,
            2 => LineCap::Square,
            _ => LineCap::Butt,
        },
        line_join: match style.line_join {
            1 => LineJoin::Round,
            2 => LineJoin::Bevel,
            _ => LineJoin::Miter,
        },
        miter_limit: f64::from(style.miter_limit),
        dash,
    }
}

fn map_color(c: proto::shape_entity::RgbaColor) -> Rgba {
    Rgba {
        r: c.r,
        g: c.g,
        b: c.b,
        a: c.a,
    }
}

fn map_transform(t: proto::Transform) -> Transform {
    Transform {
        a: f64::from(t.a),
        b: f64::from(t.b),
        c: f64::from(t.c),
        d: f64::from(t.d),
        tx: f64::from(t.tx),
        ty: f64::from(t.ty),
    }
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inflate_rejects_garbage() {
        let err = inflate(&[0x13, 0x37, 0x00, 0xff]).unwrap_err();
        assert!(matches!(err, SvgaError::Decompression(_)));
    }

    #[test]
    fn inflate_accepts_zlib_and_raw_deflate() {
        use std::io::Write;

        let payload = b"frame payload bytes".to_vec();

        let mut z = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        z.write_all(&payload).unwrap();
        assert_eq!(inflate(&z.finish().unwrap()).unwrap(), payload);

        let mut d = flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
        d.write_all(&payload).unwrap();
        assert_eq!(inflate(&d.finish().unwrap()).unwrap(), payload);
    }

    #[test]
    fn keep_shapes_repeat_previous_frame() {
        let path = proto::ShapeEntity {
            r#type: ShapeType::Shape as i32,
            args: Some(Args::Shape(proto::shape_entity::ShapeArgs {
                d: "M0 0 L10 10".to_string(),
            })),
            styles: None,
            transform: None,
        };
        let keep = proto::ShapeEntity {
            r#type: ShapeType::Keep as i32,
            args: None,
            styles: None,
            transform: None,
        };
        let frame = |shapes: Vec<proto::ShapeEntity>| proto::FrameEntity {
            alpha: 1.0,
            layout: None,
            transform: None,
            clip_path: String::new(),
            shapes,
        };
        let sprite = map_sprite(proto::SpriteEntity {
            image_key: "img".to_string(),
            frames: vec![frame(vec![path]), frame(vec![keep])],
            matte_key: String::new(),
        });
        assert_eq!(sprite.frames[0].shapes.len(), 1);
        assert_eq!(sprite.frames[1].shapes.len(), 1);
        assert!(matches!(
            sprite.frames[1].shapes[0].geometry,
            Geometry::Path { .. }
        ));
    }

    #[test]
    fn missing_params_fall_back_to_defaults() {
        let movie = map_movie(proto::MovieEntity {
            version: "2.0.0".to_string(),
            params: None,
            images: Default::default(),
            sprites: vec![],
            audios: vec![],
        })
        .unwrap();
        assert_eq!(movie.fps, DEFAULT_FPS);
        assert_eq!(movie.frames, 0);
        assert_eq!(movie.width, 0.0);
    }
}
