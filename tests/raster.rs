//! Full pipeline on the CPU surface: movie in, pixels out.

#![cfg(feature = "raster")]

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use svgaplay::{
    Clock, Frame, Geometry, Layout, Movie, PixmapDecoder, Player, RasterSurface, Rgba, Shape,
    Sprite, Style, Transform,
};

#[derive(Clone)]
struct ManualClock(Rc<Cell<f64>>);

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.0.get()
    }
}

fn frame() -> Frame {
    Frame {
        alpha: 1.0,
        transform: Transform::IDENTITY,
        layout: Layout {
            x: 0.0,
            y: 0.0,
            width: 8.0,
            height: 8.0,
        },
        clip_path: None,
        shapes: vec![],
    }
}

fn movie(frames: usize, sprites: Vec<Sprite>, images: BTreeMap<String, Vec<u8>>) -> Movie {
    Movie {
        version: "2.0.0".to_string(),
        width: 8.0,
        height: 8.0,
        fps: 20,
        frames,
        sprites,
        audios: vec![],
        images,
    }
}

fn png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let mut img = image::RgbaImage::new(width, height);
    for px in img.pixels_mut() {
        *px = image::Rgba(rgba);
    }
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

#[test]
fn vector_shape_rasterizes_to_pixels() {
    let mut f = frame();
    f.shapes.push(Shape {
        geometry: Geometry::Rect {
            x: 0.0,
            y: 0.0,
            width: 8.0,
            height: 8.0,
            corner_radius: 0.0,
        },
        transform: None,
        style: Style {
            fill: Some(Rgba {
                r: 1.0,
                g: 0.0,
                b: 0.0,
                a: 1.0,
            }),
            ..Style::default()
        },
    });
    let m = movie(
        1,
        vec![Sprite {
            image_key: None,
            matte_key: None,
            frames: vec![f],
        }],
        BTreeMap::new(),
    );

    let mut player = Player::new(RasterSurface::new(8, 8).unwrap());
    player.set_movie(Some(m), &mut PixmapDecoder);

    let px = player.surface().pixmap().pixel(4, 4).unwrap();
    assert_eq!(px.red(), 255);
    assert_eq!(px.alpha(), 255);
}

#[test]
fn bitmap_asset_scales_into_its_layout() {
    let mut images = BTreeMap::new();
    images.insert("a".to_string(), png(2, 2, [0, 0, 255, 255]));
    let m = movie(
        1,
        vec![Sprite {
            image_key: Some("a".to_string()),
            matte_key: None,
            frames: vec![frame()],
        }],
        images,
    );

    let mut player = Player::new(RasterSurface::new(8, 8).unwrap());
    player.set_movie(Some(m), &mut PixmapDecoder);

    // The 2x2 source is stretched over the 8x8 layout.
    let px = player.surface().pixmap().pixel(6, 6).unwrap();
    assert_eq!(px.blue(), 255);
    assert_eq!(px.alpha(), 255);
}

#[test]
fn matte_mask_clears_pixels_outside_its_bounds() {
    // Group member fills the whole 8x8 canvas.
    let mut member_frame = frame();
    member_frame.shapes.push(Shape {
        geometry: Geometry::Rect {
            x: 0.0,
            y: 0.0,
            width: 8.0,
            height: 8.0,
            corner_radius: 0.0,
        },
        transform: None,
        style: Style {
            fill: Some(Rgba {
                r: 1.0,
                g: 0.0,
                b: 0.0,
                a: 1.0,
            }),
            ..Style::default()
        },
    });
    // The mask bitmap only covers the left 4x8 half.
    let mut mask_frame = frame();
    mask_frame.layout.width = 4.0;
    let mut images = BTreeMap::new();
    images.insert("m".to_string(), png(4, 8, [255, 255, 255, 255]));
    let m = movie(
        1,
        vec![
            Sprite {
                image_key: None,
                matte_key: Some("m.matte".to_string()),
                frames: vec![member_frame],
            },
            Sprite {
                image_key: Some("m.matte".to_string()),
                matte_key: None,
                frames: vec![mask_frame],
            },
        ],
        images,
    );

    let mut player = Player::new(RasterSurface::new(8, 8).unwrap());
    player.set_movie(Some(m), &mut PixmapDecoder);

    let inside = player.surface().pixmap().pixel(2, 4).unwrap();
    assert_eq!(inside.alpha(), 255);
    assert_eq!(inside.red(), 255);
    // Pixels the mask never touched must be cleared, not left as drawn.
    assert_eq!(player.surface().pixmap().pixel(6, 4).unwrap().alpha(), 0);
}

#[test]
fn finished_playback_clears_the_surface() {
    let mut f = frame();
    f.shapes.push(Shape {
        geometry: Geometry::Rect {
            x: 0.0,
            y: 0.0,
            width: 8.0,
            height: 8.0,
            corner_radius: 0.0,
        },
        transform: None,
        style: Style {
            fill: Some(Rgba {
                r: 1.0,
                g: 1.0,
                b: 1.0,
                a: 1.0,
            }),
            ..Style::default()
        },
    });
    let m = movie(
        2,
        vec![Sprite {
            image_key: None,
            matte_key: None,
            frames: vec![f.clone(), f],
        }],
        BTreeMap::new(),
    );

    let clock = ManualClock(Rc::new(Cell::new(0.0)));
    let mut player = Player::with_clock(
        RasterSurface::new(8, 8).unwrap(),
        Box::new(clock.clone()),
    );
    player.set_movie(Some(m), &mut PixmapDecoder);
    player.loops = 1;
    player.start_animation(false);
    assert!(player.surface().pixmap().pixel(4, 4).unwrap().alpha() > 0);

    clock.0.set(1_000.0);
    player.tick();
    assert!(!player.is_animating());
    assert_eq!(player.surface().pixmap().pixel(4, 4).unwrap().alpha(), 0);
}
