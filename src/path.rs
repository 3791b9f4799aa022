//! Path-command interpreter and primitive shape tracing.
//!
//! Commands follow the SVG-style single-letter grammar: uppercase is
//! absolute, lowercase relative to the running current point. `R`/`A`
//! (Catmull-Rom and elliptical arcs) are recognized so their segments are
//! consumed, but intentionally emit no geometry.

use crate::surface::PathSink;

/// Canonical circle-to-cubic-bezier control offset constant.
pub const KAPPA: f64 = 0.552_284_8;

const COMMANDS: &str = "MLHVCSQRZA";

/// Tokenize `d` into `(letter, args)` segments, splitting immediately
/// before each command letter. Unknown letters are dropped with their
/// arguments, matching the reference tokenizer.
fn segments(d: &str) -> impl Iterator<Item = (char, Vec<f64>)> + '_ {
    let mut parts: Vec<(char, String)> = Vec::new();
    for ch in d.chars() {
        if ch.is_ascii_alphabetic() {
            parts.push((ch, String::new()));
        } else if let Some((_, args)) = parts.last_mut() {
            args.push(if ch == ',' { ' ' } else { ch });
        }
    }
    parts.into_iter().filter_map(|(letter, args)| {
        if !COMMANDS.contains(letter.to_ascii_uppercase()) {
            return None;
        }
        let args = args
            .split_whitespace()
            .map(|a| a.parse::<f64>().unwrap_or(0.0))
            .collect();
        Some((letter, args))
    })
}

/// Interpret `d` and emit its geometry onto `sink`.
pub fn trace_path(sink: &mut impl PathSink, d: &str) {
    let mut cur = (0.0_f64, 0.0_f64);
    // Second control point of the most recent cubic; persists across
    // commands so a later S can reflect it.
    let mut last_ctrl2: Option<(f64, f64)> = None;

    for (letter, args) in segments(d) {
        let relative = letter.is_ascii_lowercase();
        let arg = |i: usize| args.get(i).copied().unwrap_or(0.0);
        let abs = |v: f64, base: f64| if relative { base + v } else { v };

        match letter.to_ascii_uppercase() {
            'M' => {
                cur = (abs(arg(0), cur.0), abs(arg(1), cur.1));
                sink.move_to(cur.0, cur.1);
            }
            'L' => {
                cur = (abs(arg(0), cur.0), abs(arg(1), cur.1));
                sink.line_to(cur.0, cur.1);
            }
            'H' => {
                cur.0 = abs(arg(0), cur.0);
                sink.line_to(cur.0, cur.1);
            }
            'V' => {
                cur.1 = abs(arg(0), cur.1);
                sink.line_to(cur.0, cur.1);
            }
            'C' => {
                let c1 = (abs(arg(0), cur.0), abs(arg(1), cur.1));
                let c2 = (abs(arg(2), cur.0), abs(arg(3), cur.1));
                cur = (abs(arg(4), cur.0), abs(arg(5), cur.1));
                sink.cubic_to(c1.0, c1.1, c2.0, c2.1, cur.0, cur.1);
                last_ctrl2 = Some(c2);
            }
            'S' => {
                if let Some(prev) = last_ctrl2 {
                    let c1 = (2.0 * cur.0 - prev.0, 2.0 * cur.1 - prev.1);
                    let c2 = (abs(arg(0), cur.0), abs(arg(1), cur.1));
                    cur = (abs(arg(2), cur.0), abs(arg(3), cur.1));
                    sink.cubic_to(c1.0, c1.1, c2.0, c2.1, cur.0, cur.1);
                    last_ctrl2 = Some(c2);
                } else {
                    // No preceding cubic control point to reflect; degrade
                    // to a quadratic with the given point as sole control.
                    let c1 = (abs(arg(0), cur.0), abs(arg(1), cur.1));
                    cur = (abs(arg(2), cur.0), abs(arg(3), cur.1));
                    sink.quad_to(c1.0, c1.1, cur.0, cur.1);
                }
            }
            'Q' => {
                let c1 = (abs(arg(0), cur.0), abs(arg(1), cur.1));
                cur = (abs(arg(2), cur.0), abs(arg(3), cur.1));
                sink.quad_to(c1.0, c1.1, cur.0, cur.1);
            }
            'Z' => sink.close_path(),
            // R and A tokenize but draw nothing.
            _ => {}
        }
    }
}

/// Approximate an axis-aligned ellipse with four cubic bezier arcs.
pub fn trace_ellipse(sink: &mut impl PathSink, cx: f64, cy: f64, rx: f64, ry: f64) {
    let ox = rx * KAPPA;
    let oy = ry * KAPPA;
    let (x0, x1) = (cx - rx, cx + rx);
    let (y0, y1) = (cy - ry, cy + ry);

    sink.move_to(x0, cy);
    sink.cubic_to(x0, cy - oy, cx - ox, y0, cx, y0);
    sink.cubic_to(cx + ox, y0, x1, cy - oy, x1, cy);
    sink.cubic_to(x1, cy + oy, cx + ox, y1, cx, y1);
    sink.cubic_to(cx - ox, y1, x0, cy + oy, x0, cy);
}

/// Trace a rectangle with quarter-circle corners. The corner radius is
/// clamped so it never exceeds half of either side length.
pub fn trace_rounded_rect(
    sink: &mut impl PathSink,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    corner_radius: f64,
) {
    let mut r = corner_radius.max(0.0);
    if width < 2.0 * r {
        r = width / 2.0;
    }
    if height < 2.0 * r {
        r = height / 2.0;
    }
    let k = r * KAPPA;
    let (x1, y1) = (x + width, y + height);

    sink.move_to(x + r, y);
    sink.line_to(x1 - r, y);
    sink.cubic_to(x1 - r + k, y, x1, y + r - k, x1, y + r);
    sink.line_to(x1, y1 - r);
    sink.cubic_to(x1, y1 - r + k, x1 - r + k, y1, x1 - r, y1);
    sink.line_to(x + r, y1);
    sink.cubic_to(x + r - k, y1, x, y1 - r + k, x, y1 - r);
    sink.line_to(x, y + r);
    sink.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    sink.close_path();
}
