//! Software dot rasterizer: one scan-converted dot per lattice point per
//! color channel, composited additively into a straight RGBA8 surface.

use kurbo::Point;

use crate::core::{Bitmap, DotShape, RenderParams};
use crate::error::{BendayError, BendayResult};
use crate::lattice::Lattice;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    R,
    G,
    B,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::R, Channel::G, Channel::B];

    fn byte_index(self) -> usize {
        match self {
            Channel::R => 0,
            Channel::G => 1,
            Channel::B => 2,
        }
    }

    /// Red is displaced by `+offset`, blue by `-offset`, green is the
    /// unoffset reference plate.
    fn offset_sign(self) -> f64 {
        match self {
            Channel::R => 1.0,
            Channel::G => 0.0,
            Channel::B => -1.0,
        }
    }
}

/// Draw the full dot pass for `lattice` over `source` into `out`.
///
/// All three channels sample the same unoffset source pixel; only the drawn
/// position moves per channel (misregistration, not parallax). Dots pushed
/// outside the surface by the offset are clipped, never an error.
pub fn composite(
    lattice: &Lattice,
    source: &Bitmap,
    params: &RenderParams,
    out: &mut Bitmap,
) -> BendayResult<()> {
    if out.width != source.width || out.height != source.height {
        return Err(BendayError::InvalidDimensions {
            width: out.width,
            height: out.height,
        });
    }

    let intensity = (params.intensity_percent / 100.0).clamp(0.0, 1.0);
    let dot_rotation = params.dot_rotation_degrees.to_radians();

    for &p in &lattice.points {
        let sx = p.x.floor() as u32;
        let sy = p.y.floor() as u32;
        if sx >= source.width || sy >= source.height {
            continue;
        }
        let px = source.pixel(sx, sy);

        for ch in Channel::ALL {
            let brightness = f64::from(px[ch.byte_index()]) / 255.0;
            let radius = brightness * params.dot_size * intensity / 2.0;
            if radius <= 0.0 {
                continue;
            }
            let center = p + params.channel_offset * ch.offset_sign();
            match params.dot_shape {
                DotShape::Circle => fill_circle(out, center, radius, ch),
                DotShape::Square => fill_square(out, center, radius, dot_rotation, ch),
            }
        }
    }
    Ok(())
}

/// Clip a dot's bounding box to the surface. Returns `None` when the dot lies
/// entirely outside.
fn clipped_bounds(out: &Bitmap, center: Point, extent: f64) -> Option<(i64, i64, i64, i64)> {
    let w = i64::from(out.width);
    let h = i64::from(out.height);
    let x0 = ((center.x - extent).floor() as i64).max(0);
    let x1 = ((center.x + extent).ceil() as i64).min(w - 1);
    let y0 = ((center.y - extent).floor() as i64).max(0);
    let y1 = ((center.y + extent).ceil() as i64).min(h - 1);
    if x0 > x1 || y0 > y1 {
        return None;
    }
    Some((x0, x1, y0, y1))
}

fn fill_circle(out: &mut Bitmap, center: Point, radius: f64, ch: Channel) {
    let Some((x0, x1, y0, y1)) = clipped_bounds(out, center, radius) else {
        return;
    };
    let r2 = radius * radius;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = (x as f64 + 0.5) - center.x;
            let dy = (y as f64 + 0.5) - center.y;
            if dx * dx + dy * dy <= r2 {
                add_channel(out, x as u32, y as u32, ch);
            }
        }
    }
}

fn fill_square(out: &mut Bitmap, center: Point, radius: f64, rotation_rad: f64, ch: Channel) {
    // Bounding box of the square at any rotation.
    let extent = radius * std::f64::consts::SQRT_2;
    let Some((x0, x1, y0, y1)) = clipped_bounds(out, center, extent) else {
        return;
    };
    let (sin, cos) = rotation_rad.sin_cos();
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = (x as f64 + 0.5) - center.x;
            let dy = (y as f64 + 0.5) - center.y;
            // Pixel center in the dot's rotated frame.
            let lx = dx * cos + dy * sin;
            let ly = dy * cos - dx * sin;
            if lx.abs() <= radius && ly.abs() <= radius {
                add_channel(out, x as u32, y as u32, ch);
            }
        }
    }
}

/// Additive blend of a full-intensity channel dot: overlapping same-channel
/// dots saturate rather than average.
fn add_channel(out: &mut Bitmap, x: u32, y: u32, ch: Channel) {
    let idx = (y as usize * out.width as usize + x as usize) * 4 + ch.byte_index();
    out.data[idx] = out.data[idx].saturating_add(u8::MAX);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::LatticeKey;

    fn white(width: u32, height: u32) -> Bitmap {
        Bitmap::from_rgba8(width, height, [255u8; 4].repeat((width * height) as usize)).unwrap()
    }

    fn single_point_lattice(x: f64, y: f64, width: u32, height: u32) -> Lattice {
        Lattice {
            key: LatticeKey {
                spacing: 1.0,
                rotation_degrees: 0.0,
                width,
                height,
            },
            points: vec![Point::new(x, y)],
        }
    }

    fn render_one(params: &RenderParams, source: &Bitmap, lattice: &Lattice) -> Bitmap {
        let mut out = Bitmap::new(source.width, source.height).unwrap();
        composite(lattice, source, params, &mut out).unwrap();
        out
    }

    #[test]
    fn centered_circle_recombines_to_white() {
        let source = white(9, 9);
        let lattice = single_point_lattice(4.0, 4.0, 9, 9);
        let params = RenderParams {
            dot_size: 4.0,
            channel_offset: kurbo::Vec2::ZERO,
            ..RenderParams::default()
        };
        let out = render_one(&params, &source, &lattice);
        // All three plates coincide: the dot interior is pure white.
        assert_eq!(out.pixel(4, 4), [255, 255, 255, 255]);
        // Well outside radius 2: untouched background.
        assert_eq!(out.pixel(0, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn channel_offsets_split_the_plates() {
        let source = white(16, 16);
        let lattice = single_point_lattice(8.0, 8.0, 16, 16);
        let params = RenderParams {
            dot_size: 2.0,
            channel_offset: kurbo::Vec2::new(3.0, 2.0),
            ..RenderParams::default()
        };
        let out = render_one(&params, &source, &lattice);
        assert_eq!(out.pixel(11, 10), [255, 0, 0, 255]); // red at +offset
        assert_eq!(out.pixel(8, 8), [0, 255, 0, 255]); // green centered
        assert_eq!(out.pixel(5, 6), [0, 0, 255, 255]); // blue at -offset
    }

    #[test]
    fn zero_brightness_draws_nothing() {
        let source = Bitmap::new(8, 8).unwrap(); // opaque black
        let lattice = single_point_lattice(4.0, 4.0, 8, 8);
        let out = render_one(&RenderParams::default(), &source, &lattice);
        assert!(out.is_background());
    }

    #[test]
    fn offset_pushing_a_plate_off_surface_is_clipped() {
        let source = white(8, 8);
        let lattice = single_point_lattice(4.0, 4.0, 8, 8);
        let params = RenderParams {
            dot_size: 2.0,
            channel_offset: kurbo::Vec2::new(100.0, 0.0),
            ..RenderParams::default()
        };
        // Red and blue land far outside: only green remains.
        let out = render_one(&params, &source, &lattice);
        assert_eq!(out.pixel(4, 4), [0, 255, 0, 255]);
    }

    #[test]
    fn square_covers_at_least_the_inscribed_circle() {
        let source = white(16, 16);
        let lattice = single_point_lattice(8.0, 8.0, 16, 16);
        let circle = render_one(
            &RenderParams {
                dot_size: 6.0,
                ..RenderParams::default()
            },
            &source,
            &lattice,
        );
        let square = render_one(
            &RenderParams {
                dot_size: 6.0,
                dot_shape: DotShape::Square,
                ..RenderParams::default()
            },
            &source,
            &lattice,
        );
        let lit = |b: &Bitmap| b.data.chunks_exact(4).filter(|px| px[0] == 255).count();
        assert!(lit(&square) >= lit(&circle));
        assert!(lit(&circle) > 0);
    }

    #[test]
    fn square_rotation_wraps_modulo_360() {
        let source = white(16, 16);
        let lattice = single_point_lattice(8.0, 8.0, 16, 16);
        let base = RenderParams {
            dot_size: 4.0,
            dot_shape: DotShape::Square,
            ..RenderParams::default()
        };
        let at_0 = render_one(&base, &source, &lattice);
        let at_360 = render_one(
            &RenderParams {
                dot_rotation_degrees: 360.0,
                ..base
            },
            &source,
            &lattice,
        );
        assert_eq!(at_0.data, at_360.data);
    }

    #[test]
    fn rotated_square_differs_from_axis_aligned() {
        let source = white(32, 32);
        let lattice = single_point_lattice(16.0, 16.0, 32, 32);
        let base = RenderParams {
            dot_size: 10.0,
            dot_shape: DotShape::Square,
            ..RenderParams::default()
        };
        let at_0 = render_one(&base, &source, &lattice);
        let at_45 = render_one(
            &RenderParams {
                dot_rotation_degrees: 45.0,
                ..base
            },
            &source,
            &lattice,
        );
        assert_ne!(at_0.data, at_45.data);
    }

    #[test]
    fn mismatched_output_dimensions_are_rejected() {
        let source = white(8, 8);
        let lattice = single_point_lattice(4.0, 4.0, 8, 8);
        let mut out = Bitmap::new(4, 4).unwrap();
        assert!(composite(&lattice, &source, &RenderParams::default(), &mut out).is_err());
    }
}
