use kurbo::Vec2;

use crate::error::{BendayError, BendayResult};

/// Lower clamp for dot size. Size 0 degenerates to invisible dots, which is a
/// valid artistic output, so callers are clamped rather than rejected.
pub const MIN_DOT_SIZE: f64 = 1e-3;
pub const MAX_DOT_SIZE: f64 = 1024.0;

/// Lower clamp for lattice spacing. Generation cost is O(area / spacing^2),
/// so the floor keeps a slider resting on zero from exploding the point count.
pub const MIN_DOT_SPACING: f64 = 1.0;
pub const MAX_DOT_SPACING: f64 = 1024.0;

pub const MAX_CHANNEL_OFFSET: f64 = 1024.0;

/// Straight (non-premultiplied) RGBA8 pixel buffer, row-major.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

const BACKGROUND: [u8; 4] = [0, 0, 0, 255];

impl Bitmap {
    /// Allocate a `width x height` surface filled with opaque black.
    pub fn new(width: u32, height: u32) -> BendayResult<Self> {
        let len = byte_len(width, height)?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| BendayError::allocation(format!("surface {width}x{height} rgba8")))?;
        data.resize(len, 0);
        for px in data.chunks_exact_mut(4) {
            px.copy_from_slice(&BACKGROUND);
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Wrap an existing RGBA8 buffer. `data` must be exactly `width * height * 4` bytes.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> BendayResult<Self> {
        let len = byte_len(width, height)?;
        if data.len() != len {
            return Err(BendayError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        debug_assert!(x < self.width && y < self.height);
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    pub fn is_background(&self) -> bool {
        self.data.chunks_exact(4).all(|px| px == BACKGROUND)
    }
}

fn byte_len(width: u32, height: u32) -> BendayResult<usize> {
    if width == 0 || height == 0 {
        return Err(BendayError::InvalidDimensions { width, height });
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| BendayError::allocation("bitmap size overflow"))
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DotShape {
    #[default]
    Circle,
    Square,
}

/// Caller-supplied identifier correlating a render request to its response.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct RequestId(pub u64);

/// Per-render knobs. All fields are presentation parameters: out-of-range
/// values are clamped by [`RenderParams::clamped`], never rejected.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderParams {
    /// Dot diameter in pixels at full brightness and full intensity.
    pub dot_size: f64,
    /// Lattice step in pixels.
    pub dot_spacing: f64,
    /// Red channel is drawn displaced by this vector, blue by its negation,
    /// green stays centered (print misregistration).
    pub channel_offset: Vec2,
    /// Global dot-radius multiplier, 0..=100.
    pub intensity_percent: f64,
    /// Rotation of each square dot about its own center. Unclamped: any real
    /// value is accepted and wraps through the trig functions. Circles ignore it.
    pub dot_rotation_degrees: f64,
    /// Rotation of the whole lattice about the image center. Unclamped.
    pub lattice_rotation_degrees: f64,
    pub dot_shape: DotShape,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            dot_size: 8.0,
            dot_spacing: 8.0,
            channel_offset: Vec2::ZERO,
            intensity_percent: 100.0,
            dot_rotation_degrees: 0.0,
            lattice_rotation_degrees: 0.0,
            dot_shape: DotShape::Circle,
        }
    }
}

impl RenderParams {
    /// Clamp every field into its documented safe range. Non-finite values
    /// fall back to the field default.
    pub fn clamped(self) -> Self {
        let d = Self::default();
        Self {
            dot_size: finite_or(self.dot_size, d.dot_size).clamp(MIN_DOT_SIZE, MAX_DOT_SIZE),
            dot_spacing: finite_or(self.dot_spacing, d.dot_spacing)
                .clamp(MIN_DOT_SPACING, MAX_DOT_SPACING),
            channel_offset: Vec2::new(
                finite_or(self.channel_offset.x, 0.0)
                    .clamp(-MAX_CHANNEL_OFFSET, MAX_CHANNEL_OFFSET),
                finite_or(self.channel_offset.y, 0.0)
                    .clamp(-MAX_CHANNEL_OFFSET, MAX_CHANNEL_OFFSET),
            ),
            intensity_percent: finite_or(self.intensity_percent, d.intensity_percent)
                .clamp(0.0, 100.0),
            dot_rotation_degrees: finite_or(self.dot_rotation_degrees, 0.0),
            lattice_rotation_degrees: finite_or(self.lattice_rotation_degrees, 0.0),
            dot_shape: self.dot_shape,
        }
    }
}

fn finite_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() { v } else { fallback }
}
