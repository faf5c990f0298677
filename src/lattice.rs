use kurbo::Point;

/// Guard against a zero or negative step before the generation loops run.
/// Engine-level clamping keeps real callers well above this.
const SPACING_EPSILON: f64 = 1e-3;

/// Tolerance absorbing floating-point jitter from repeated identical calls.
const KEY_TOLERANCE: f64 = 1e-4;

/// Cache key for one generated lattice.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LatticeKey {
    pub spacing: f64,
    pub rotation_degrees: f64,
    pub width: u32,
    pub height: u32,
}

impl LatticeKey {
    /// Approximate key equality: exact on dimensions, `1e-4` tolerance on
    /// spacing and rotation.
    pub fn matches(self, other: Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && (self.spacing - other.spacing).abs() <= KEY_TOLERANCE
            && (self.rotation_degrees - other.rotation_degrees).abs() <= KEY_TOLERANCE
    }
}

/// Sample points of a rotated, evenly spaced grid clipped to the key's
/// rectangle. Point order is stable for a given key.
#[derive(Clone, Debug)]
pub struct Lattice {
    pub key: LatticeKey,
    pub points: Vec<Point>,
}

/// Generate the lattice for `key`.
///
/// The grid lives in an unrotated pattern space centered on the rectangle.
/// `half_steps` is sized from the rectangle diagonal so that the rotated grid
/// always covers the whole rectangle; candidates landing outside are simply
/// discarded. Every returned point satisfies `0 <= x < width` and
/// `0 <= y < height`.
pub fn generate(key: LatticeKey) -> Lattice {
    let spacing = key.spacing.max(SPACING_EPSILON);
    let w = f64::from(key.width);
    let h = f64::from(key.height);
    let diagonal = (w * w + h * h).sqrt();
    let half_steps = (diagonal / (2.0 * spacing)).ceil() as i64;
    let (sin, cos) = key.rotation_degrees.to_radians().sin_cos();
    let (cx, cy) = (w / 2.0, h / 2.0);

    let mut points = Vec::new();
    for i in -half_steps..=half_steps {
        for j in -half_steps..=half_steps {
            let px = i as f64 * spacing;
            let py = j as f64 * spacing;
            let x = px * cos - py * sin + cx;
            let y = px * sin + py * cos + cy;
            if x >= 0.0 && x < w && y >= 0.0 && y < h {
                points.push(Point::new(x, y));
            }
        }
    }
    Lattice { key, points }
}

/// Single-slot memo for the most recent lattice. A new key fully replaces the
/// previous entry; only one `(spacing, rotation, dimensions)` tuple is active
/// at a time, so there is no LRU.
#[derive(Debug, Default)]
pub struct LatticeCache {
    slot: Option<Lattice>,
}

impl LatticeCache {
    pub fn get_or_generate(&mut self, key: LatticeKey) -> &Lattice {
        if self.slot.as_ref().is_none_or(|l| !l.key.matches(key)) {
            tracing::debug!(
                spacing = key.spacing,
                rotation_degrees = key.rotation_degrees,
                width = key.width,
                height = key.height,
                "lattice cache miss"
            );
            self.slot = Some(generate(key));
        }
        self.slot.get_or_insert_with(|| generate(key))
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }
}
