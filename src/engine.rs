use crate::core::{Bitmap, RenderParams};
use crate::dots_cpu;
use crate::error::{BendayError, BendayResult};
use crate::lattice::{LatticeCache, LatticeKey};

/// Owns the current source bitmap and the single-slot lattice cache, and runs
/// one compositor pass per render request.
///
/// Successive renders with unchanged spacing, lattice rotation, and dimensions
/// reuse the cached lattice; every other parameter only affects the dot pass.
/// That asymmetry is the central performance property: lattice generation is
/// O(area / spacing^2) and dominates, while color and intensity changes ride
/// on the cached geometry.
#[derive(Debug, Default)]
pub struct HalftoneEngine {
    source: Option<Bitmap>,
    cache: LatticeCache,
}

impl HalftoneEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the owned source wholesale. Rejects zero-area bitmaps with no
    /// state change. The lattice cache is deliberately left alone: lattice
    /// geometry depends only on spacing, rotation, and dimensions, not on
    /// source content.
    pub fn set_source(&mut self, bitmap: Bitmap) -> BendayResult<()> {
        let expected = (bitmap.width as usize)
            .checked_mul(bitmap.height as usize)
            .and_then(|v| v.checked_mul(4));
        if bitmap.width == 0 || bitmap.height == 0 || expected != Some(bitmap.data.len()) {
            return Err(BendayError::InvalidDimensions {
                width: bitmap.width,
                height: bitmap.height,
            });
        }
        tracing::debug!(width = bitmap.width, height = bitmap.height, "source replaced");
        self.source = Some(bitmap);
        Ok(())
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// Render one halftone frame. Out-of-range parameters are clamped, never
    /// rejected; the returned bitmap is freshly allocated and owned by the
    /// caller.
    #[tracing::instrument(skip(self))]
    pub fn render(&mut self, params: &RenderParams) -> BendayResult<Bitmap> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| BendayError::missing_source("render requires a prior set_source"))?;

        let params = params.clamped();
        let key = LatticeKey {
            spacing: params.dot_spacing,
            rotation_degrees: params.lattice_rotation_degrees,
            width: source.width,
            height: source.height,
        };
        let lattice = self.cache.get_or_generate(key);

        let mut out = Bitmap::new(source.width, source.height)?;
        dots_cpu::composite(lattice, source, &params, &mut out)?;
        Ok(out)
    }

    /// Release the source and cached lattice. The engine stays alive: a later
    /// `set_source` makes it renderable again.
    pub fn dispose(&mut self) {
        self.source = None;
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white(width: u32, height: u32) -> Bitmap {
        Bitmap::from_rgba8(width, height, [255u8; 4].repeat((width * height) as usize)).unwrap()
    }

    #[test]
    fn render_without_source_is_missing_source() {
        let mut engine = HalftoneEngine::new();
        assert!(matches!(
            engine.render(&RenderParams::default()),
            Err(BendayError::MissingSource(_))
        ));
    }

    #[test]
    fn set_source_rejects_zero_area_without_state_change() {
        let mut engine = HalftoneEngine::new();
        let bad = Bitmap {
            width: 0,
            height: 8,
            data: Vec::new(),
        };
        assert!(engine.set_source(bad).is_err());
        assert!(!engine.has_source());
    }

    #[test]
    fn dispose_then_set_source_revives_the_engine() {
        let mut engine = HalftoneEngine::new();
        engine.set_source(white(4, 4)).unwrap();
        engine.render(&RenderParams::default()).unwrap();

        engine.dispose();
        assert!(matches!(
            engine.render(&RenderParams::default()),
            Err(BendayError::MissingSource(_))
        ));

        engine.set_source(white(4, 4)).unwrap();
        assert!(engine.render(&RenderParams::default()).is_ok());
    }

    #[test]
    fn repeated_renders_are_reproducible() {
        let mut engine = HalftoneEngine::new();
        engine.set_source(white(16, 16)).unwrap();
        let params = RenderParams {
            dot_size: 3.0,
            dot_spacing: 4.0,
            lattice_rotation_degrees: 30.0,
            ..RenderParams::default()
        };
        let a = engine.render(&params).unwrap();
        let b = engine.render(&params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn source_swap_keeps_lattice_key_but_changes_output() {
        let mut engine = HalftoneEngine::new();
        engine.set_source(white(8, 8)).unwrap();
        let params = RenderParams::default();
        let bright = engine.render(&params).unwrap();

        engine.set_source(Bitmap::new(8, 8).unwrap()).unwrap();
        let dark = engine.render(&params).unwrap();
        assert!(dark.is_background());
        assert_ne!(bright.data, dark.data);
    }
}
