//! Benday is a real-time halftone image-effect engine.
//!
//! A source bitmap is re-rendered as a lattice of colored dots whose size
//! follows per-channel brightness, with independently offset red/green/blue
//! plates (print misregistration), configurable dot shape and rotation,
//! lattice rotation, spacing, and a global intensity multiplier.
//!
//! Two ways in:
//!
//! - [`HalftoneEngine`] — synchronous, owned engine: `set_source`, then
//!   `render(&params)` as often as parameters change. Lattice geometry is
//!   cached across renders; color and intensity changes never pay for
//!   regeneration.
//! - [`EngineHandle`] — the same engine on a dedicated worker thread behind an
//!   asynchronous request/response channel, keeping per-frame recomputation
//!   off the caller's thread. Responses correlate by [`RequestId`].
//!
//! The engine consumes and returns raw RGBA8 buffers; decoding, encoding, and
//! display are the caller's concern.
#![forbid(unsafe_code)]

pub mod core;
pub mod dots_cpu;
pub mod engine;
pub mod error;
pub mod lattice;
pub mod worker;

pub use crate::core::{Bitmap, DotShape, RenderParams, RequestId};
pub use crate::engine::HalftoneEngine;
pub use crate::error::{BendayError, BendayResult};
pub use crate::lattice::{Lattice, LatticeCache, LatticeKey};
pub use crate::worker::{EngineHandle, EngineRequest, EngineResponse, RenderErrorKind};
