//! Text measurement, wrapping, and painting.
//!
//! The [`TextEngine`] trait is the seam to the font system: the compositor
//! and measurement cache talk to it, tests substitute a deterministic
//! implementation, and [`ParleyTextEngine`] provides real shaping and glyph
//! rendering.

mod metrics;
mod parley;
mod wrap;

pub use metrics::{FixedAdvanceEngine, FontSpec, TextEngine, TextSize};
pub use parley::ParleyTextEngine;
pub use wrap::wrap;
