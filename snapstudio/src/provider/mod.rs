//! Tile renderer implementations.
//!
//! The pipeline consumes tile rendering through the
//! [`TileRenderer`](crate::snapshot::TileRenderer) trait; this module ships
//! two implementations: a staticmap-backed renderer fetching real imagery,
//! and a flat placeholder for offline and test use.

mod placeholder;
mod staticmap;

pub use placeholder::PlaceholderTileRenderer;
pub use staticmap::{zoom_for_extent, StaticmapTileRenderer};
