//! SnapStudio - annotated map snapshot composition
//!
//! This library composes an annotated raster "map snapshot" from a base
//! tile image, geometric overlays, and a reverse-geocoded address label,
//! while avoiding redundant recomputation of the three expensive steps:
//! tile rendering, rotation, and address resolution.
//!
//! # Architecture
//!
//! ```text
//! RenderPipeline ──► SnapshotService ──► TileRenderer (collaborator)
//!       │                  │
//!       │                  └─► rotation slot
//!       ├──► OverlayCompositor ──► TextEngine (collaborator)
//!       │            │
//!       │            └─► MeasurementCache
//!       └──► AddressResolver ──► Primary/Fallback geocoders (collaborators)
//! ```
//!
//! A render request runs a synchronous fast path (snapshot, rotate,
//! composite without address) and returns a [`pipeline::Preview`]
//! immediately; one background worker then resolves the address and, if it
//! still belongs to the current request, delivers an upgraded image as a
//! [`pipeline::UpgradeEvent`] on the channel returned at construction.

pub mod cache;
pub mod compose;
pub mod coord;
pub mod error;
pub mod geocode;
pub mod logging;
pub mod params;
pub mod pipeline;
pub mod provider;
pub mod snapshot;
pub mod telemetry;
pub mod text;

pub use error::RenderError;
pub use params::{MapStyle, OverlayFlags, RenderParams};
pub use pipeline::{Preview, RenderPipeline, RequestId, UpgradeEvent};

// The pixel type used throughout the pipeline.
pub use tiny_skia::Pixmap;
