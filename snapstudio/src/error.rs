//! Request-level error types.

use thiserror::Error;

use crate::compose::ComposeError;
use crate::snapshot::TileError;

/// Errors that abort a render request.
///
/// Only the fast path can fail a request: without a base image there is
/// nothing to show. Address resolution failures are absorbed inside the
/// resolver and never surface here.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The tile-render collaborator produced no image.
    #[error("Base imagery acquisition failed: {0}")]
    Tile(#[from] TileError),

    /// Overlay compositing rejected the base image.
    #[error("Overlay compositing failed: {0}")]
    Compose(#[from] ComposeError),
}
