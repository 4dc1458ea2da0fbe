//! Error types for panel composition

use thiserror::Error;

/// Error when composing or joining panels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ComposeError {
    /// Nothing to draw
    #[error("no panels to compose")]
    NoPanels,
    /// Canvas would exceed the maximum side length
    #[error("canvas {width}x{height} exceeds the {max}px limit")]
    TooLarge { width: u32, height: u32, max: u32 },
}
