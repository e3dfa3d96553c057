//! Mesh processing algorithms.
//!
//! - **Pixelate**: pixel-perfect UV solving on a fixed texel grid, with
//!   face-to-face stitching and island packing
//! - **Progress**: callback type shared by the long-running algorithms

pub mod pixelate;
pub mod progress;

pub use progress::Progress;
