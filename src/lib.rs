//! # Texelgrid
//!
//! Pixel-perfect UV layouts for polygon meshes.
//!
//! Texelgrid rewrites the UV coordinates of a polygon mesh so that its
//! axis-aligned edges land exactly on the texel grid of a square texture.
//! It is aimed at low-resolution, pixel-art style texturing of blocky
//! level geometry, where a texel should cover the same world area on every
//! face and neighbouring faces should continue each other's pixels.
//!
//! ## Features
//!
//! - **Polygon meshes**: face-vertex storage with per-corner UVs and seams
//! - **Flexible indexing**: Support for 16-bit, 32-bit, and 64-bit indices
//! - **Plane-aware solving**: lateral, top and down faces unwrap separately
//! - **Stitching**: neighbouring faces share UV edges and vertices
//! - **Packing**: islands are laid out in columns inside the unit square
//! - **OBJ I/O**: per-corner UVs survive a load/save round trip
//!
//! ## Quick Start
//!
//! ```no_run
//! use texelgrid::prelude::*;
//!
//! // Load a mesh
//! let mut mesh: PolyMesh = texelgrid::io::load("level.obj").unwrap();
//!
//! // 10 texels per world unit on a 32x32 texture
//! let options = PixelateOptions::default()
//!     .with_grid_density(10)
//!     .with_texture_size(32);
//! let report = pixelate(&mut mesh, &options).unwrap();
//! println!("{} islands", report.islands);
//!
//! // Save the mesh with its new UVs
//! texelgrid::io::save(&mesh, "level_uv.obj").unwrap();
//! ```
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use texelgrid::prelude::*;
//! use nalgebra::Point3;
//!
//! // A floor tile and the wall standing on its far edge
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(1.0, 1.0, 1.0),
//!     Point3::new(0.0, 1.0, 1.0),
//! ];
//! let faces = vec![
//!     [0, 1, 2, 3], // floor
//!     [3, 2, 4, 5], // wall
//! ];
//!
//! let mesh: PolyMesh = build_from_quads(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_vertices(), 6);
//! assert_eq!(mesh.num_faces(), 2);
//! assert_eq!(mesh.linked_faces(FaceId::new(0)), vec![FaceId::new(1)]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod config;
pub mod error;
pub mod io;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use texelgrid::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::pixelate::{
        pixelate, pixelate_with_progress, PixelateOptions, PixelateReport,
    };
    pub use crate::algo::Progress;
    pub use crate::config::Config;
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        build_from_polygons, build_from_quads, to_face_vertex, Face, FaceId, MeshIndex, PolyMesh,
        Vertex, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use nalgebra::Point3;

    #[test]
    fn test_floor_and_wall() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ];

        let faces = vec![
            [0, 1, 2, 3], // floor
            [3, 2, 4, 5], // wall
        ];

        let mut mesh: PolyMesh = build_from_quads(&vertices, &faces).unwrap();
        assert_eq!(mesh.num_corners(), 8);

        // Floor and wall sit on different planes, so they become two islands
        let report = pixelate(&mut mesh, &PixelateOptions::default()).unwrap();
        assert_eq!(report.top_faces, 1);
        assert_eq!(report.lateral_faces, 1);
        assert_eq!(report.islands, 2);
        assert_eq!(report.misaligned_faces, 0);

        let merged = PixelateOptions::default().with_separate_by_plane(false);
        let report = pixelate(&mut mesh, &merged).unwrap();
        assert_eq!(report.islands, 1);
        assert_eq!(report.edge_stitches, 1);
    }
}
