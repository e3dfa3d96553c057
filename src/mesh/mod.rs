//! Core mesh data structures.
//!
//! This module provides the polygon mesh representation the UV solver runs
//! against.
//!
//! # Overview
//!
//! The primary type is [`PolyMesh`], a face-vertex mesh whose faces are ordered
//! cyclic lists of corners. Every corner references a shared vertex and owns
//! its own UV coordinate, so UV seams are represented without splitting
//! vertices.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`FaceId`] - Identifies a face
//!
//! These indices are generic over the underlying integer type ([`MeshIndex`] trait),
//! allowing you to choose `u16`, `u32`, or `u64` based on mesh size.
//!
//! # Construction
//!
//! ```
//! use texelgrid::mesh::{build_from_quads, PolyMesh};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 1.0),
//!     Point3::new(0.0, 0.0, 1.0),
//! ];
//! let faces = vec![[0, 1, 2, 3]];
//!
//! let mesh: PolyMesh = build_from_quads(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_faces(), 1);
//! ```

mod builder;
mod index;
mod polymesh;
mod validate;

pub use builder::{build_from_polygons, build_from_quads, to_face_vertex};
pub use index::{FaceId, MeshIndex, VertexId};
pub use polymesh::{Corner, Face, PolyMesh, Vertex};
pub use validate::validate_unique_positions;
