//! Structural checks that must hold before any UV is written.

use std::collections::HashMap;

use super::index::MeshIndex;
use super::polymesh::PolyMesh;
use crate::error::{MeshError, Result};

/// Bit pattern of a coordinate with `-0.0` folded into `0.0`.
#[inline]
fn coord_key(v: f64) -> u64 {
    if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}

/// Check that no two distinct vertices share an exact 3D position.
///
/// Adjacency between faces is derived from exact position equality, so
/// coincident vertices would silently break stitching.
///
/// # Errors
/// [`MeshError::DuplicateVertex`] naming the first pair found, in vertex order.
pub fn validate_unique_positions<I: MeshIndex>(mesh: &PolyMesh<I>) -> Result<()> {
    let mut seen: HashMap<[u64; 3], usize> = HashMap::with_capacity(mesh.num_vertices());

    for v in mesh.vertex_ids() {
        let p = mesh.position(v);
        let key = [coord_key(p.x), coord_key(p.y), coord_key(p.z)];
        if let Some(&first) = seen.get(&key) {
            return Err(MeshError::DuplicateVertex {
                first,
                second: v.index(),
                position: [p.x, p.y, p.z],
            });
        }
        seen.insert(key, v.index());
    }

    Ok(())
}
