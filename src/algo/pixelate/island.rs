//! UV island bookkeeping.
//!
//! Every placed face belongs to exactly one island. Faces store an
//! [`IslandId`]; joining a face to another island rewrites the ids of every
//! face it brings along, so membership never depends on shared containers.

use crate::error::{MeshError, Result};
use crate::mesh::{FaceId, MeshIndex};

/// Handle of one island, in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IslandId(usize);

impl IslandId {
    /// The raw index.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Face to island mapping for one run.
#[derive(Debug, Clone)]
pub struct IslandMap<I: MeshIndex = u32> {
    face_island: Vec<Option<IslandId>>,
    islands: Vec<Vec<FaceId<I>>>,
}

impl<I: MeshIndex> IslandMap<I> {
    /// Create an empty map for a mesh with `num_faces` faces.
    pub fn new(num_faces: usize) -> Self {
        Self {
            face_island: vec![None; num_faces],
            islands: Vec::new(),
        }
    }

    /// Island of a face, if it has been placed.
    #[inline]
    pub fn island_of(&self, f: FaceId<I>) -> Option<IslandId> {
        self.face_island.get(f.index()).copied().flatten()
    }

    /// Faces of an island, in the order they joined.
    #[inline]
    pub fn faces(&self, id: IslandId) -> &[FaceId<I>] {
        self.islands.get(id.0).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Faces sharing an island with `f` (including `f`); empty if unplaced.
    pub fn faces_with(&self, f: FaceId<I>) -> &[FaceId<I>] {
        match self.island_of(f) {
            Some(id) => self.faces(id),
            None => &[],
        }
    }

    /// Start a new island holding only `f`.
    pub fn seed(&mut self, f: FaceId<I>) -> IslandId {
        self.detach(f);
        let id = IslandId(self.islands.len());
        self.islands.push(vec![f]);
        self.face_island[f.index()] = Some(id);
        id
    }

    /// Put `f` into the island of `neighbor`.
    ///
    /// If `f` already heads an island, that whole island moves with it.
    ///
    /// # Errors
    /// `InvalidState` if `neighbor` has no island.
    pub fn join(&mut self, f: FaceId<I>, neighbor: FaceId<I>) -> Result<IslandId> {
        let target = self.island_of(neighbor).ok_or_else(|| {
            MeshError::InvalidState(format!("face {} is not in any island", neighbor.index()))
        })?;

        match self.island_of(f) {
            Some(source) if source == target => {}
            Some(source) => {
                let moved = std::mem::take(&mut self.islands[source.0]);
                for &g in &moved {
                    self.face_island[g.index()] = Some(target);
                }
                self.islands[target.0].extend(moved);
            }
            None => {
                self.islands[target.0].push(f);
                self.face_island[f.index()] = Some(target);
            }
        }
        Ok(target)
    }

    fn detach(&mut self, f: FaceId<I>) {
        if let Some(id) = self.island_of(f) {
            self.islands[id.0].retain(|&g| g != f);
            self.face_island[f.index()] = None;
        }
    }

    /// Non-empty islands in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (IslandId, &[FaceId<I>])> + '_ {
        self.islands
            .iter()
            .enumerate()
            .filter(|(_, faces)| !faces.is_empty())
            .map(|(i, faces)| (IslandId(i), faces.as_slice()))
    }

    /// Number of non-empty islands.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether no face has been placed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(i: usize) -> FaceId {
        FaceId::new(i)
    }

    #[test]
    fn test_seed_and_join() {
        let mut map = IslandMap::new(4);
        assert!(map.is_empty());

        let a = map.seed(f(0));
        assert_eq!(map.join(f(1), f(0)).unwrap(), a);
        let b = map.seed(f(2));
        assert_ne!(a, b);

        assert_eq!(map.faces(a), &[f(0), f(1)]);
        assert_eq!(map.faces_with(f(1)), &[f(0), f(1)]);
        assert_eq!(map.faces_with(f(3)), &[] as &[FaceId]);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_join_requires_placed_neighbor() {
        let mut map: IslandMap = IslandMap::new(2);
        assert!(matches!(map.join(f(0), f(1)), Err(MeshError::InvalidState(_))));
    }

    #[test]
    fn test_join_moves_whole_island() {
        let mut map = IslandMap::new(4);
        let a = map.seed(f(0));
        let b = map.seed(f(1));
        map.join(f(2), f(1)).unwrap();

        map.join(f(1), f(0)).unwrap();
        assert_eq!(map.island_of(f(2)), Some(a));
        assert_eq!(map.faces(a), &[f(0), f(1), f(2)]);
        assert!(map.faces(b).is_empty());

        let ids: Vec<IslandId> = map.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![a]);
    }

    #[test]
    fn test_reseed_detaches() {
        let mut map = IslandMap::new(2);
        let a = map.seed(f(0));
        map.join(f(1), f(0)).unwrap();
        let b = map.seed(f(1));
        assert_eq!(map.faces(a), &[f(0)]);
        assert_eq!(map.faces(b), &[f(1)]);
    }
}
