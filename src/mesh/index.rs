//! Index types for mesh elements.
//!
//! Vertices and faces are addressed by small `Copy` handles instead of
//! references, so solver state can live in side tables keyed by face. The
//! handles are generic over the underlying integer type; `u32` is the default.

use std::fmt::{self, Debug};
use std::hash::Hash;

/// Trait for integer types that can back a mesh handle.
pub trait MeshIndex:
    Copy + Clone + Eq + PartialEq + Ord + PartialOrd + Hash + Debug + Send + Sync + 'static
{
    /// Sentinel value marking an unset handle.
    const INVALID: Self;

    /// Convert from usize to this index type.
    ///
    /// # Panics
    /// Debug builds panic if the value does not fit.
    fn from_usize(v: usize) -> Self;

    /// Convert to usize.
    fn to_usize(self) -> usize;
}

macro_rules! impl_mesh_index {
    ($($ty:ty),*) => {
        $(
            impl MeshIndex for $ty {
                const INVALID: Self = <$ty>::MAX;

                #[inline]
                fn from_usize(v: usize) -> Self {
                    debug_assert!(
                        (v as u128) < <$ty>::MAX as u128,
                        "index {} too large for {}",
                        v,
                        stringify!($ty)
                    );
                    v as $ty
                }

                #[inline]
                fn to_usize(self) -> usize {
                    self as usize
                }
            }
        )*
    };
}

impl_mesh_index!(u16, u32, u64);

/// A type-safe vertex handle.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertexId<I: MeshIndex = u32>(I);

/// A type-safe face handle.
///
/// Face handles are stable for the lifetime of a mesh and are the keys of the
/// per-run face registry and of the island map.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct FaceId<I: MeshIndex = u32>(I);

macro_rules! impl_handle {
    ($name:ident, $tag:literal) => {
        impl<I: MeshIndex> $name<I> {
            /// Create a handle from a raw index.
            #[inline]
            pub fn new(index: usize) -> Self {
                Self(I::from_usize(index))
            }

            /// Create an unset handle.
            #[inline]
            pub fn invalid() -> Self {
                Self(I::INVALID)
            }

            /// The raw index.
            #[inline]
            pub fn index(self) -> usize {
                self.0.to_usize()
            }

            /// Whether this handle is set.
            #[inline]
            pub fn is_valid(self) -> bool {
                self.0 != I::INVALID
            }
        }

        impl<I: MeshIndex> Debug for $name<I> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}{}", $tag, self.index())
                } else {
                    write!(f, "{}?", $tag)
                }
            }
        }

        impl<I: MeshIndex> fmt::Display for $name<I> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                Debug::fmt(self, f)
            }
        }

        impl<I: MeshIndex> From<usize> for $name<I> {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }
    };
}

impl_handle!(VertexId, "v");
impl_handle!(FaceId, "f");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_id() {
        let f: FaceId = FaceId::new(7);
        assert_eq!(f.index(), 7);
        assert!(f.is_valid());
        assert!(!FaceId::<u32>::invalid().is_valid());
    }

    #[test]
    fn test_handles_order_by_index() {
        let mut faces: Vec<FaceId<u16>> = vec![FaceId::new(3), FaceId::new(1), FaceId::new(2)];
        faces.sort();
        let raw: Vec<usize> = faces.iter().map(|f| f.index()).collect();
        assert_eq!(raw, vec![1, 2, 3]);
    }

    #[test]
    fn test_debug_format() {
        let v: VertexId = VertexId::new(42);
        assert_eq!(format!("{:?}", v), "v42");
        assert_eq!(format!("{}", FaceId::<u64>::new(3)), "f3");
        assert_eq!(format!("{:?}", FaceId::<u32>::invalid()), "f?");
    }
}
