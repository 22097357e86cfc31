//! Join-semilattice merge of partial knowledge about one node.
//!
//! `None` is bottom and merges with anything. Leaves merge only with an equal
//! leaf. Containers of the same shape merge element by element. Everything
//! else is a [`Conflict`].

use std::fmt;
use std::sync::Arc;

use ordered_float::OrderedFloat;
use smallvec::{Array, SmallVec};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Conflict {
    /// Two different constructors for the same position.
    Variant {
        left: &'static str,
        right: &'static str,
    },
    /// Two unequal leaves.
    Leaf { left: String, right: String },
    /// Two sequences of different lengths.
    Length { left: usize, right: usize },
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conflict::Variant { left, right } => write!(f, "`{left}` cannot merge with `{right}`"),
            Conflict::Leaf { left, right } => write!(f, "{left} != {right}"),
            Conflict::Length { left, right } => {
                write!(f, "{left} element(s) cannot merge with {right}")
            }
        }
    }
}

pub trait Merge: Sized {
    /// Least upper bound of `self` and `other`, if it exists.
    fn merge(&self, other: &Self) -> Result<Self, Conflict>;
}

impl<T: Merge + Clone> Merge for Option<T> {
    fn merge(&self, other: &Self) -> Result<Self, Conflict> {
        match (self, other) {
            (None, known) | (known, None) => Ok(known.clone()),
            (Some(left), Some(right)) => left.merge(right).map(Some),
        }
    }
}

impl<A: Array> Merge for SmallVec<A>
where
    A::Item: Merge,
{
    fn merge(&self, other: &Self) -> Result<Self, Conflict> {
        if self.len() != other.len() {
            return Err(Conflict::Length {
                left: self.len(),
                right: other.len(),
            });
        }
        self.iter().zip(other).map(|(left, right)| left.merge(right)).collect()
    }
}

impl<T: Merge> Merge for Vec<T> {
    fn merge(&self, other: &Self) -> Result<Self, Conflict> {
        if self.len() != other.len() {
            return Err(Conflict::Length {
                left: self.len(),
                right: other.len(),
            });
        }
        self.iter().zip(other).map(|(left, right)| left.merge(right)).collect()
    }
}

/// Implements [`Merge`] for leaf types that only join with themselves.
macro_rules! merge_by_equality {
    ($($ty:ty),* $(,)?) => {$(
        impl $crate::store::lattice::Merge for $ty {
            fn merge(&self, other: &Self) -> Result<Self, $crate::store::lattice::Conflict> {
                if self == other {
                    Ok(self.clone())
                } else {
                    Err($crate::store::lattice::Conflict::Leaf {
                        left: format!("{self:?}"),
                        right: format!("{other:?}"),
                    })
                }
            }
        }
    )*};
}
pub(crate) use merge_by_equality;

merge_by_equality!(u32, bool, Arc<str>, OrderedFloat<f64>);

pub(crate) fn variant_conflict(left: &'static str, right: &'static str) -> Conflict {
    Conflict::Variant { left, right }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use smallvec::smallvec;

    #[test]
    fn bottom_is_identity() {
        assert_eq!(None.merge(&Some(3u32)), Ok(Some(3)));
        assert_eq!(Some(3u32).merge(&None), Ok(Some(3)));
        assert_eq!(None::<u32>.merge(&None), Ok(None));
    }

    #[test]
    fn unequal_leaves_conflict() {
        let err = Some(3u32).merge(&Some(4)).unwrap_err();
        assert_eq!(
            err,
            Conflict::Leaf {
                left: "3".into(),
                right: "4".into()
            }
        );
    }

    #[test]
    fn sequences_merge_elementwise() {
        let left: SmallVec<[Option<u32>; 2]> = smallvec![Some(1), None];
        let right: SmallVec<[Option<u32>; 2]> = smallvec![None, Some(2)];
        let merged = left.merge(&right).unwrap();
        assert_eq!(merged.as_slice(), &[Some(1), Some(2)]);

        let short: SmallVec<[Option<u32>; 2]> = smallvec![Some(1)];
        assert!(matches!(left.merge(&short), Err(Conflict::Length { left: 2, right: 1 })));
    }

    proptest! {
        #[test]
        fn merge_is_idempotent(value in proptest::option::of(any::<u32>())) {
            prop_assert_eq!(value.merge(&value), Ok(value));
        }

        #[test]
        fn merge_is_commutative(
            left in proptest::option::of(0u32..4),
            right in proptest::option::of(0u32..4),
        ) {
            prop_assert_eq!(left.merge(&right).ok(), right.merge(&left).ok());
        }

        #[test]
        fn merge_is_an_upper_bound(
            left in proptest::option::of(0u32..4),
            right in proptest::option::of(0u32..4),
        ) {
            if let Ok(joined) = left.merge(&right) {
                prop_assert_eq!(joined.merge(&left), Ok(joined));
                prop_assert_eq!(joined.merge(&right), Ok(joined));
            }
        }
    }
}
