//! Resource vectors
//!
//! A [`ResourceVector`] holds one non-negative quantity per resource type.
//! Every vector in a ledger has the same length, fixed at initialization.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{AddAssign, Index, SubAssign};

/// Quantity of each resource type, indexed by resource type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceVector(Vec<u32>);

impl ResourceVector {
    /// Create a vector from explicit quantities
    #[must_use]
    pub fn new(units: Vec<u32>) -> Self {
        Self(units)
    }

    /// Vector of `len` zero quantities
    #[must_use]
    pub fn zeros(len: usize) -> Self {
        Self(vec![0; len])
    }

    /// Number of resource types covered
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when every quantity is zero
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&units| units == 0)
    }

    #[must_use]
    pub fn get(&self, resource: usize) -> Option<u32> {
        self.0.get(resource).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    /// Element-wise `self <= other`
    ///
    /// Vectors of different lengths never fit within each other.
    #[must_use]
    pub fn fits_within(&self, other: &Self) -> bool {
        self.len() == other.len() && self.0.iter().zip(&other.0).all(|(a, b)| a <= b)
    }

    /// First resource type where `self` exceeds `limit`, with both quantities
    #[must_use]
    pub fn first_excess(&self, limit: &Self) -> Option<(usize, u32, u32)> {
        self.0
            .iter()
            .zip(&limit.0)
            .enumerate()
            .find(|(_, (units, cap))| units > cap)
            .map(|(resource, (&units, &cap))| (resource, units, cap))
    }

    /// Total units across all resource types
    #[must_use]
    pub fn total_units(&self) -> u64 {
        self.0.iter().map(|&units| u64::from(units)).sum()
    }
}

impl From<Vec<u32>> for ResourceVector {
    fn from(units: Vec<u32>) -> Self {
        Self(units)
    }
}

impl<const N: usize> From<[u32; N]> for ResourceVector {
    fn from(units: [u32; N]) -> Self {
        Self(units.to_vec())
    }
}

impl FromIterator<u32> for ResourceVector {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Index<usize> for ResourceVector {
    type Output = u32;

    fn index(&self, resource: usize) -> &u32 {
        &self.0[resource]
    }
}

// Callers validate bounds before mutating; overflow or underflow here is a
// ledger bug and panics in debug builds.
impl AddAssign<&ResourceVector> for ResourceVector {
    fn add_assign(&mut self, rhs: &ResourceVector) {
        debug_assert_eq!(self.len(), rhs.len());
        for (units, delta) in self.0.iter_mut().zip(&rhs.0) {
            *units += delta;
        }
    }
}

impl SubAssign<&ResourceVector> for ResourceVector {
    fn sub_assign(&mut self, rhs: &ResourceVector) {
        debug_assert_eq!(self.len(), rhs.len());
        for (units, delta) in self.0.iter_mut().zip(&rhs.0) {
            *units -= delta;
        }
    }
}

impl fmt::Display for ResourceVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, units) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{units}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits_within() {
        let small = ResourceVector::from([1, 2, 3]);
        let big = ResourceVector::from([1, 3, 3]);
        assert!(small.fits_within(&big));
        assert!(!big.fits_within(&small));
        assert!(!small.fits_within(&ResourceVector::from([1, 2])));
    }

    #[test]
    fn test_first_excess() {
        let req = ResourceVector::from([0, 4, 9]);
        let cap = ResourceVector::from([1, 3, 2]);
        assert_eq!(req.first_excess(&cap), Some((1, 4, 3)));
        assert_eq!(cap.first_excess(&ResourceVector::from([5, 5, 5])), None);
    }

    #[test]
    fn test_arithmetic() {
        let mut v = ResourceVector::from([5, 5, 2]);
        v -= &ResourceVector::from([2, 0, 1]);
        assert_eq!(v, ResourceVector::from([3, 5, 1]));
        v += &ResourceVector::from([1, 1, 1]);
        assert_eq!(v, ResourceVector::from([4, 6, 2]));
        assert_eq!(v.total_units(), 12);
    }

    #[test]
    fn test_display_and_zero() {
        assert_eq!(ResourceVector::from([10, 5, 7]).to_string(), "[10, 5, 7]");
        assert!(ResourceVector::zeros(3).is_zero());
        assert!(!ResourceVector::from([0, 1]).is_zero());
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let json = serde_json::to_string(&ResourceVector::from([1, 2])).unwrap();
        assert_eq!(json, "[1,2]");
    }
}
