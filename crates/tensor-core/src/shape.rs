// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor shape descriptors.

use std::fmt;

/// Describes the dimensionality of a [`crate::Tensor`].
///
/// Shapes are plain values: resizing a model input produces a new `Shape`
/// that the interpreter propagates through the graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Creates a new shape from the given dimensions.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Shape;
    /// let s = Shape::new(vec![2, 3, 4]);
    /// assert_eq!(s.rank(), 3);
    /// assert_eq!(s.num_elements(), 24);
    /// ```
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    /// Creates a scalar shape (rank 0).
    pub fn scalar() -> Self {
        Self { dims: vec![] }
    }

    /// Creates a 1-D shape.
    pub fn vector(len: usize) -> Self {
        Self { dims: vec![len] }
    }

    /// Creates a 2-D shape (matrix).
    pub fn matrix(rows: usize, cols: usize) -> Self {
        Self {
            dims: vec![rows, cols],
        }
    }

    /// Returns the number of dimensions (rank).
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Returns the total number of elements.
    ///
    /// For a scalar shape (rank 0), returns 1.
    pub fn num_elements(&self) -> usize {
        if self.dims.is_empty() {
            1
        } else {
            self.dims.iter().product()
        }
    }

    /// Returns the dimensions as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Returns the innermost dimension, or `None` for a scalar.
    pub fn last_dim(&self) -> Option<usize> {
        self.dims.last().copied()
    }

    /// Returns a copy of this shape with the innermost dimension replaced.
    ///
    /// A scalar becomes a vector of length `last`.
    pub fn with_last_dim(&self, last: usize) -> Shape {
        let mut dims = self.dims.clone();
        match dims.last_mut() {
            Some(d) => *d = last,
            None => dims.push(last),
        }
        Shape { dims }
    }

    /// Computes the memory footprint in bytes for a given [`crate::DType`].
    pub fn size_bytes(&self, dtype: super::DType) -> usize {
        self.num_elements() * dtype.size_bytes()
    }

    /// Returns `true` if `self` can be tiled onto `target` by repetition.
    ///
    /// That holds when, after dropping leading 1s, `self` equals the trailing
    /// dimensions of `target` (e.g. a `[N]` bias onto an `[M, N]` activation).
    pub fn broadcasts_onto(&self, target: &Shape) -> bool {
        let trimmed: &[usize] = {
            let lead = self.dims.iter().take_while(|&&d| d == 1).count();
            &self.dims[lead..]
        };
        if trimmed.len() > target.dims.len() {
            return false;
        }
        target.dims[target.dims.len() - trimmed.len()..] == *trimmed
    }

    /// Returns `true` if the shapes are compatible for a matrix multiply:
    /// `self` is `[M, K]` and `other` is `[K, N]`.
    pub fn is_matmul_compatible(&self, other: &Shape) -> bool {
        if self.rank() != 2 || other.rank() != 2 {
            return false;
        }
        self.dims[1] == other.dims[0]
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self::new(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self::new(dims.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DType;

    #[test]
    fn test_scalar_shape() {
        let s = Shape::scalar();
        assert_eq!(s.rank(), 0);
        assert_eq!(s.num_elements(), 1);
        assert_eq!(s.last_dim(), None);
    }

    #[test]
    fn test_matrix_shape() {
        let s = Shape::matrix(3, 4);
        assert_eq!(s.rank(), 2);
        assert_eq!(s.num_elements(), 12);
        assert_eq!(s.size_bytes(DType::F32), 48);
        assert_eq!(s.size_bytes(DType::U8), 12);
    }

    #[test]
    fn test_with_last_dim() {
        assert_eq!(Shape::matrix(2, 3).with_last_dim(7), Shape::matrix(2, 7));
        assert_eq!(Shape::scalar().with_last_dim(4), Shape::vector(4));
    }

    #[test]
    fn test_broadcasts_onto() {
        let target = Shape::matrix(4, 3);
        assert!(Shape::vector(3).broadcasts_onto(&target));
        assert!(Shape::matrix(1, 3).broadcasts_onto(&target));
        assert!(Shape::matrix(4, 3).broadcasts_onto(&target));
        assert!(!Shape::vector(4).broadcasts_onto(&target));
        assert!(!Shape::new(vec![2, 4, 3]).broadcasts_onto(&target));
    }

    #[test]
    fn test_matmul_compatible() {
        let a = Shape::matrix(3, 4);
        assert!(a.is_matmul_compatible(&Shape::matrix(4, 5)));
        assert!(!a.is_matmul_compatible(&Shape::matrix(5, 5)));
        assert!(!a.is_matmul_compatible(&Shape::vector(4)));
    }

    #[test]
    fn test_display() {
        let s = Shape::new(vec![2, 3, 4]);
        assert_eq!(format!("{s}"), "[2, 3, 4]");
    }

    #[test]
    fn test_from_conversions() {
        let s1: Shape = vec![2, 3].into();
        let s2: Shape = (&[2, 3][..]).into();
        assert_eq!(s1, s2);
    }
}
