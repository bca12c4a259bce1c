// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Matrix multiplication operation.

use crate::{DType, Shape, Tensor, TensorError, TensorView};

/// Performs matrix multiplication: `output = lhs @ rhs`.
///
/// Both inputs must be 2-D tensors with compatible inner dimensions:
/// `lhs` is `[M, K]`, `rhs` is `[K, N]`, and `output` must be `[M, N]`.
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] if dimensions are incompatible.
/// Returns [`TensorError::UnsupportedDType`] if the dtype is not `F32`.
pub fn matmul(
    lhs: &TensorView<'_>,
    rhs: &TensorView<'_>,
    output: &mut Tensor,
) -> Result<(), TensorError> {
    for dtype in [lhs.dtype(), rhs.dtype(), output.dtype()] {
        if dtype != DType::F32 {
            return Err(TensorError::UnsupportedDType { op: "matmul", dtype });
        }
    }

    if !lhs.shape().is_matmul_compatible(rhs.shape()) {
        return Err(TensorError::ShapeMismatch {
            op: "matmul",
            lhs: lhs.shape().clone(),
            rhs: rhs.shape().clone(),
        });
    }

    let m = lhs.shape().dims()[0];
    let k = lhs.shape().dims()[1];
    let n = rhs.shape().dims()[1];

    let expected_shape = Shape::matrix(m, n);
    if output.shape() != &expected_shape {
        return Err(TensorError::ShapeMismatch {
            op: "matmul (output)",
            lhs: expected_shape,
            rhs: output.shape().clone(),
        });
    }

    let a = lhs.to_f32_vec()?;
    let b = rhs.to_f32_vec()?;
    let mut c = vec![0.0f32; m * n];
    matmul_f32_generic(&a, &b, &mut c, m, k, n);
    output.write_f32(&c)
}

/// Portable f32 matrix multiplication in ikj order, so the inner loop walks
/// a row of `b` and a row of `c` sequentially.
fn matmul_f32_generic(a: &[f32], b: &[f32], c: &mut [f32], m: usize, k: usize, n: usize) {
    for i in 0..m {
        let c_row = &mut c[i * n..(i + 1) * n];
        for p in 0..k {
            let a_ip = a[i * k + p];
            let b_row = &b[p * n..(p + 1) * n];
            for (c_ij, &b_pj) in c_row.iter_mut().zip(b_row) {
                *c_ij += a_ip * b_pj;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matmul_2x3_times_3x2() {
        // [[1, 2, 3], [4, 5, 6]] @ [[7, 8], [9, 10], [11, 12]] = [[58, 64], [139, 154]]
        let a = Tensor::from_f32(Shape::matrix(2, 3), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let b =
            Tensor::from_f32(Shape::matrix(3, 2), &[7.0, 8.0, 9.0, 10.0, 11.0, 12.0]).unwrap();
        let mut c = Tensor::zeros(Shape::matrix(2, 2), DType::F32);

        matmul(&a.view(), &b.view(), &mut c).unwrap();

        assert_eq!(c.to_f32_vec().unwrap(), vec![58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn test_matmul_overwrites_previous_output() {
        let a = Tensor::from_f32(Shape::matrix(1, 2), &[1.0, 1.0]).unwrap();
        let b = Tensor::from_f32(Shape::matrix(2, 1), &[2.0, 3.0]).unwrap();
        let mut c = Tensor::from_f32(Shape::matrix(1, 1), &[100.0]).unwrap();

        matmul(&a.view(), &b.view(), &mut c).unwrap();
        assert_eq!(c.to_f32_vec().unwrap(), vec![5.0]);
    }

    #[test]
    fn test_matmul_shape_mismatch() {
        let a = Tensor::zeros(Shape::matrix(2, 3), DType::F32);
        let b = Tensor::zeros(Shape::matrix(4, 2), DType::F32);
        let mut c = Tensor::zeros(Shape::matrix(2, 2), DType::F32);

        let result = matmul(&a.view(), &b.view(), &mut c);
        assert!(matches!(result, Err(TensorError::ShapeMismatch { op: "matmul", .. })));
    }

    #[test]
    fn test_matmul_rejects_u8() {
        let a = Tensor::zeros(Shape::matrix(1, 1), DType::U8);
        let b = Tensor::zeros(Shape::matrix(1, 1), DType::F32);
        let mut c = Tensor::zeros(Shape::matrix(1, 1), DType::F32);
        assert!(matches!(
            matmul(&a.view(), &b.view(), &mut c),
            Err(TensorError::UnsupportedDType { dtype: DType::U8, .. })
        ));
    }
}
