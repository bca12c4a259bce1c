// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Softmax activation operation.

use crate::{DType, Tensor, TensorError, TensorView};

/// Computes softmax along the last dimension: `output[i] = exp(x[i] - max) / sum(exp(x - max))`.
///
/// Uses the numerically stable variant that subtracts the maximum value
/// before exponentiation to prevent overflow.
///
/// Both `input` and `output` must have the same shape and be `F32`.
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] if input and output shapes differ.
/// Returns [`TensorError::UnsupportedDType`] if the dtype is not `F32`.
pub fn softmax(input: &TensorView<'_>, output: &mut Tensor) -> Result<(), TensorError> {
    if input.dtype() != DType::F32 {
        return Err(TensorError::UnsupportedDType {
            op: "softmax",
            dtype: input.dtype(),
        });
    }

    if input.shape() != output.shape() {
        return Err(TensorError::ShapeMismatch {
            op: "softmax",
            lhs: input.shape().clone(),
            rhs: output.shape().clone(),
        });
    }

    let Some(last_dim) = input.shape().last_dim() else {
        // Scalar: softmax of a single value is 1.0.
        return output.write_f32(&[1.0]);
    };
    if last_dim == 0 {
        return Ok(());
    }

    let mut values = input.to_f32_vec()?;
    for row in values.chunks_mut(last_dim) {
        let max_val = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        let mut sum = 0.0f32;
        for v in row.iter_mut() {
            *v = (*v - max_val).exp();
            sum += *v;
        }

        if sum > 0.0 {
            let inv_sum = 1.0 / sum;
            row.iter_mut().for_each(|v| *v *= inv_sum);
        }
    }

    output.write_f32(&values)
}
