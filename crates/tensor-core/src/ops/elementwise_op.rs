// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Element-wise add and ReLU.

use crate::{DType, Tensor, TensorError, TensorView};

/// Computes `output = lhs + rhs`, tiling `rhs` over `lhs` when it is a
/// trailing-dimension suffix (a bias vector onto a batch of rows).
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] if `rhs` does not broadcast onto
/// `lhs` or if `output` does not have `lhs`'s shape.
pub fn add(
    lhs: &TensorView<'_>,
    rhs: &TensorView<'_>,
    output: &mut Tensor,
) -> Result<(), TensorError> {
    if !rhs.shape().broadcasts_onto(lhs.shape()) {
        return Err(TensorError::ShapeMismatch {
            op: "add",
            lhs: lhs.shape().clone(),
            rhs: rhs.shape().clone(),
        });
    }
    if output.shape() != lhs.shape() {
        return Err(TensorError::ShapeMismatch {
            op: "add (output)",
            lhs: lhs.shape().clone(),
            rhs: output.shape().clone(),
        });
    }

    let a = lhs.to_f32_vec()?;
    let b = rhs.to_f32_vec()?;
    if b.is_empty() {
        return output.write_f32(&a);
    }
    let sum: Vec<f32> = a
        .iter()
        .enumerate()
        .map(|(i, &x)| x + b[i % b.len()])
        .collect();
    output.write_f32(&sum)
}

/// Applies `max(x, 0)` element-wise.
pub fn relu(input: &TensorView<'_>, output: &mut Tensor) -> Result<(), TensorError> {
    if input.dtype() != DType::F32 {
        return Err(TensorError::UnsupportedDType {
            op: "relu",
            dtype: input.dtype(),
        });
    }
    if input.shape() != output.shape() {
        return Err(TensorError::ShapeMismatch {
            op: "relu",
            lhs: input.shape().clone(),
            rhs: output.shape().clone(),
        });
    }
    let values: Vec<f32> = input.to_f32_vec()?.into_iter().map(|x| x.max(0.0)).collect();
    output.write_f32(&values)
}
