// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Affine u8 quantisation: `q = clamp(round(x / scale) + zero_point, 0, 255)`.

use crate::{DType, Tensor, TensorError, TensorView};

/// Scale and zero point of an affine u8 encoding.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QuantParams {
    pub scale: f32,
    pub zero_point: u8,
}

impl QuantParams {
    fn check(&self, op: &'static str) -> Result<(), TensorError> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(TensorError::Numeric {
                op,
                detail: format!("scale must be positive and finite, got {}", self.scale),
            });
        }
        Ok(())
    }
}

/// Quantises an `F32` tensor into a `U8` tensor of the same shape.
pub fn quantize(
    input: &TensorView<'_>,
    params: QuantParams,
    output: &mut Tensor,
) -> Result<(), TensorError> {
    params.check("quantize")?;
    if output.dtype() != DType::U8 {
        return Err(TensorError::UnsupportedDType {
            op: "quantize (output)",
            dtype: output.dtype(),
        });
    }
    if input.shape() != output.shape() {
        return Err(TensorError::ShapeMismatch {
            op: "quantize",
            lhs: input.shape().clone(),
            rhs: output.shape().clone(),
        });
    }

    let zp = f32::from(params.zero_point);
    let values = input.to_f32_vec()?;
    for (q, x) in output.as_bytes_mut().iter_mut().zip(values) {
        *q = ((x / params.scale).round() + zp).clamp(0.0, 255.0) as u8;
    }
    Ok(())
}

/// Expands a `U8` tensor back into `F32`: `x = (q - zero_point) * scale`.
pub fn dequantize(
    input: &TensorView<'_>,
    params: QuantParams,
    output: &mut Tensor,
) -> Result<(), TensorError> {
    params.check("dequantize")?;
    if input.dtype() != DType::U8 {
        return Err(TensorError::UnsupportedDType {
            op: "dequantize",
            dtype: input.dtype(),
        });
    }
    if input.shape() != output.shape() {
        return Err(TensorError::ShapeMismatch {
            op: "dequantize",
            lhs: input.shape().clone(),
            rhs: output.shape().clone(),
        });
    }

    let zp = i32::from(params.zero_point);
    let values: Vec<f32> = input
        .as_bytes()
        .iter()
        .map(|&q| (i32::from(q) - zp) as f32 * params.scale)
        .collect();
    output.write_f32(&values)
}
