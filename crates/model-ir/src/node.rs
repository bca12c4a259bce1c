// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor and node definitions for the model graph.
//!
//! Tensors are addressed by their index in the graph's tensor table. A node
//! names its operands and results by those indices, so the same id is used
//! by the interpreter for buffers and by dumps for file names.

use tensor_core::{DType, QuantParams, Shape};

/// Role a tensor plays in the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensorKind {
    /// Fed by the caller before each invocation.
    Input,
    /// Produced by a node and read back by the caller.
    Output,
    /// Produced and consumed by nodes only.
    Intermediate,
    /// Weight data stored in the model file.
    Constant,
    /// State that persists across invocations until reset to zero.
    Variable,
}

impl TensorKind {
    /// Returns `true` for tensors a node may write.
    pub fn is_produced(self) -> bool {
        matches!(self, Self::Output | Self::Intermediate)
    }
}

/// Metadata for one entry of the tensor table.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TensorDef {
    pub name: String,
    pub dtype: DType,
    pub shape: Shape,
    pub kind: TensorKind,
}

impl TensorDef {
    /// Size of the tensor's buffer at its declared shape.
    pub fn size_bytes(&self) -> usize {
        self.shape.size_bytes(self.dtype)
    }
}

/// The computation a node performs.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Op {
    /// `x @ weights (+ bias)`; inputs `[x, weights]` or `[x, weights, bias]`.
    FullyConnected,
    /// `lhs + rhs` with `rhs` tiled over `lhs`.
    Add,
    Relu,
    /// Softmax over the innermost dimension.
    Softmax,
    /// `f32 -> u8` affine quantisation.
    Quantize { scale: f32, zero_point: u8 },
    /// `u8 -> f32` affine dequantisation.
    Dequantize { scale: f32, zero_point: u8 },
    /// Stateful running sum; inputs `[x, state]`. Updates `state += x` and
    /// writes the new state to the output.
    Accumulate,
}

impl Op {
    /// Returns a human-readable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullyConnected => "fully_connected",
            Self::Add => "add",
            Self::Relu => "relu",
            Self::Softmax => "softmax",
            Self::Quantize { .. } => "quantize",
            Self::Dequantize { .. } => "dequantize",
            Self::Accumulate => "accumulate",
        }
    }

    /// Accepted operand counts as an inclusive range.
    pub fn arity(&self) -> (usize, usize) {
        match self {
            Self::FullyConnected => (2, 3),
            Self::Add | Self::Accumulate => (2, 2),
            _ => (1, 1),
        }
    }

    /// Returns `true` if the op reads or writes a variable tensor.
    pub fn is_stateful(&self) -> bool {
        matches!(self, Self::Accumulate)
    }

    /// Quantisation parameters for the quantize/dequantize ops.
    pub fn quant_params(&self) -> Option<QuantParams> {
        match *self {
            Self::Quantize { scale, zero_point } | Self::Dequantize { scale, zero_point } => {
                Some(QuantParams { scale, zero_point })
            }
            _ => None,
        }
    }

    /// Element type of the operand at `index` this op requires.
    pub fn input_dtype(&self, _index: usize) -> DType {
        match self {
            Self::Dequantize { .. } => DType::U8,
            _ => DType::F32,
        }
    }

    /// Element type of the result.
    pub fn output_dtype(&self) -> DType {
        match self {
            Self::Quantize { .. } => DType::U8,
            _ => DType::F32,
        }
    }

    /// Computes the result shape from operand shapes.
    ///
    /// Operand count must already be within [`Op::arity`]; the error string
    /// describes the offending shapes.
    pub fn output_shape(&self, inputs: &[&Shape]) -> Result<Shape, String> {
        match self {
            Self::FullyConnected => {
                let (x, w) = (inputs[0], inputs[1]);
                if !x.is_matmul_compatible(w) {
                    return Err(format!("input {x} is not compatible with weights {w}"));
                }
                let out = x.with_last_dim(w.dims()[1]);
                if let Some(bias) = inputs.get(2) {
                    if !bias.broadcasts_onto(&out) {
                        return Err(format!("bias {bias} does not broadcast onto {out}"));
                    }
                }
                Ok(out)
            }
            Self::Add => {
                let (lhs, rhs) = (inputs[0], inputs[1]);
                if !rhs.broadcasts_onto(lhs) {
                    return Err(format!("{rhs} does not broadcast onto {lhs}"));
                }
                Ok(lhs.clone())
            }
            Self::Accumulate => {
                let (x, state) = (inputs[0], inputs[1]);
                if x != state {
                    return Err(format!("input {x} does not match state {state}"));
                }
                Ok(state.clone())
            }
            _ => Ok(inputs[0].clone()),
        }
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single computation in the graph.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NodeDef {
    pub name: String,
    pub op: Op,
    /// Operand tensor ids, in the order the op expects them.
    pub inputs: Vec<usize>,
    /// Result tensor ids. Every op currently has exactly one.
    pub outputs: Vec<usize>,
}

impl NodeDef {
    /// One-line description used by `inspect` and logs.
    pub fn summary(&self) -> String {
        format!(
            "{} ({}) {:?} -> {:?}",
            self.name, self.op, self.inputs, self.outputs
        )
    }
}
