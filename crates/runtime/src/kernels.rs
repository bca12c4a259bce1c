// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Node execution over the interpreter's buffer table.
//!
//! Buffers are indexed by tensor id. `None` marks a tensor with no host
//! memory (held inside a delegate); running a node that touches one is an
//! error unless the delegate has staged it first.

use crate::RuntimeError;
use model_ir::{NodeDef, Op};
use tensor_core::{add, dequantize, matmul, quantize, relu, softmax, Tensor, TensorView};

/// Executes one node, writing its result (and, for stateful ops, the
/// updated state) into `buffers`.
pub(crate) fn run_node(node: &NodeDef, buffers: &mut [Option<Tensor>]) -> Result<(), RuntimeError> {
    let out_id = node.outputs[0];
    let mut out = buffers[out_id]
        .take()
        .ok_or(RuntimeError::NotHostVisible { tensor: out_id })?;
    let result = execute(node, buffers, &mut out);
    buffers[out_id] = Some(out);
    result?;

    if node.op.is_stateful() {
        write_back_state(node, buffers)?;
    }
    Ok(())
}

fn execute(node: &NodeDef, buffers: &[Option<Tensor>], out: &mut Tensor) -> Result<(), RuntimeError> {
    let views = node
        .inputs
        .iter()
        .map(|&id| {
            buffers[id]
                .as_ref()
                .map(Tensor::view)
                .ok_or(RuntimeError::NotHostVisible { tensor: id })
        })
        .collect::<Result<Vec<TensorView<'_>>, _>>()?;
    let failed = |source: tensor_core::TensorError| RuntimeError::Execution {
        node: node.name.clone(),
        source,
    };

    match &node.op {
        Op::FullyConnected => {
            matmul(&views[0], &views[1], out).map_err(failed)?;
            if let Some(bias) = views.get(2) {
                let product = out.clone();
                add(&product.view(), bias, out).map_err(failed)?;
            }
            Ok(())
        }
        Op::Add | Op::Accumulate => add(&views[0], &views[1], out).map_err(failed),
        Op::Relu => relu(&views[0], out).map_err(failed),
        Op::Softmax => softmax(&views[0], out).map_err(failed),
        op @ Op::Quantize { .. } => {
            let params = op.quant_params().ok_or_else(|| missing_params(node))?;
            quantize(&views[0], params, out).map_err(failed)
        }
        op @ Op::Dequantize { .. } => {
            let params = op.quant_params().ok_or_else(|| missing_params(node))?;
            dequantize(&views[0], params, out).map_err(failed)
        }
    }
}

/// Copies an accumulate node's result back into its state operand.
fn write_back_state(node: &NodeDef, buffers: &mut [Option<Tensor>]) -> Result<(), RuntimeError> {
    let (out_id, state_id) = (node.outputs[0], node.inputs[1]);
    let updated = buffers[out_id]
        .as_ref()
        .map(|t| t.as_bytes().to_vec())
        .ok_or(RuntimeError::NotHostVisible { tensor: out_id })?;
    let state = buffers[state_id]
        .as_mut()
        .ok_or(RuntimeError::NotHostVisible { tensor: state_id })?;
    if state.size_bytes() != updated.len() {
        return Err(RuntimeError::Execution {
            node: node.name.clone(),
            source: tensor_core::TensorError::BufferSizeMismatch {
                expected: state.size_bytes(),
                actual: updated.len(),
            },
        });
    }
    state.as_bytes_mut().copy_from_slice(&updated);
    Ok(())
}

fn missing_params(node: &NodeDef) -> RuntimeError {
    RuntimeError::Construction(format!("node '{}' has no quantisation parameters", node.name))
}
