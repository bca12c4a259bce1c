// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! A host-backed stand-in for an on-device accelerator.
//!
//! Runs the same kernels as the interpreter but keeps partition-internal
//! tensors in its own scratch memory, enforces a device memory budget at
//! prepare time and, when allowed, rounds f32 results to f16 precision.

use super::{Delegate, DelegateKernel, Partition};
use crate::kernels::run_node;
use crate::RuntimeError;
use model_ir::{graph::Validated, ModelGraph, NodeDef, Op};
use tensor_core::{DType, Shape, Tensor};

/// Simulated accelerator with a fixed memory budget.
#[derive(Debug, Clone)]
pub struct SimulatedAccelerator {
    device_memory_bytes: usize,
}

impl SimulatedAccelerator {
    /// Creates an accelerator that can hold `device_memory_bytes` of
    /// constants and results per partition.
    pub fn new(device_memory_bytes: usize) -> Self {
        Self {
            device_memory_bytes,
        }
    }

    /// Bytes a partition needs on the device: the constants it reads plus
    /// every tensor it produces.
    fn footprint(partition: &Partition, graph: &ModelGraph<Validated>, shapes: &[Shape]) -> usize {
        let constants: usize = partition
            .inputs
            .iter()
            .filter_map(|&id| graph.constant(id))
            .map(<[u8]>::len)
            .sum();
        let produced: usize = partition
            .outputs
            .iter()
            .chain(&partition.internal)
            .filter_map(|&id| graph.tensor(id).map(|t| shapes[id].size_bytes(t.dtype)))
            .sum();
        constants + produced
    }
}

impl Delegate for SimulatedAccelerator {
    fn name(&self) -> &str {
        "simulated-accelerator"
    }

    fn claims(&self, node: &NodeDef, _graph: &ModelGraph<Validated>) -> bool {
        matches!(
            node.op,
            Op::FullyConnected | Op::Add | Op::Relu | Op::Softmax
        )
    }

    fn prepare(
        &self,
        partition: &Partition,
        graph: &ModelGraph<Validated>,
        shapes: &[Shape],
        allow_reduced_precision: bool,
    ) -> Result<Box<dyn DelegateKernel>, RuntimeError> {
        let needed = Self::footprint(partition, graph, shapes);
        if needed > self.device_memory_bytes {
            return Err(RuntimeError::DelegateAttach {
                delegate: self.name().to_string(),
                detail: format!(
                    "partition of {} nodes needs {needed} bytes, device has {}",
                    partition.nodes.len(),
                    self.device_memory_bytes
                ),
            });
        }

        let scratch = partition
            .internal
            .iter()
            .map(|&id| {
                let dtype = graph.tensor(id).map_or(DType::F32, |t| t.dtype);
                (id, Tensor::zeros(shapes[id].clone(), dtype))
            })
            .collect();
        tracing::debug!(
            nodes = partition.nodes.len(),
            internal = partition.internal.len(),
            bytes = needed,
            "prepared simulated partition"
        );
        Ok(Box::new(SimulatedKernel {
            nodes: partition.nodes.clone(),
            scratch,
            reduced_precision: allow_reduced_precision,
        }))
    }
}

#[derive(Debug)]
struct SimulatedKernel {
    nodes: Vec<usize>,
    /// Device-resident tensors, by tensor id.
    scratch: Vec<(usize, Tensor)>,
    reduced_precision: bool,
}

impl SimulatedKernel {
    fn stage_in(&mut self, shapes: &[Shape], buffers: &mut [Option<Tensor>]) {
        for (id, tensor) in self.scratch.iter_mut() {
            if tensor.shape() != &shapes[*id] {
                tensor.reshape_zeroed(shapes[*id].clone());
            }
            let dtype = tensor.dtype();
            buffers[*id] = Some(std::mem::replace(
                tensor,
                Tensor::zeros(Shape::scalar(), dtype),
            ));
        }
    }

    fn stage_out(&mut self, buffers: &mut [Option<Tensor>]) {
        for (id, tensor) in self.scratch.iter_mut() {
            if let Some(t) = buffers[*id].take() {
                *tensor = t;
            }
        }
    }

    fn run(&self, graph: &ModelGraph<Validated>, buffers: &mut [Option<Tensor>]) -> Result<(), RuntimeError> {
        for &n in &self.nodes {
            let node = &graph.nodes()[n];
            run_node(node, buffers)?;
            if self.reduced_precision {
                if let Some(out) = buffers[node.outputs[0]].as_mut() {
                    round_to_half(out);
                }
            }
        }
        Ok(())
    }
}

impl DelegateKernel for SimulatedKernel {
    fn invoke(
        &mut self,
        graph: &ModelGraph<Validated>,
        shapes: &[Shape],
        buffers: &mut [Option<Tensor>],
    ) -> Result<(), RuntimeError> {
        self.stage_in(shapes, buffers);
        let result = self.run(graph, buffers);
        self.stage_out(buffers);
        result
    }
}

/// Rounds every finite f32 element to the nearest f16-representable
/// mantissa (10 bits). Range is not clamped.
fn round_to_half(tensor: &mut Tensor) {
    if tensor.dtype() != DType::F32 {
        return;
    }
    for chunk in tensor.as_bytes_mut().chunks_exact_mut(4) {
        let value = f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        if value.is_finite() {
            let rounded = f32::from_bits((value.to_bits() + 0x1000) & 0xFFFF_E000);
            chunk.copy_from_slice(&rounded.to_ne_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegate::partition_graph;
    use model_ir::ModelBuilder;
    use tensor_core::encode_f32;

    fn relu_chain() -> ModelGraph<Validated> {
        let mut b = ModelBuilder::new("relu-chain");
        let x = b.input("x", DType::F32, Shape::vector(4));
        let a = b.node("a", Op::Relu, &[x]).unwrap();
        let y = b.node("b", Op::Relu, &[a]).unwrap();
        b.output(y);
        b.finish().validate().unwrap()
    }

    fn host_buffers(graph: &ModelGraph<Validated>, partition: &Partition) -> Vec<Option<Tensor>> {
        graph
            .tensors()
            .iter()
            .enumerate()
            .map(|(id, t)| {
                (!partition.internal.contains(&id)).then(|| Tensor::zeros(t.shape.clone(), t.dtype))
            })
            .collect()
    }

    #[test]
    fn test_claims_only_stateless_float_ops() {
        let graph = relu_chain();
        let accel = SimulatedAccelerator::new(1024);
        let node = |op| NodeDef {
            name: "n".into(),
            op,
            inputs: vec![0],
            outputs: vec![1],
        };
        assert!(accel.claims(&node(Op::Relu), &graph));
        assert!(accel.claims(&node(Op::FullyConnected), &graph));
        assert!(!accel.claims(&node(Op::Accumulate), &graph));
        assert!(!accel.claims(
            &node(Op::Quantize {
                scale: 1.0,
                zero_point: 0
            }),
            &graph
        ));
    }

    #[test]
    fn test_prepare_rejects_oversized_partition() {
        let graph = relu_chain();
        let shapes: Vec<Shape> = graph.tensors().iter().map(|t| t.shape.clone()).collect();
        let accel = SimulatedAccelerator::new(16);
        let parts = partition_graph(&graph, &accel, graph.outputs());
        let err = accel.prepare(&parts[0], &graph, &shapes, false).unwrap_err();
        assert!(matches!(err, RuntimeError::DelegateAttach { .. }));
    }

    #[test]
    fn test_kernel_keeps_internal_tensors_off_host() {
        let graph = relu_chain();
        let shapes: Vec<Shape> = graph.tensors().iter().map(|t| t.shape.clone()).collect();
        let accel = SimulatedAccelerator::new(1024);
        let parts = partition_graph(&graph, &accel, graph.outputs());
        assert_eq!(parts[0].internal, vec![1]);

        let mut kernel = accel.prepare(&parts[0], &graph, &shapes, false).unwrap();
        let mut buffers = host_buffers(&graph, &parts[0]);
        buffers[0]
            .as_mut()
            .unwrap()
            .as_bytes_mut()
            .copy_from_slice(&encode_f32(&[-1.0, 0.5, 2.0, -3.0]));

        kernel.invoke(&graph, &shapes, &mut buffers).unwrap();
        assert!(buffers[1].is_none());
        let out = buffers[2].as_ref().unwrap().to_f32_vec().unwrap();
        assert_eq!(out, vec![0.0, 0.5, 2.0, 0.0]);
    }

    #[test]
    fn test_round_to_half() {
        let mut t = Tensor::from_f32(Shape::vector(3), &[1.0, 1.0 + 1e-6, f32::NAN]).unwrap();
        round_to_half(&mut t);
        let v = t.to_f32_vec().unwrap();
        assert_eq!(v[0], 1.0);
        assert_eq!(v[1], 1.0);
        assert!(v[2].is_nan());
    }
}
