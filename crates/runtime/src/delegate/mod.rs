// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Acceleration backends ("delegates") and graph partitioning.
//!
//! A [`Delegate`] claims nodes it can execute. Consecutive claimed nodes are
//! grouped into a [`Partition`], and each partition is compiled into a
//! [`DelegateKernel`] that the interpreter calls in place of those nodes.
//!
//! Tensors produced and consumed entirely inside one partition, and not
//! registered as model outputs, become delegate-internal: they have no host
//! buffer, so they can be neither read nor dumped.

mod simulated;

pub use simulated::SimulatedAccelerator;

use crate::RuntimeError;
use model_ir::{graph::Validated, ModelGraph, NodeDef};
use std::collections::HashSet;
use tensor_core::{Shape, Tensor};

/// An alternate execution path a loaded model can be bound to.
pub trait Delegate: Send + std::fmt::Debug {
    /// Human-readable name of this delegate.
    fn name(&self) -> &str;

    /// Returns `true` if the delegate can execute `node`.
    fn claims(&self, node: &NodeDef, graph: &ModelGraph<Validated>) -> bool;

    /// Compiles one partition for the given tensor shapes.
    ///
    /// Failing here fails the whole attach; the interpreter does not fall
    /// back to host execution.
    fn prepare(
        &self,
        partition: &Partition,
        graph: &ModelGraph<Validated>,
        shapes: &[Shape],
        allow_reduced_precision: bool,
    ) -> Result<Box<dyn DelegateKernel>, RuntimeError>;
}

/// A compiled partition.
pub trait DelegateKernel: Send + std::fmt::Debug {
    /// Executes the partition. Reads `partition.inputs` from `buffers` and
    /// writes `partition.outputs` back; entries for internal tensors are
    /// `None` on entry and must be `None` again on return.
    fn invoke(
        &mut self,
        graph: &ModelGraph<Validated>,
        shapes: &[Shape],
        buffers: &mut [Option<Tensor>],
    ) -> Result<(), RuntimeError>;
}

/// A run of consecutive nodes handed to one delegate kernel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    /// Node indices in execution order.
    pub nodes: Vec<usize>,
    /// Tensors read by the partition but produced outside it.
    pub inputs: Vec<usize>,
    /// Tensors produced inside and needed outside (or model outputs).
    pub outputs: Vec<usize>,
    /// Tensors produced and consumed only inside.
    pub internal: Vec<usize>,
}

/// Groups consecutive claimed nodes into partitions.
///
/// `model_outputs` is the interpreter's current output list, so exposing all
/// layers before partitioning leaves nothing internal.
pub fn partition_graph(
    graph: &ModelGraph<Validated>,
    delegate: &dyn Delegate,
    model_outputs: &[usize],
) -> Vec<Partition> {
    let nodes = graph.nodes();
    let mut runs: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        if delegate.claims(node, graph) {
            current.push(i);
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }

    runs.into_iter()
        .map(|run| {
            let members: HashSet<usize> = run.iter().copied().collect();
            let produced: Vec<usize> = run.iter().flat_map(|&n| nodes[n].outputs.clone()).collect();
            let produced_set: HashSet<usize> = produced.iter().copied().collect();

            let mut needed_outside: HashSet<usize> = model_outputs.iter().copied().collect();
            for (i, node) in nodes.iter().enumerate() {
                if !members.contains(&i) {
                    needed_outside.extend(node.inputs.iter().copied());
                }
            }

            let mut inputs = Vec::new();
            for &n in &run {
                for &id in &nodes[n].inputs {
                    if !produced_set.contains(&id) && !inputs.contains(&id) {
                        inputs.push(id);
                    }
                }
            }
            let (outputs, internal) = produced
                .into_iter()
                .partition(|id| needed_outside.contains(id));

            Partition {
                nodes: run,
                inputs,
                outputs,
                internal,
            }
        })
        .collect()
}
