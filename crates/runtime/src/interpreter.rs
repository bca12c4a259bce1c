// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The reference interpreter, with a type-state construction pipeline.
//!
//! ```text
//! Interpreter<Building>
//!     │  .expose_all_layers()          (optional, must precede delegation)
//!     │  .allow_reduced_precision(..)  (optional)
//!     │  .attach_delegate(..) / .into_ready()
//!     ▼
//! Interpreter<Ready>   implements ModelRuntime
//! ```
//!
//! Exposing all layers after a delegate has claimed its partitions would
//! leave delegate-internal tensors without host memory, so the type-state
//! only offers it while building.

use crate::delegate::{partition_graph, Partition};
use crate::{Delegate, DelegateKernel, LoadOptions, ModelRuntime, RuntimeError, TensorInfo};
use model_ir::{graph::Validated, MappedModel, ModelGraph, ModelLoader, TensorKind};
use std::path::Path;
use tensor_core::{DType, Shape, Tensor};

// ── Type-state markers ─────────────────────────────────────────

/// Buffers are allocated; outputs and backend may still change.
#[derive(Debug)]
pub struct Building;

/// Backend is bound; the interpreter can run.
#[derive(Debug)]
pub struct Ready;

/// Sealed trait for interpreter states.
pub trait InterpreterState: std::fmt::Debug {}
impl InterpreterState for Building {}
impl InterpreterState for Ready {}

#[derive(Debug, Clone, Copy)]
enum Step {
    /// Run node `n` on the host.
    Host(usize),
    /// Run delegate kernel `k`.
    Delegated(usize),
}

/// A loaded model with one host buffer per tensor.
///
/// # Example
/// ```no_run
/// use runtime::{Interpreter, LoadOptions, ModelRuntime};
/// use std::path::Path;
///
/// let mut interp = Interpreter::load_file(Path::new("model.nnb"), &LoadOptions::host()).unwrap();
/// let input = vec![0u8; interp.input_info().size_bytes()];
/// interp.set_input(&input).unwrap();
/// interp.invoke().unwrap();
/// println!("{} output bytes", interp.output_bytes().unwrap().len());
/// ```
pub struct Interpreter<S: InterpreterState = Ready> {
    graph: ModelGraph<Validated>,
    shapes: Vec<Shape>,
    /// Indexed by tensor id; `None` for delegate-internal tensors.
    buffers: Vec<Option<Tensor>>,
    /// Registered outputs; the first is the primary output.
    outputs: Vec<usize>,
    steps: Vec<Step>,
    /// The bound delegate and its partitions, kept so kernels can be
    /// re-prepared when shapes change.
    delegate: Option<Box<dyn Delegate>>,
    partitions: Vec<Partition>,
    kernels: Vec<Box<dyn DelegateKernel>>,
    label: String,
    expose_all: bool,
    reduced_precision: bool,
    _state: std::marker::PhantomData<S>,
}

// ── Building ───────────────────────────────────────────────────

impl Interpreter<Building> {
    /// Allocates host buffers for every tensor of `graph`.
    ///
    /// Constants are copied in; everything else starts zeroed.
    pub fn new(graph: ModelGraph<Validated>) -> Result<Self, RuntimeError> {
        let buffers = graph
            .tensors()
            .iter()
            .enumerate()
            .map(|(id, def)| match graph.constant(id) {
                Some(data) => Tensor::from_bytes(def.shape.clone(), def.dtype, data.to_vec())
                    .map(Some)
                    .map_err(|e| RuntimeError::Construction(format!("constant '{}': {e}", def.name))),
                None => Ok(Some(Tensor::zeros(def.shape.clone(), def.dtype))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let shapes = graph.tensors().iter().map(|t| t.shape.clone()).collect();
        let outputs = graph.outputs().to_vec();

        Ok(Self {
            graph,
            shapes,
            buffers,
            outputs,
            steps: Vec::new(),
            delegate: None,
            partitions: Vec::new(),
            kernels: Vec::new(),
            label: "host".to_string(),
            expose_all: false,
            reduced_precision: true,
            _state: std::marker::PhantomData,
        })
    }

    /// Registers every node result as an output, after the model's own
    /// outputs. The primary output is unchanged.
    pub fn expose_all_layers(mut self) -> Self {
        for node in self.graph.nodes() {
            for &id in &node.outputs {
                if !self.outputs.contains(&id) {
                    self.outputs.push(id);
                }
            }
        }
        self.expose_all = true;
        self
    }

    /// Whether delegates may compute at reduced (f16) precision.
    pub fn allow_reduced_precision(mut self, allow: bool) -> Self {
        self.reduced_precision = allow;
        self
    }

    /// Runs every node on the host.
    pub fn into_ready(self) -> Interpreter<Ready> {
        let steps = (0..self.graph.nodes().len()).map(Step::Host).collect();
        self.finish(steps, None, Vec::new(), Vec::new())
    }

    /// Binds the model to `delegate`.
    ///
    /// Consecutive nodes the delegate claims become one partition each.
    /// Tensors internal to a partition lose their host buffer.
    ///
    /// # Errors
    /// [`RuntimeError::DelegateAttach`] (or whatever the delegate reports)
    /// if any partition cannot be prepared.
    pub fn attach_delegate(
        mut self,
        delegate: Box<dyn Delegate>,
    ) -> Result<Interpreter<Ready>, RuntimeError> {
        let partitions = partition_graph(&self.graph, delegate.as_ref(), &self.outputs);
        let kernels = prepare_all(
            delegate.as_ref(),
            &partitions,
            &self.graph,
            &self.shapes,
            self.reduced_precision,
        )?;

        let mut steps = Vec::new();
        let mut next = 0;
        for (k, partition) in partitions.iter().enumerate() {
            let first = partition.nodes[0];
            steps.extend((next..first).map(Step::Host));
            steps.push(Step::Delegated(k));
            next = first + partition.nodes.len();
            for &id in &partition.internal {
                self.buffers[id] = None;
            }
        }
        steps.extend((next..self.graph.nodes().len()).map(Step::Host));

        let delegated: usize = partitions.iter().map(|p| p.nodes.len()).sum();
        tracing::info!(
            "delegate '{}': {} partitions, {}/{} nodes delegated",
            delegate.name(),
            partitions.len(),
            delegated,
            self.graph.nodes().len()
        );
        Ok(self.finish(steps, Some(delegate), partitions, kernels))
    }

    fn finish(
        self,
        steps: Vec<Step>,
        delegate: Option<Box<dyn Delegate>>,
        partitions: Vec<Partition>,
        kernels: Vec<Box<dyn DelegateKernel>>,
    ) -> Interpreter<Ready> {
        let label = delegate
            .as_ref()
            .map_or_else(|| "host".to_string(), |d| d.name().to_string());
        Interpreter {
            graph: self.graph,
            shapes: self.shapes,
            buffers: self.buffers,
            outputs: self.outputs,
            steps,
            delegate,
            partitions,
            kernels,
            label,
            expose_all: self.expose_all,
            reduced_precision: self.reduced_precision,
            _state: std::marker::PhantomData,
        }
    }
}

fn prepare_all(
    delegate: &dyn Delegate,
    partitions: &[Partition],
    graph: &ModelGraph<Validated>,
    shapes: &[Shape],
    reduced_precision: bool,
) -> Result<Vec<Box<dyn DelegateKernel>>, RuntimeError> {
    partitions
        .iter()
        .map(|p| delegate.prepare(p, graph, shapes, reduced_precision))
        .collect()
}

// ── Ready ──────────────────────────────────────────────────────

impl Interpreter<Ready> {
    /// Parses `bytes` and builds an interpreter according to `options`.
    pub fn load(bytes: &[u8], options: &LoadOptions) -> Result<Self, RuntimeError> {
        let graph = ModelLoader::from_bytes(bytes)?;
        Self::from_graph(graph, options)
    }

    /// Memory-maps the model at `path` and builds an interpreter.
    pub fn load_file(path: &Path, options: &LoadOptions) -> Result<Self, RuntimeError> {
        let mapped = MappedModel::open(path)?;
        tracing::debug!("mapped model {}", mapped.path().display());
        Self::load(mapped.as_bytes(), options)
    }

    /// Builds an interpreter for an already validated graph.
    pub fn from_graph(
        graph: ModelGraph<Validated>,
        options: &LoadOptions,
    ) -> Result<Self, RuntimeError> {
        tracing::info!("{}", graph.summary());
        let mut building =
            Interpreter::new(graph)?.allow_reduced_precision(options.allow_reduced_precision);
        if options.expose_all_layers {
            building = building.expose_all_layers();
        }
        if options.use_accelerator {
            building.attach_delegate(options.create_delegate()?)
        } else {
            Ok(building.into_ready())
        }
    }

    /// The loaded model.
    pub fn graph(&self) -> &ModelGraph<Validated> {
        &self.graph
    }

    /// Registered output ids; the first is the primary output.
    pub fn outputs(&self) -> &[usize] {
        &self.outputs
    }

    /// Number of delegate partitions.
    pub fn num_partitions(&self) -> usize {
        self.kernels.len()
    }

    fn primary_input(&self) -> usize {
        self.graph.inputs()[0]
    }

    fn info(&self, id: usize) -> TensorInfo {
        let def = &self.graph.tensors()[id];
        TensorInfo {
            name: def.name.clone(),
            dtype: def.dtype,
            shape: self.shapes[id].clone(),
        }
    }
}

impl ModelRuntime for Interpreter<Ready> {
    fn name(&self) -> &str {
        &self.label
    }

    fn resize_input(&mut self, shape: &Shape) -> Result<(), RuntimeError> {
        let shapes = self
            .graph
            .infer_shapes(self.primary_input(), shape)
            .map_err(RuntimeError::Resize)?;
        // Re-prepare before touching any buffer so a refused resize leaves
        // the interpreter as it was.
        if let Some(delegate) = self.delegate.as_deref() {
            self.kernels = prepare_all(
                delegate,
                &self.partitions,
                &self.graph,
                &shapes,
                self.reduced_precision,
            )?;
        }
        for (id, buffer) in self.buffers.iter_mut().enumerate() {
            if self.graph.tensors()[id].kind == TensorKind::Constant {
                continue;
            }
            if let Some(tensor) = buffer {
                tensor.reshape_zeroed(shapes[id].clone());
            }
        }
        tracing::debug!("resized input to {shape}");
        self.shapes = shapes;
        Ok(())
    }

    fn input_info(&self) -> TensorInfo {
        self.info(self.primary_input())
    }

    fn set_input(&mut self, data: &[u8]) -> Result<(), RuntimeError> {
        let buffer = self.input_buffer()?;
        if buffer.len() != data.len() {
            return Err(RuntimeError::InputSize {
                expected: buffer.len(),
                actual: data.len(),
            });
        }
        buffer.copy_from_slice(data);
        Ok(())
    }

    fn input_buffer(&mut self) -> Result<&mut [u8], RuntimeError> {
        let id = self.primary_input();
        let dtype = self.graph.tensors()[id].dtype;
        if !matches!(dtype, DType::U8 | DType::F32) {
            return Err(RuntimeError::UnsupportedInputType { dtype });
        }
        self.buffers[id]
            .as_mut()
            .map(Tensor::as_bytes_mut)
            .ok_or(RuntimeError::NotHostVisible { tensor: id })
    }

    fn invoke(&mut self) -> Result<(), RuntimeError> {
        let Self {
            graph,
            shapes,
            buffers,
            steps,
            kernels,
            ..
        } = self;
        for step in steps.iter() {
            match *step {
                Step::Host(n) => crate::kernels::run_node(&graph.nodes()[n], buffers)?,
                Step::Delegated(k) => kernels[k].invoke(graph, shapes, buffers)?,
            }
        }
        Ok(())
    }

    fn reset_state(&mut self) -> Result<(), RuntimeError> {
        for (def, buffer) in self.graph.tensors().iter().zip(self.buffers.iter_mut()) {
            if def.kind == TensorKind::Variable {
                if let Some(tensor) = buffer {
                    tensor.fill_zero();
                }
            }
        }
        Ok(())
    }

    fn output_info(&self) -> TensorInfo {
        self.info(self.outputs[0])
    }

    fn output_bytes(&self) -> Result<&[u8], RuntimeError> {
        let id = self.outputs[0];
        self.tensor_bytes(id)
            .ok_or(RuntimeError::NotHostVisible { tensor: id })
    }

    fn exposes_all_layers(&self) -> bool {
        self.expose_all
    }

    fn tensor_count(&self) -> usize {
        self.buffers.len()
    }

    fn tensor_bytes(&self, id: usize) -> Option<&[u8]> {
        self.buffers.get(id)?.as_ref().map(Tensor::as_bytes)
    }
}

impl<S: InterpreterState> std::fmt::Debug for Interpreter<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("state", &std::any::type_name::<S>())
            .field("model", &self.graph.name())
            .field("backend", &self.label)
            .field("outputs", &self.outputs.len())
            .field("partitions", &self.kernels.len())
            .field("reduced_precision", &self.reduced_precision)
            .finish()
    }
}
