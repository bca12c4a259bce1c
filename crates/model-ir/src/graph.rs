// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Model graph: tensor table, nodes in execution order, and constant data.
//!
//! # Type-State Pattern
//!
//! ```text
//! ModelGraph<Loaded>     — parsed from a file or a builder, not yet checked.
//!       │  .validate()
//!       ▼
//! ModelGraph<Validated>  — ids, arity, dtypes, ordering and shapes verified.
//! ```
//!
//! The interpreter only accepts `ModelGraph<Validated>`, so it never has to
//! re-check operand ids or shapes while invoking.

use crate::{GraphManifest, ModelError, NodeDef, TensorDef, TensorKind};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tensor_core::Shape;

// ── Type-state markers ─────────────────────────────────────────────

/// Marker: graph has been loaded but not validated.
#[derive(Debug, Clone)]
pub struct Loaded;

/// Marker: graph has been validated and can be executed.
#[derive(Debug, Clone)]
pub struct Validated;

/// Sealed trait for graph states.
pub trait GraphState: fmt::Debug + Clone {}
impl GraphState for Loaded {}
impl GraphState for Validated {}

// ── ModelGraph ─────────────────────────────────────────────────────

/// A model: its graph manifest plus the bytes of every constant tensor.
#[derive(Debug, Clone)]
pub struct ModelGraph<S: GraphState = Loaded> {
    manifest: GraphManifest,
    constants: HashMap<usize, Vec<u8>>,
    _state: std::marker::PhantomData<S>,
}

// ── Loaded state ───────────────────────────────────────────────────

impl ModelGraph<Loaded> {
    /// Creates a graph in the `Loaded` state from a manifest and constant
    /// data keyed by tensor id.
    pub fn new(manifest: GraphManifest, constants: HashMap<usize, Vec<u8>>) -> Self {
        Self {
            manifest,
            constants,
            _state: std::marker::PhantomData,
        }
    }

    /// Validates the graph and transitions to the `Validated` state.
    ///
    /// # Checks
    /// - There is at least one node, input and output.
    /// - Tensor names are unique and shapes are non-empty.
    /// - Every constant has data of exactly its declared size; nothing else does.
    /// - Model inputs are `input` tensors, model outputs are `output` tensors.
    /// - Each node has a valid arity, valid ids and the dtypes its op requires.
    /// - Every operand is available before the node runs and every produced
    ///   tensor has exactly one producer.
    /// - Propagating the declared input shapes reproduces every declared shape.
    pub fn validate(self) -> Result<ModelGraph<Validated>, ModelError> {
        let m = &self.manifest;
        if m.nodes.is_empty() {
            return Err(ModelError::InvalidGraph("model graph contains no nodes".into()));
        }
        if m.inputs.is_empty() || m.outputs.is_empty() {
            return Err(ModelError::InvalidGraph(
                "model must declare at least one input and one output".into(),
            ));
        }

        self.check_tensor_table()?;
        check_io_list(m, &m.inputs, TensorKind::Input, "input")?;
        check_io_list(m, &m.outputs, TensorKind::Output, "output")?;
        self.check_nodes()?;

        let inferred = propagate_shapes(m, &[])?;
        for (id, tensor) in m.tensors.iter().enumerate() {
            if tensor.kind.is_produced() && inferred[id] != tensor.shape {
                return Err(ModelError::InvalidTensor {
                    tensor: tensor.name.clone(),
                    detail: format!(
                        "declared shape {} but nodes produce {}",
                        tensor.shape, inferred[id]
                    ),
                });
            }
        }

        Ok(ModelGraph {
            manifest: self.manifest,
            constants: self.constants,
            _state: std::marker::PhantomData,
        })
    }

    fn check_tensor_table(&self) -> Result<(), ModelError> {
        let mut names = HashSet::new();
        for (id, tensor) in self.manifest.tensors.iter().enumerate() {
            let invalid = |detail: String| ModelError::InvalidTensor {
                tensor: tensor.name.clone(),
                detail,
            };
            if !names.insert(tensor.name.as_str()) {
                return Err(invalid("duplicate tensor name".into()));
            }
            if tensor.shape.num_elements() == 0 {
                return Err(invalid("shape has zero elements".into()));
            }
            match (tensor.kind, self.constants.get(&id)) {
                (TensorKind::Constant, None) => {
                    return Err(ModelError::ConstantNotFound {
                        name: tensor.name.clone(),
                    })
                }
                (TensorKind::Constant, Some(data)) if data.len() != tensor.size_bytes() => {
                    return Err(invalid(format!(
                        "constant holds {} bytes, shape {} of {} needs {}",
                        data.len(),
                        tensor.shape,
                        tensor.dtype,
                        tensor.size_bytes()
                    )));
                }
                (kind, Some(_)) if kind != TensorKind::Constant => {
                    return Err(invalid(format!("{kind:?} tensor must not carry data")));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn check_nodes(&self) -> Result<(), ModelError> {
        let m = &self.manifest;
        let mut produced = HashSet::new();

        for node in &m.nodes {
            let invalid = |detail: String| ModelError::InvalidNode {
                node: node.name.clone(),
                detail,
            };

            let (min, max) = node.op.arity();
            if node.inputs.len() < min || node.inputs.len() > max {
                return Err(invalid(format!(
                    "{} expects {min}..={max} inputs, got {}",
                    node.op,
                    node.inputs.len()
                )));
            }
            if node.outputs.len() != 1 {
                return Err(invalid(format!(
                    "expected exactly one output, got {}",
                    node.outputs.len()
                )));
            }

            for (pos, &id) in node.inputs.iter().enumerate() {
                let tensor = m
                    .tensors
                    .get(id)
                    .ok_or_else(|| invalid(format!("input id {id} out of range")))?;
                let available = match tensor.kind {
                    TensorKind::Input | TensorKind::Constant | TensorKind::Variable => true,
                    TensorKind::Output | TensorKind::Intermediate => produced.contains(&id),
                };
                if !available {
                    return Err(invalid(format!(
                        "input '{}' is used before it is produced",
                        tensor.name
                    )));
                }
                if tensor.dtype != node.op.input_dtype(pos) {
                    return Err(invalid(format!(
                        "input '{}' is {}, {} needs {}",
                        tensor.name,
                        tensor.dtype,
                        node.op,
                        node.op.input_dtype(pos)
                    )));
                }
            }

            if node.op.is_stateful() {
                let state = &m.tensors[node.inputs[1]];
                if state.kind != TensorKind::Variable {
                    return Err(invalid(format!(
                        "state operand '{}' must be a variable tensor",
                        state.name
                    )));
                }
            }

            let out = node.outputs[0];
            let tensor = m
                .tensors
                .get(out)
                .ok_or_else(|| invalid(format!("output id {out} out of range")))?;
            if !tensor.kind.is_produced() {
                return Err(invalid(format!(
                    "cannot write {:?} tensor '{}'",
                    tensor.kind, tensor.name
                )));
            }
            if !produced.insert(out) {
                return Err(invalid(format!("'{}' already has a producer", tensor.name)));
            }
            if tensor.dtype != node.op.output_dtype() {
                return Err(invalid(format!(
                    "output '{}' is {}, {} produces {}",
                    tensor.name,
                    tensor.dtype,
                    node.op,
                    node.op.output_dtype()
                )));
            }
        }

        for (id, tensor) in m.tensors.iter().enumerate() {
            if tensor.kind.is_produced() && !produced.contains(&id) {
                return Err(ModelError::InvalidTensor {
                    tensor: tensor.name.clone(),
                    detail: "no node produces this tensor".into(),
                });
            }
        }
        Ok(())
    }
}

fn check_io_list(
    m: &GraphManifest,
    ids: &[usize],
    kind: TensorKind,
    what: &str,
) -> Result<(), ModelError> {
    let mut seen = HashSet::new();
    for &id in ids {
        let tensor = m
            .tensors
            .get(id)
            .ok_or_else(|| ModelError::InvalidGraph(format!("{what} id {id} out of range")))?;
        if tensor.kind != kind {
            return Err(ModelError::InvalidTensor {
                tensor: tensor.name.clone(),
                detail: format!("listed as model {what} but declared {:?}", tensor.kind),
            });
        }
        if !seen.insert(id) {
            return Err(ModelError::InvalidGraph(format!(
                "{what} '{}' listed twice",
                tensor.name
            )));
        }
    }
    Ok(())
}

/// Runs shape inference over the nodes in order, starting from the declared
/// shapes with `overrides` applied. Returns one shape per tensor id.
fn propagate_shapes(
    m: &GraphManifest,
    overrides: &[(usize, Shape)],
) -> Result<Vec<Shape>, ModelError> {
    let mut shapes: Vec<Shape> = m.tensors.iter().map(|t| t.shape.clone()).collect();
    for (id, shape) in overrides {
        shapes[*id] = shape.clone();
    }
    for node in &m.nodes {
        let operands: Vec<&Shape> = node.inputs.iter().map(|&i| &shapes[i]).collect();
        let out = node
            .op
            .output_shape(&operands)
            .map_err(|detail| ModelError::ShapeInference {
                node: node.name.clone(),
                detail,
            })?;
        shapes[node.outputs[0]] = out;
    }
    Ok(shapes)
}

// ── Validated state ────────────────────────────────────────────────

impl ModelGraph<Validated> {
    /// Returns the tensor table.
    pub fn tensors(&self) -> &[TensorDef] {
        &self.manifest.tensors
    }

    /// Returns a tensor definition by id.
    pub fn tensor(&self, id: usize) -> Option<&TensorDef> {
        self.manifest.tensors.get(id)
    }

    /// Returns the nodes in execution order.
    pub fn nodes(&self) -> &[NodeDef] {
        &self.manifest.nodes
    }

    /// Model input ids; the first is the primary input.
    pub fn inputs(&self) -> &[usize] {
        &self.manifest.inputs
    }

    /// Model output ids; the first is the primary output.
    pub fn outputs(&self) -> &[usize] {
        &self.manifest.outputs
    }

    /// Returns the data of a constant tensor.
    pub fn constant(&self, id: usize) -> Option<&[u8]> {
        self.constants.get(&id).map(Vec::as_slice)
    }

    /// Total bytes of constant data.
    pub fn total_constant_bytes(&self) -> usize {
        self.constants.values().map(Vec::len).sum()
    }

    /// Returns the number of variable (stateful) tensors.
    pub fn num_variables(&self) -> usize {
        self.tensors()
            .iter()
            .filter(|t| t.kind == TensorKind::Variable)
            .count()
    }

    /// Recomputes every tensor shape with `input` resized to `shape`.
    ///
    /// # Errors
    /// Returns [`ModelError::ShapeInference`] if some node cannot accept the
    /// propagated shapes, and [`ModelError::InvalidGraph`] if `input` is not
    /// a model input.
    pub fn infer_shapes(&self, input: usize, shape: &Shape) -> Result<Vec<Shape>, ModelError> {
        if !self.manifest.inputs.contains(&input) {
            return Err(ModelError::InvalidGraph(format!(
                "tensor {input} is not a model input"
            )));
        }
        propagate_shapes(&self.manifest, &[(input, shape.clone())])
    }

    /// Returns a summary string describing the model.
    pub fn summary(&self) -> String {
        format!(
            "Model '{}': {} nodes, {} tensors ({} variable), {:.1} KB constants",
            self.manifest.name,
            self.nodes().len(),
            self.tensors().len(),
            self.num_variables(),
            self.total_constant_bytes() as f64 / 1024.0,
        )
    }

    /// Returns the underlying manifest.
    pub fn manifest(&self) -> &GraphManifest {
        &self.manifest
    }

    /// Serialises the model into the SafeTensors container format read by
    /// [`crate::ModelLoader::from_bytes`].
    pub fn to_bytes(&self) -> Result<Vec<u8>, ModelError> {
        crate::loader::serialize(&self.manifest, &self.constants)
    }
}

// ── Shared implementations ─────────────────────────────────────────

impl<S: GraphState> ModelGraph<S> {
    /// Human-readable model name.
    pub fn name(&self) -> &str {
        &self.manifest.name
    }
}

impl<S: GraphState> fmt::Display for ModelGraph<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ModelGraph '{}' ({} nodes):",
            self.manifest.name,
            self.manifest.nodes.len()
        )?;
        for node in &self.manifest.nodes {
            writeln!(f, "  {}", node.summary())?;
        }
        Ok(())
    }
}
