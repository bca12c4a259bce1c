// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Programmatic model construction.
//!
//! Used by tests, benches and the `synth` CLI command to produce model files
//! without external tooling. Result shapes and dtypes are inferred from the
//! op, so only inputs, constants and variables need explicit shapes.

use crate::{GraphManifest, ModelError, ModelGraph, NodeDef, Op, TensorDef, TensorKind};
use std::collections::HashMap;
use tensor_core::{encode_f32, DType, Shape};

/// Incrementally builds a [`ModelGraph<Loaded>`](crate::graph::Loaded).
///
/// # Example
/// ```
/// use model_ir::{ModelBuilder, Op};
/// use tensor_core::{DType, Shape};
///
/// let mut b = ModelBuilder::new("relu-only");
/// let x = b.input("x", DType::F32, Shape::vector(4));
/// let y = b.node("relu", Op::Relu, &[x]).unwrap();
/// b.output(y);
/// let graph = b.finish().validate().unwrap();
/// assert_eq!(graph.outputs(), &[y]);
/// ```
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    manifest: GraphManifest,
    constants: HashMap<usize, Vec<u8>>,
}

impl ModelBuilder {
    /// Starts an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            manifest: GraphManifest {
                name: name.into(),
                tensors: Vec::new(),
                nodes: Vec::new(),
                inputs: Vec::new(),
                outputs: Vec::new(),
            },
            constants: HashMap::new(),
        }
    }

    fn push_tensor(&mut self, name: &str, dtype: DType, shape: Shape, kind: TensorKind) -> usize {
        self.manifest.tensors.push(TensorDef {
            name: name.to_string(),
            dtype,
            shape,
            kind,
        });
        self.manifest.tensors.len() - 1
    }

    /// Adds a model input and returns its id.
    pub fn input(&mut self, name: &str, dtype: DType, shape: Shape) -> usize {
        let id = self.push_tensor(name, dtype, shape, TensorKind::Input);
        self.manifest.inputs.push(id);
        id
    }

    /// Adds a constant with raw data.
    pub fn constant(&mut self, name: &str, dtype: DType, shape: Shape, data: Vec<u8>) -> usize {
        let id = self.push_tensor(name, dtype, shape, TensorKind::Constant);
        self.constants.insert(id, data);
        id
    }

    /// Adds an `f32` constant.
    pub fn constant_f32(&mut self, name: &str, shape: Shape, values: &[f32]) -> usize {
        self.constant(name, DType::F32, shape, encode_f32(values))
    }

    /// Adds a variable tensor, zero at load and after every state reset.
    pub fn variable(&mut self, name: &str, shape: Shape) -> usize {
        self.push_tensor(name, DType::F32, shape, TensorKind::Variable)
    }

    /// Appends a node whose single result is a new tensor named after it.
    ///
    /// # Errors
    /// Fails if an operand id is unknown, the operand count is wrong, or the
    /// operand shapes are incompatible with `op`.
    pub fn node(&mut self, name: &str, op: Op, inputs: &[usize]) -> Result<usize, ModelError> {
        let invalid = |detail: String| ModelError::InvalidNode {
            node: name.to_string(),
            detail,
        };
        let (min, max) = op.arity();
        if inputs.len() < min || inputs.len() > max {
            return Err(invalid(format!(
                "{op} expects {min}..={max} inputs, got {}",
                inputs.len()
            )));
        }
        let shapes = inputs
            .iter()
            .map(|&id| {
                self.manifest
                    .tensors
                    .get(id)
                    .map(|t| &t.shape)
                    .ok_or_else(|| invalid(format!("unknown tensor id {id}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let shape = op.output_shape(&shapes).map_err(|detail| ModelError::ShapeInference {
            node: name.to_string(),
            detail,
        })?;

        let out = self.push_tensor(name, op.output_dtype(), shape, TensorKind::Intermediate);
        self.manifest.nodes.push(NodeDef {
            name: name.to_string(),
            op,
            inputs: inputs.to_vec(),
            outputs: vec![out],
        });
        Ok(out)
    }

    /// Marks a node result as a model output. The first call sets the
    /// primary output.
    pub fn output(&mut self, id: usize) {
        if let Some(t) = self.manifest.tensors.get_mut(id) {
            t.kind = TensorKind::Output;
        }
        if !self.manifest.outputs.contains(&id) {
            self.manifest.outputs.push(id);
        }
    }

    /// Returns the unvalidated graph.
    pub fn finish(self) -> ModelGraph<crate::graph::Loaded> {
        ModelGraph::new(self.manifest, self.constants)
    }

    /// Validates and serialises the model in one step.
    pub fn build_bytes(self) -> Result<Vec<u8>, ModelError> {
        self.finish().validate()?.to_bytes()
    }
}
