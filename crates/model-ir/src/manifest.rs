// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! JSON graph manifest embedded in the model file.
//!
//! The manifest is stored as the `"graph"` entry of the SafeTensors
//! `__metadata__` table. Constant tensors are stored as SafeTensors entries
//! under the same name as their tensor-table entry.
//!
//! # Format
//! ```json
//! {
//!   "name": "tiny-mlp",
//!   "tensors": [
//!     { "name": "x",   "dtype": "f32", "shape": [1, 4], "kind": "input" },
//!     { "name": "w",   "dtype": "f32", "shape": [4, 2], "kind": "constant" },
//!     { "name": "out", "dtype": "f32", "shape": [1, 2], "kind": "output" }
//!   ],
//!   "nodes": [
//!     { "name": "fc", "op": { "type": "fully_connected" }, "inputs": [0, 1], "outputs": [2] }
//!   ],
//!   "inputs": [0],
//!   "outputs": [2]
//! }
//! ```

use crate::{ModelError, NodeDef, TensorDef};

/// Metadata key under which the manifest is stored.
pub const GRAPH_METADATA_KEY: &str = "graph";

/// Graph structure as serialized in the model file.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GraphManifest {
    /// Human-readable model name.
    pub name: String,
    /// Tensor table; a tensor's id is its index here.
    pub tensors: Vec<TensorDef>,
    /// Nodes in execution order.
    pub nodes: Vec<NodeDef>,
    /// Model input tensor ids. The first is the primary input.
    pub inputs: Vec<usize>,
    /// Model output tensor ids. The first is the primary output.
    pub outputs: Vec<usize>,
}

impl GraphManifest {
    /// Parses a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let manifest: Self = serde_json::from_str(json)?;
        Ok(manifest)
    }

    /// Serialises the manifest to compact JSON.
    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Ids of all constant tensors, in table order.
    pub fn constant_ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.tensors
            .iter()
            .enumerate()
            .filter(|(_, t)| t.kind == crate::TensorKind::Constant)
            .map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Op, TensorKind};
    use tensor_core::{DType, Shape};

    fn sample_manifest_json() -> &'static str {
        r#"{
            "name": "tiny-mlp",
            "tensors": [
                { "name": "x", "dtype": "f32", "shape": [1, 4], "kind": "input" },
                { "name": "w", "dtype": "f32", "shape": [4, 2], "kind": "constant" },
                { "name": "out", "dtype": "f32", "shape": [1, 2], "kind": "output" }
            ],
            "nodes": [
                { "name": "fc", "op": { "type": "fully_connected" }, "inputs": [0, 1], "outputs": [2] }
            ],
            "inputs": [0],
            "outputs": [2]
        }"#
    }

    #[test]
    fn test_parse_manifest() {
        let m = GraphManifest::from_json(sample_manifest_json()).unwrap();
        assert_eq!(m.name, "tiny-mlp");
        assert_eq!(m.tensors.len(), 3);
        assert_eq!(m.tensors[1].kind, TensorKind::Constant);
        assert_eq!(m.tensors[0].shape, Shape::matrix(1, 4));
        assert_eq!(m.tensors[0].dtype, DType::F32);
        assert_eq!(m.nodes[0].op, Op::FullyConnected);
        assert_eq!(m.constant_ids().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_json_roundtrip() {
        let m = GraphManifest::from_json(sample_manifest_json()).unwrap();
        let back = GraphManifest::from_json(&m.to_json().unwrap()).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_unknown_op_rejected() {
        let json = sample_manifest_json().replace("fully_connected", "conv2d");
        assert!(matches!(
            GraphManifest::from_json(&json),
            Err(ModelError::ManifestParse(_))
        ));
    }
}
