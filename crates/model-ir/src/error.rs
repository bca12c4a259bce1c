// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for model loading and graph validation.

/// Errors that can occur when reading, validating, or writing a model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The model file could not be opened or mapped.
    #[error("failed to read model file: {0}")]
    Io(#[from] std::io::Error),

    /// The embedded graph manifest is malformed.
    #[error("failed to parse graph manifest: {0}")]
    ManifestParse(#[from] serde_json::Error),

    /// The SafeTensors container is malformed or could not be written.
    #[error("SafeTensors error: {0}")]
    SafeTensors(String),

    /// The model file carries no graph manifest.
    #[error("model file has no '{key}' metadata entry")]
    MissingGraph { key: &'static str },

    /// A constant declared in the manifest has no data in the container.
    #[error("constant tensor not found: {name}")]
    ConstantNotFound { name: String },

    /// A tensor-table entry is inconsistent.
    #[error("invalid tensor '{tensor}': {detail}")]
    InvalidTensor { tensor: String, detail: String },

    /// A node is malformed (arity, dtype, ordering).
    #[error("invalid node '{node}': {detail}")]
    InvalidNode { node: String, detail: String },

    /// Shapes could not be propagated through a node.
    #[error("shape inference failed at node '{node}': {detail}")]
    ShapeInference { node: String, detail: String },

    /// The graph as a whole is malformed.
    #[error("invalid model graph: {0}")]
    InvalidGraph(String),
}
