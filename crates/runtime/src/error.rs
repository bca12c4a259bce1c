// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the model runtime.

use tensor_core::DType;

/// Errors reported by a [`crate::ModelRuntime`].
///
/// All of these are recoverable from the caller's point of view: a failed
/// load leaves no runtime behind, and a failed invocation leaves the runtime
/// usable for a state reset and another attempt.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The model bytes could not be parsed or validated.
    #[error("model error: {0}")]
    Model(#[from] model_ir::ModelError),

    /// The runtime could not be constructed from a valid model.
    #[error("failed to construct runtime: {0}")]
    Construction(String),

    /// The acceleration backend refused the model.
    #[error("failed to attach delegate '{delegate}': {detail}")]
    DelegateAttach { delegate: String, detail: String },

    /// The graph cannot accept the requested input shape.
    #[error("failed to resize input: {0}")]
    Resize(#[source] model_ir::ModelError),

    /// The primary input tensor has an encoding raw bytes cannot be fed to.
    #[error("input tensor type {dtype} not supported (expected u8 or f32)")]
    UnsupportedInputType { dtype: DType },

    /// The input byte count does not match the input tensor.
    #[error("input size mismatch: tensor holds {expected} bytes, got {actual}")]
    InputSize { expected: usize, actual: usize },

    /// A tensor is held by a delegate and has no host memory.
    #[error("tensor {tensor} is not host-visible")]
    NotHostVisible { tensor: usize },

    /// A kernel failed during invocation.
    #[error("execution error in node '{node}': {source}")]
    Execution {
        node: String,
        #[source]
        source: tensor_core::TensorError,
    },

    /// Writing a tensor dump failed.
    #[error("tensor dump failed: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}
