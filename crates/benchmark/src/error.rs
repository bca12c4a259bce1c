// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for benchmark runs, datasets and configuration.

use std::path::PathBuf;

/// Failure of a deferred input producer.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// The backing file could not be read.
    #[error("cannot read input '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The produced data does not fit the input tensor.
    #[error("input holds {actual} bytes, tensor needs {expected}")]
    Size { expected: usize, actual: usize },

    /// Any other producer-specific failure.
    #[error("input producer failed: {0}")]
    Producer(String),
}

/// Errors reported by the benchmark harness.
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    /// The model runtime failed (load, resize, set input, invoke, reset, dump).
    #[error(transparent)]
    Runtime(#[from] runtime::RuntimeError),

    /// A deferred input could not be produced.
    #[error(transparent)]
    Input(#[from] InputError),

    /// Aggregation was asked to summarise zero results.
    #[error("no inference results to aggregate")]
    NoResults,

    /// The dump target is missing or not a directory.
    #[error("dump directory '{path}' is not usable: {detail}")]
    DumpDirectory { path: PathBuf, detail: String },

    /// Layer dumps need a runtime loaded with every layer exposed.
    #[error("runtime was not loaded with intermediate outputs exposed")]
    IntermediateOutputsDisabled,

    /// A complete-input-set run produced the wrong number of results.
    #[error("incomplete input set: expected {expected} results, got {actual}")]
    IncompleteInputSet { expected: usize, actual: usize },

    /// The dataset manifest or its files are malformed.
    #[error("dataset error: {0}")]
    Dataset(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Writing a report failed.
    #[error("report serialisation failed: {0}")]
    Report(#[from] serde_json::Error),

    /// Filesystem error outside the runtime.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
