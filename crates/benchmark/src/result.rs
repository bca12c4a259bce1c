// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-step benchmark records.

use crate::ErrorMetrics;
use std::time::Duration;

/// Outcome of one executed step.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct InferenceResult {
    /// Wall time of the invocation alone.
    pub compute_time: Duration,
    pub mean_squared_error: f64,
    pub max_error: f64,
    /// Copy of the primary output, unless discarded.
    #[serde(skip)]
    pub output: Option<Vec<u8>>,
    pub sequence_index: usize,
    pub step_index: usize,
}

impl InferenceResult {
    /// A result with zero error and no retained output.
    pub fn new(compute_time: Duration, sequence_index: usize, step_index: usize) -> Self {
        Self {
            compute_time,
            mean_squared_error: 0.0,
            max_error: 0.0,
            output: None,
            sequence_index,
            step_index,
        }
    }

    /// Records the error against golden output.
    pub fn with_error(mut self, metrics: ErrorMetrics) -> Self {
        self.mean_squared_error = metrics.mean_squared_error;
        self.max_error = metrics.max_error;
        self
    }

    /// Retains a copy of the primary output.
    pub fn with_output(mut self, output: Option<Vec<u8>>) -> Self {
        self.output = output;
        self
    }
}
