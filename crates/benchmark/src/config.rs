// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmark configuration loaded from TOML files or constructed
//! programmatically.
//!
//! # TOML Format
//! ```toml
//! model_path = "./models/tiny.nnb"
//! dataset_path = "./data/tiny/dataset.toml"
//! label = "tiny"
//! max_runs = 100
//! timeout_sec = 10.0
//! keep_output = false
//! ignore_golden = false
//! input_shape = [1, 16]
//!
//! [runtime]
//! use_accelerator = true
//! accelerator = "simulated"
//! ```

use crate::{BenchError, RunFlags};
use runtime::LoadOptions;
use std::path::{Path, PathBuf};
use tensor_core::Shape;

/// Configuration for one benchmark session.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Path to the model file.
    pub model_path: PathBuf,
    /// Path to the dataset manifest.
    pub dataset_path: Option<PathBuf>,
    /// Report label; defaults to the model file stem.
    pub label: Option<String>,
    /// Maximum number of sequence runs.
    pub max_runs: usize,
    /// Time budget over summed invoke time, checked per sequence.
    pub timeout_sec: f64,
    /// Keep a copy of every output in the results.
    pub keep_output: bool,
    /// Skip golden comparison even when the dataset has golden outputs.
    pub ignore_golden: bool,
    /// Resize the primary input before running.
    pub input_shape: Option<Vec<usize>>,
    /// How the model is loaded.
    pub runtime: LoadOptions,
}

impl BenchmarkConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, BenchError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BenchError::ConfigError(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, BenchError> {
        toml::from_str(toml_str)
            .map_err(|e| BenchError::ConfigError(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, BenchError> {
        toml::to_string_pretty(self)
            .map_err(|e| BenchError::ConfigError(format!("TOML serialise error: {e}")))
    }

    /// Run flags for a dataset with or without golden outputs.
    pub fn run_flags(&self, dataset_has_golden: bool) -> RunFlags {
        RunFlags::defaults(dataset_has_golden && !self.ignore_golden, self.keep_output)
    }

    pub fn input_shape(&self) -> Option<Shape> {
        self.input_shape.clone().map(Shape::new)
    }

    /// The configured label, or the model file stem.
    pub fn resolve_label(&self) -> String {
        self.label.clone().unwrap_or_else(|| {
            self.model_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "model".to_string())
        })
    }
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("./models/model.nnb"),
            dataset_path: None,
            label: None,
            max_runs: crate::UNBOUNDED_RUNS,
            timeout_sec: 10.0,
            keep_output: false,
            ignore_golden: false,
            input_shape: None,
            runtime: LoadOptions::default(),
        }
    }
}
